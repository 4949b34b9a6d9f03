//! Kart → PostGIS sync stage.

pub mod kart;
pub mod orchestrator;
pub mod outcome;
pub mod syncer;
pub mod traits;
pub mod workdir;

pub use orchestrator::SyncOrchestrator;
pub use outcome::{SyncOutcome, SyncSummary};
pub use syncer::RepositorySyncer;
pub use traits::{SchemaAdmin, VersionControl};
