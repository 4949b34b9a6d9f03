//! S-57 normalization stage: registry, normalizers and the orchestrator
//! that drives them.

pub mod codes;
pub mod lateral;
pub mod orchestrator;
pub mod outcome;
pub mod record;
pub mod registry;
pub mod schema;
pub mod traits;

pub use orchestrator::TransformOrchestrator;
pub use outcome::{TransformOutcome, TransformStatus, TransformSummary};
pub use registry::Registry;
pub use traits::Normalizer;
