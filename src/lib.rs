pub use quasar_core as core;
pub use quasar_utils as utils;

// Convenience re-exports for common usage
pub use quasar_core::config::database::DatabaseUrl;
pub use quasar_core::config::types::{DatasetDescriptor, Scale};
pub use quasar_core::destinations::traits::NavAidSink;
pub use quasar_core::engine::{QuasarSync, RunReport, TriggerError};
pub use quasar_core::events::trigger::Trigger;
pub use quasar_core::sources::traits::SourceReader;
pub use quasar_core::sync::traits::{SchemaAdmin, VersionControl};
pub use quasar_core::transforms::{Normalizer, Registry};
pub use quasar_utils::{error::Error, QuasarResult};
