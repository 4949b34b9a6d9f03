use serde::Serialize;

use crate::config::types::DatasetDescriptor;

/// Result of syncing one catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncOutcome {
    Success {
        dataset: DatasetDescriptor,
        schema: String,
        duration_ms: u64,
    },
    Failure {
        dataset: DatasetDescriptor,
        /// Already masked.
        error: String,
        duration_ms: u64,
    },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. })
    }

    pub fn dataset(&self) -> &DatasetDescriptor {
        match self {
            SyncOutcome::Success { dataset, .. } | SyncOutcome::Failure { dataset, .. } => dataset,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            SyncOutcome::Success { duration_ms, .. } | SyncOutcome::Failure { duration_ms, .. } => {
                *duration_ms
            }
        }
    }

    pub fn status(&self) -> &'static str {
        if self.is_success() {
            "success"
        } else {
            "failure"
        }
    }
}

/// Aggregate over one sync pass, in catalogue order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<SyncOutcome>,
}

impl SyncSummary {
    pub fn from_results(results: Vec<SyncOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Schema keys of the datasets that synced successfully.
    pub fn synced_schemas(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| match r {
                SyncOutcome::Success { schema, .. } => Some(schema.clone()),
                SyncOutcome::Failure { .. } => None,
            })
            .collect()
    }
}
