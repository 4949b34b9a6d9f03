use crate::config::types::DatasetDescriptor;
use crate::sync::outcome::{SyncOutcome, SyncSummary};
use crate::sync::syncer::RepositorySyncer;

/// Runs the [`RepositorySyncer`] over a catalogue, one dataset at a time.
pub struct SyncOrchestrator {
    syncer: RepositorySyncer,
}

impl SyncOrchestrator {
    pub fn new(syncer: RepositorySyncer) -> Self {
        Self { syncer }
    }

    /// One outcome per descriptor, in input order. A failing dataset does
    /// not stop the ones after it.
    pub async fn sync_all(&self, datasets: &[DatasetDescriptor]) -> SyncSummary {
        let root = self.syncer.work_root();
        if let Err(e) = tokio::fs::create_dir_all(root).await {
            // Every dataset will then fail to create its directory and
            // report it individually.
            tracing::error!(path = %root.display(), error = %e, "failed to create working-directory root");
        }

        tracing::info!(datasets = datasets.len(), "starting sync stage");
        let mut results: Vec<SyncOutcome> = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            results.push(self.syncer.sync(dataset).await);
        }

        let summary = SyncSummary::from_results(results);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "sync stage finished"
        );
        summary
    }
}
