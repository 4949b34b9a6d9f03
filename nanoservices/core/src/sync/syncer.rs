use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use quasar_utils::QuasarResult;

use crate::config::database::DatabaseUrl;
use crate::config::types::DatasetDescriptor;
use crate::metrics;
use crate::sync::outcome::SyncOutcome;
use crate::sync::traits::{SchemaAdmin, VersionControl};
use crate::sync::workdir::WorkDir;

/// Brings one dataset's schema up to date: drop, clone, materialize.
pub struct RepositorySyncer {
    vcs: Arc<dyn VersionControl>,
    admin: Arc<dyn SchemaAdmin>,
    database_url: DatabaseUrl,
    work_root: PathBuf,
}

impl RepositorySyncer {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        admin: Arc<dyn SchemaAdmin>,
        database_url: DatabaseUrl,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vcs,
            admin,
            database_url,
            work_root: work_root.into(),
        }
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Never fails; errors come back as [`SyncOutcome::Failure`].
    pub async fn sync(&self, dataset: &DatasetDescriptor) -> SyncOutcome {
        let span = tracing::info_span!(
            "sync_dataset",
            dataset = %dataset.name,
            schema = %dataset.key,
            category = %dataset.category,
            scale = %dataset.scale,
        );

        async {
            let start = Instant::now();
            tracing::info!("starting sync");

            let result = self.sync_inner(dataset).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(()) => {
                    tracing::info!(duration_ms, "sync completed");
                    SyncOutcome::Success {
                        dataset: dataset.clone(),
                        schema: dataset.key.clone(),
                        duration_ms,
                    }
                }
                Err(e) => {
                    let error = self.database_url.redact(&e.to_string());
                    tracing::error!(duration_ms, error = %error, "sync failed");
                    SyncOutcome::Failure {
                        dataset: dataset.clone(),
                        error,
                        duration_ms,
                    }
                }
            };
            metrics::inc_dataset_sync(outcome.status());
            outcome
        }
        .instrument(span)
        .await
    }

    async fn sync_inner(&self, dataset: &DatasetDescriptor) -> QuasarResult<()> {
        let workdir = WorkDir::create(&self.work_root, &dataset.name).await?;
        let result = self.run_steps(dataset, workdir.path()).await;
        // Removed on success and failure alike, before the next dataset.
        workdir.remove().await;
        result
    }

    async fn run_steps(&self, dataset: &DatasetDescriptor, dir: &Path) -> QuasarResult<()> {
        self.admin.drop_schema(&dataset.key).await?;
        tracing::debug!("dropped existing schema");

        self.vcs.clone_repo(&dataset.url, dir).await?;

        let target = self.database_url.working_copy_url(&dataset.key);
        self.vcs.materialize(dir, &target).await?;

        Ok(())
    }
}
