use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::loader::{load_catalogue, ConfigError};
use crate::events::trigger::Trigger;
use crate::guard::PipelineGuard;
use crate::metrics;
use crate::sync::{SyncOrchestrator, SyncSummary};
use crate::transforms::schema::SchemaId;
use crate::transforms::{TransformOrchestrator, TransformSummary};

/// Why a trigger did not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Sync already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub sync: SyncCounts,
    pub transform: TransformCounts,
}

/// Outcome of one full run. Serializes to the `{success, summary}` body the
/// trigger endpoints return; per-item results are kept for logging and the
/// CLI's verbose output.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub summary: RunCounts,
    #[serde(skip)]
    pub run_id: Uuid,
    #[serde(skip)]
    pub sync: SyncSummary,
    #[serde(skip)]
    pub transform: TransformSummary,
}

impl RunReport {
    pub fn new(run_id: Uuid, sync: SyncSummary, transform: TransformSummary) -> Self {
        let summary = RunCounts {
            sync: SyncCounts {
                total: sync.total,
                succeeded: sync.succeeded,
                failed: sync.failed,
            },
            transform: TransformCounts {
                total: transform.total,
                succeeded: transform.succeeded,
                failed: transform.failed,
                skipped: transform.skipped,
            },
        };
        Self {
            // Skips do not count against success.
            success: sync.failed == 0 && transform.failed == 0,
            summary,
            run_id,
            sync,
            transform,
        }
    }
}

/// Top-level pipeline: load the catalogue, sync every dataset, then
/// transform the schemas that synced. At most one run at a time.
pub struct QuasarSync {
    catalogue_path: PathBuf,
    sync: SyncOrchestrator,
    transform: TransformOrchestrator,
    guard: PipelineGuard,
}

impl QuasarSync {
    pub fn new(catalogue_path: impl Into<PathBuf>, sync: SyncOrchestrator, transform: TransformOrchestrator) -> Self {
        Self {
            catalogue_path: catalogue_path.into(),
            sync,
            transform,
            guard: PipelineGuard::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Wait for an in-flight run, if any, to finish.
    pub async fn wait_idle(&self) {
        self.guard.wait_idle().await
    }

    /// Run the pipeline unless another run holds the guard. The catalogue is
    /// re-read on every run.
    pub async fn trigger(&self, trigger: Trigger) -> Result<RunReport, TriggerError> {
        let Some(_permit) = self.guard.try_acquire() else {
            metrics::inc_rejection();
            tracing::warn!(trigger = %trigger, "run rejected, another run is in progress");
            return Err(TriggerError::AlreadyRunning);
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id, trigger = %trigger);
        self.run(run_id, &trigger).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, trigger: &Trigger) -> Result<RunReport, TriggerError> {
        metrics::inc_run(trigger.as_str());
        let start = Instant::now();
        tracing::info!(catalogue = %self.catalogue_path.display(), "pipeline run started");

        let datasets = load_catalogue(&self.catalogue_path).map_err(|e| {
            tracing::error!(error = %e, "failed to load catalogue");
            e
        })?;

        let sync = self.sync.sync_all(&datasets).await;
        let schemas: Vec<SchemaId> = sync.synced_schemas().into_iter().map(SchemaId::from).collect();
        let transform = self.transform.transform_all(&schemas).await;

        let report = RunReport::new(run_id, sync, transform);
        let duration_ms = start.elapsed().as_millis() as u64;
        metrics::observe_duration(duration_ms as f64);

        if report.success {
            tracing::info!(duration_ms, summary = ?report.summary, "pipeline run finished");
        } else {
            tracing::warn!(duration_ms, summary = ?report.summary, "pipeline run finished with failures");
        }
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::database::DatabaseUrl;
    use crate::sync::syncer::tests::{FakeAdmin, FakeKart};
    use crate::sync::RepositorySyncer;
    use crate::sources::row::SourceRow;
    use crate::sources::traits::SourceReader;
    use crate::destinations::traits::NavAidSink;
    use crate::transforms::record::NavigationAid;
    use crate::transforms::Registry;
    use async_trait::async_trait;
    use quasar_utils::QuasarResult;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Every buoy schema holds one row; blocks on `gate` if set.
    pub(crate) struct OneRowReader {
        pub gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl SourceReader for OneRowReader {
        fn name(&self) -> &str { "one_row" }
        async fn read_schema(&self, _schema: &SchemaId) -> QuasarResult<Vec<SourceRow>> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(vec![SourceRow::new().with("fidn", 1_i64).with("catlam", "2").with_point(0.0, 0.0)])
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingSink(pub Mutex<Vec<String>>);

    #[async_trait]
    impl NavAidSink for CountingSink {
        fn name(&self) -> &str { "counting" }
        async fn upsert(&self, aid: &NavigationAid) -> QuasarResult<()> {
            self.0.lock().unwrap().push(aid.source_key.clone());
            Ok(())
        }
    }

    const CATALOGUE: &str = "
repositories:
  - key: navigation_aids__boylat__harbor
    name: Lateral Buoys Harbor
    category: navigation_aids
    scale: harbor
    url: kart@data.example.org:boylat-harbor
  - key: navigation_aids__lights__harbor
    name: Lights Harbor
    category: navigation_aids
    scale: harbor
    url: kart@data.example.org:lights-harbor
  - key: navigation_aids__bcnlat__coastal
    name: Lateral Beacons Coastal
    category: navigation_aids
    scale: coastal
    url: kart@data.example.org:broken
";

    pub(crate) fn engine(dir: &std::path::Path, gate: Option<Arc<Notify>>, sink: Arc<CountingSink>) -> QuasarSync {
        let catalogue = dir.join("repos.yaml");
        std::fs::write(&catalogue, CATALOGUE).unwrap();
        let kart = Arc::new(FakeKart {
            fail_clone: vec!["kart@data.example.org:broken".into()],
            ..Default::default()
        });
        let url = DatabaseUrl::parse("postgresql://u:p@db/charts").unwrap();
        let syncer = RepositorySyncer::new(kart, Arc::new(FakeAdmin::default()), url, dir.join("work"));
        let transform = TransformOrchestrator::new(Arc::new(OneRowReader { gate }), sink, Arc::new(Registry::builtin()));
        QuasarSync::new(catalogue, SyncOrchestrator::new(syncer), transform)
    }

    #[tokio::test]
    async fn run_reports_both_stages() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(CountingSink::default());
        let report = engine(tmp.path(), None, sink.clone()).trigger(Trigger::Manual).await.unwrap();

        assert!(!report.success, "one dataset failed to clone");
        assert_eq!(report.summary.sync, SyncCounts { total: 3, succeeded: 2, failed: 1 });
        assert_eq!(
            report.summary.transform,
            TransformCounts { total: 2, succeeded: 1, failed: 0, skipped: 1 }
        );
        assert_eq!(*sink.0.lock().unwrap(), vec!["navigation_aids__boylat__harbor:1".to_string()]);

        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["summary"]["transform"]["skipped"], 1);
        assert!(body.get("run_id").is_none());
    }

    #[tokio::test]
    async fn concurrent_trigger_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let engine = Arc::new(engine(tmp.path(), Some(gate.clone()), Arc::new(CountingSink::default())));

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.trigger(Trigger::Http).await }
        });
        while !engine.is_running() {
            tokio::task::yield_now().await;
        }

        let second = engine.trigger(Trigger::Http).await;
        assert!(matches!(second, Err(TriggerError::AlreadyRunning)));

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn broken_catalogue_fails_before_any_work() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Arc::new(CountingSink::default());
        let engine = engine(tmp.path(), None, sink.clone());
        std::fs::write(tmp.path().join("repos.yaml"), "repositories: []\n").unwrap();

        let err = engine.trigger(Trigger::Manual).await.unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
        assert!(!engine.is_running());
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
