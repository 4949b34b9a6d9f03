use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::destinations::traits::NavAidSink;
use crate::metrics;
use crate::sources::traits::SourceReader;
use crate::transforms::outcome::{TransformOutcome, TransformStatus, TransformSummary};
use crate::transforms::registry::Registry;
use crate::transforms::schema::SchemaId;

/// Reads materialized schemas, normalizes them and upserts the result.
#[derive(Clone)]
pub struct TransformOrchestrator {
    reader: Arc<dyn SourceReader>,
    sink: Arc<dyn NavAidSink>,
    registry: Arc<Registry>,
}

impl TransformOrchestrator {
    pub fn new(reader: Arc<dyn SourceReader>, sink: Arc<dyn NavAidSink>, registry: Arc<Registry>) -> Self {
        Self { reader, sink, registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Never fails; problems are reported in the outcome.
    pub async fn transform_schema(&self, schema: &SchemaId) -> TransformOutcome {
        let Some(normalizer) = self.registry.get(schema.as_str()) else {
            tracing::info!(schema = %schema, "no normalizer registered, skipping");
            metrics::inc_schema_transform(TransformStatus::Skipped.as_str());
            return TransformOutcome::skipped(schema.as_str());
        };

        let span = tracing::info_span!("transform_schema", schema = %schema, normalizer = normalizer.name());
        async {
            let start = Instant::now();
            let mut rows_processed = 0;
            let mut rows_upserted = 0;

            let result = async {
                let rows = self.reader.read_schema(schema).await?;
                rows_processed = rows.len();
                tracing::debug!(rows = rows_processed, reader = self.reader.name(), "read source rows");

                let aids = normalizer.normalize_all(schema, &rows)?;
                for aid in &aids {
                    self.sink.upsert(aid).await?;
                    rows_upserted += 1;
                }
                Ok::<(), quasar_utils::error::Error>(())
            }
            .await;

            let duration_ms = start.elapsed().as_millis() as u64;
            let (status, error) = match result {
                Ok(()) => {
                    tracing::info!(rows_processed, rows_upserted, duration_ms, "transform completed");
                    metrics::add_rows_upserted(schema.as_str(), rows_upserted as u64);
                    (TransformStatus::Success, None)
                }
                Err(e) => {
                    tracing::error!(rows_processed, rows_upserted, duration_ms, error = %e, "transform failed");
                    if rows_upserted > 0 {
                        metrics::add_rows_upserted(schema.as_str(), rows_upserted as u64);
                    }
                    (TransformStatus::Failure, Some(e.to_string()))
                }
            };
            metrics::inc_schema_transform(status.as_str());

            TransformOutcome {
                status,
                schema: schema.as_str().to_string(),
                rows_processed,
                rows_upserted,
                duration_ms,
                error,
            }
        }
        .instrument(span)
        .await
    }

    /// One outcome per schema, sequentially and in input order.
    pub async fn transform_all(&self, schemas: &[SchemaId]) -> TransformSummary {
        tracing::info!(schemas = schemas.len(), "starting transform stage");
        let mut results = Vec::with_capacity(schemas.len());
        for schema in schemas {
            results.push(self.transform_schema(schema).await);
        }

        let summary = TransformSummary::from_results(results);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "transform stage finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::row::SourceRow;
    use crate::transforms::record::NavigationAid;
    use async_trait::async_trait;
    use quasar_utils::error::Error;
    use quasar_utils::QuasarResult;
    use std::collections::{BTreeMap, HashMap};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapReader {
        schemas: HashMap<String, Vec<SourceRow>>,
    }

    impl MapReader {
        fn with(mut self, schema: &str, rows: Vec<SourceRow>) -> Self {
            self.schemas.insert(schema.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl SourceReader for MapReader {
        fn name(&self) -> &str { "map" }
        async fn read_schema(&self, schema: &SchemaId) -> QuasarResult<Vec<SourceRow>> {
            Ok(self.schemas.get(schema.as_str()).cloned().unwrap_or_default())
        }
    }

    /// In-memory table keyed on source_key, like the unique index.
    #[derive(Default)]
    struct TableSink {
        rows: Mutex<BTreeMap<String, NavigationAid>>,
        writes: Mutex<usize>,
        fail_on_key: Option<String>,
    }

    #[async_trait]
    impl NavAidSink for TableSink {
        fn name(&self) -> &str { "table" }
        async fn upsert(&self, aid: &NavigationAid) -> QuasarResult<()> {
            if self.fail_on_key.as_deref() == Some(aid.source_key.as_str()) {
                return Err(Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, "write refused")));
            }
            *self.writes.lock().await += 1;
            self.rows.lock().await.insert(aid.source_key.clone(), aid.clone());
            Ok(())
        }
    }

    const BUOYS: &str = "navigation_aids__boylat__harbor";
    const BEACONS: &str = "navigation_aids__bcnlat__coastal";

    fn buoy(fidn: i64) -> SourceRow {
        SourceRow::new()
            .with("fidn", fidn)
            .with("catlam", "1")
            .with("colour", "3")
            .with("boyshp", "2")
            .with_point(174.78 + fidn as f64 / 1000.0, -41.29)
    }

    fn orchestrator(reader: MapReader, sink: Arc<TableSink>) -> TransformOrchestrator {
        TransformOrchestrator::new(Arc::new(reader), sink, Arc::new(Registry::builtin()))
    }

    #[tokio::test]
    async fn transforms_registered_schema() {
        let sink = Arc::new(TableSink::default());
        let orch = orchestrator(MapReader::default().with(BUOYS, vec![buoy(1), buoy(2)]), sink.clone());

        let outcome = orch.transform_schema(&SchemaId::from(BUOYS)).await;

        assert_eq!(outcome.status, TransformStatus::Success);
        assert_eq!(outcome.rows_processed, 2);
        assert_eq!(outcome.rows_upserted, 2);
        assert!(outcome.error.is_none());
        let rows = sink.rows.lock().await;
        let aid = &rows["navigation_aids__boylat__harbor:1"];
        assert_eq!(aid.lateral_side.as_deref(), Some("port"));
        assert_eq!(aid.colors, Some(vec!["red".to_string()]));
        assert_eq!(aid.scale_band, "harbor");
    }

    #[tokio::test]
    async fn rerun_on_unchanged_source_is_idempotent() {
        let sink = Arc::new(TableSink::default());
        let orch = orchestrator(MapReader::default().with(BUOYS, vec![buoy(1), buoy(2)]), sink.clone());
        let schemas = [SchemaId::from(BUOYS)];

        orch.transform_all(&schemas).await;
        let first = sink.rows.lock().await.clone();
        orch.transform_all(&schemas).await;
        let second = sink.rows.lock().await.clone();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
        assert_eq!(*sink.writes.lock().await, 4);
    }

    #[tokio::test]
    async fn unregistered_schema_is_skipped_not_failed() {
        let sink = Arc::new(TableSink::default());
        let orch = orchestrator(MapReader::default().with("navigation_aids__lights__harbor", vec![buoy(1)]), sink.clone());

        let summary = orch
            .transform_all(&[SchemaId::from("navigation_aids__lights__harbor")])
            .await;

        assert_eq!(summary.total, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert!(sink.rows.lock().await.is_empty());
    }

    #[tokio::test]
    async fn empty_schema_succeeds_with_zero_counts() {
        let orch = orchestrator(MapReader::default(), Arc::new(TableSink::default()));
        let outcome = orch.transform_schema(&SchemaId::from(BEACONS)).await;
        assert_eq!(outcome.status, TransformStatus::Success);
        assert_eq!((outcome.rows_processed, outcome.rows_upserted), (0, 0));
    }

    #[tokio::test]
    async fn missing_geometry_fails_only_that_schema() {
        let sink = Arc::new(TableSink::default());
        let beacon = SourceRow::new().with("fidn", 9_i64).with("catlam", "2").with_point(1.0, 2.0);
        let headless = SourceRow::new().with("fidn", 3_i64).with("catlam", "1");
        let reader = MapReader::default()
            .with(BEACONS, vec![beacon])
            .with(BUOYS, vec![buoy(1), headless, buoy(2)]);
        let orch = orchestrator(reader, sink.clone());

        let summary = orch
            .transform_all(&[SchemaId::from(BEACONS), SchemaId::from(BUOYS)])
            .await;

        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        let failed = &summary.results[1];
        assert_eq!(failed.status, TransformStatus::Failure);
        assert_eq!(failed.rows_processed, 3);
        assert_eq!(failed.rows_upserted, 0);
        assert!(failed.error.as_deref().unwrap_or_default().contains("Missing geometry"));

        let rows = sink.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert!(rows.contains_key("navigation_aids__bcnlat__coastal:9"));
    }

    #[tokio::test]
    async fn write_error_becomes_failure_outcome() {
        let sink = Arc::new(TableSink {
            fail_on_key: Some("navigation_aids__boylat__harbor:2".into()),
            ..Default::default()
        });
        let orch = orchestrator(MapReader::default().with(BUOYS, vec![buoy(1), buoy(2), buoy(3)]), sink.clone());

        let outcome = orch.transform_schema(&SchemaId::from(BUOYS)).await;

        assert_eq!(outcome.status, TransformStatus::Failure);
        assert_eq!(outcome.rows_upserted, 1);
        assert!(outcome.error.unwrap().contains("write refused"));
    }
}
