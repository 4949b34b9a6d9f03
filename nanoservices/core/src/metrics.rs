use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// Crate-local registry; every metric below is registered on first use.
static REGISTRY: Lazy<Registry> =
    Lazy::new(|| Registry::new_custom(Some("quasar".to_string()), None).unwrap_or_default());

static PIPELINE_RUNS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register(IntCounterVec::new(
        Opts::new("pipeline_runs_total", "Pipeline runs started, by trigger"),
        &["trigger"],
    ))
});

static PIPELINE_REJECTIONS: Lazy<Option<IntCounter>> = Lazy::new(|| {
    register(IntCounter::new(
        "pipeline_rejections_total",
        "Triggers rejected because a run was already in progress",
    ))
});

static PIPELINE_DURATION_MS: Lazy<Option<Histogram>> = Lazy::new(|| {
    let opts = HistogramOpts::new("pipeline_duration_ms", "Pipeline run duration in milliseconds")
        .buckets(vec![100.0, 1_000.0, 10_000.0, 60_000.0, 300_000.0, 900_000.0, 3_600_000.0]);
    register(Histogram::with_opts(opts))
});

static DATASET_SYNCS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register(IntCounterVec::new(
        Opts::new("dataset_syncs_total", "Dataset sync outcomes, by status"),
        &["status"],
    ))
});

static SCHEMA_TRANSFORMS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register(IntCounterVec::new(
        Opts::new("schema_transforms_total", "Schema transform outcomes, by status"),
        &["status"],
    ))
});

static ROWS_UPSERTED: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register(IntCounterVec::new(
        Opts::new("rows_upserted_total", "Rows written to navigation_aids, by source schema"),
        &["schema"],
    ))
});

fn register<M: Collector + Clone + 'static>(metric: prometheus::Result<M>) -> Option<M> {
    let registered = metric.and_then(|m| REGISTRY.register(Box::new(m.clone())).map(|_| m));
    match registered {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::error!(error = %e, "failed to register metric");
            None
        }
    }
}

/// Count a started run. `trigger` is `http`, `interval` or `manual`.
pub fn inc_run(trigger: &str) {
    if let Some(c) = PIPELINE_RUNS.as_ref() {
        c.with_label_values(&[trigger]).inc();
    }
}

pub fn inc_rejection() {
    if let Some(c) = PIPELINE_REJECTIONS.as_ref() {
        c.inc();
    }
}

/// Triggers rejected so far, zero when the counter failed to register.
pub fn rejection_count() -> u64 {
    PIPELINE_REJECTIONS.as_ref().map_or(0, |c| c.get())
}

pub fn observe_duration(duration_ms: f64) {
    if let Some(h) = PIPELINE_DURATION_MS.as_ref() {
        h.observe(duration_ms);
    }
}

pub fn inc_dataset_sync(status: &str) {
    if let Some(c) = DATASET_SYNCS.as_ref() {
        c.with_label_values(&[status]).inc();
    }
}

pub fn inc_schema_transform(status: &str) {
    if let Some(c) = SCHEMA_TRANSFORMS.as_ref() {
        c.with_label_values(&[status]).inc();
    }
}

pub fn add_rows_upserted(schema: &str, rows: u64) {
    if let Some(c) = ROWS_UPSERTED.as_ref() {
        c.with_label_values(&[schema]).inc_by(rows);
    }
}

/// Gather metrics as text in Prometheus exposition format.
///
/// ```no_run
/// use quasar_core::metrics;
/// metrics::inc_run("manual");
/// let body = metrics::gather_text();
/// println!("metrics:\n{}", body);
/// ```
pub fn gather_text() -> String {
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = TextEncoder::new().encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
