use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStatus {
    Success,
    Failure,
    /// No normalizer registered for the schema.
    Skipped,
}

impl TransformStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformStatus::Success => "success",
            TransformStatus::Failure => "failure",
            TransformStatus::Skipped => "skipped",
        }
    }
}

/// Result of transforming one source schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    pub status: TransformStatus,
    pub schema: String,
    pub rows_processed: usize,
    pub rows_upserted: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransformOutcome {
    pub(crate) fn skipped(schema: &str) -> Self {
        Self {
            status: TransformStatus::Skipped,
            schema: schema.to_string(),
            rows_processed: 0,
            rows_upserted: 0,
            duration_ms: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<TransformOutcome>,
}

impl TransformSummary {
    pub fn from_results(results: Vec<TransformOutcome>) -> Self {
        let count = |status: TransformStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            succeeded: count(TransformStatus::Success),
            failed: count(TransformStatus::Failure),
            skipped: count(TransformStatus::Skipped),
            results,
        }
    }
}
