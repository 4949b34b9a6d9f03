use quasar_utils::QuasarResult;

use crate::sources::row::SourceRow;
use crate::transforms::record::NavigationAid;
use crate::transforms::schema::SchemaId;

/// Maps raw rows of one dataset kind onto the `navigation_aids` shape.
pub trait Normalizer: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Normalize a single row.
    fn normalize(&self, schema: &SchemaId, row: &SourceRow) -> QuasarResult<NavigationAid>;

    /// Normalize a whole batch; the first bad row fails the batch.
    fn normalize_all(&self, schema: &SchemaId, rows: &[SourceRow]) -> QuasarResult<Vec<NavigationAid>> {
        rows.iter().map(|row| self.normalize(schema, row)).collect()
    }
}
