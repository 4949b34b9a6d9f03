use async_trait::async_trait;
use quasar_utils::QuasarResult;

use crate::sources::row::SourceRow;
use crate::transforms::schema::SchemaId;

/// Reads every feature row of a materialized schema.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// All rows of all base tables in `schema`, geometry rendered to GeoJSON.
    /// A schema with no tables yields an empty vector.
    async fn read_schema(&self, schema: &SchemaId) -> QuasarResult<Vec<SourceRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<SourceRow>);

    #[async_trait]
    impl SourceReader for StaticSource {
        fn name(&self) -> &str { "static" }
        async fn read_schema(&self, _schema: &SchemaId) -> QuasarResult<Vec<SourceRow>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn source_trait_works() {
        let src = StaticSource(vec![SourceRow::new().with("fidn", "1").with_point(1.0, 2.0)]);
        assert_eq!(src.name(), "static");
        let rows = src.read_schema(&SchemaId::from("a__b__c")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("fidn").as_deref(), Some("1"));
    }
}
