use async_trait::async_trait;
use pg_escape::quote_identifier;
use serde_json::Value;

use quasar_utils::QuasarResult;

use crate::sources::row::SourceRow;
use crate::sources::traits::SourceReader;
use crate::store::db::Store;
use crate::transforms::schema::SchemaId;

/// Geometry column written by `kart create-workingcopy`.
pub const GEOMETRY_COLUMN: &str = "shape";

const LIST_TABLES: &str = r"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema::text = $1
      AND table_type = 'BASE TABLE'
      AND table_name NOT LIKE '\_kart%'
    ORDER BY table_name
";

pub(crate) fn select_rows_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT to_jsonb(t) AS attributes, ST_AsGeoJSON(t.{geom})::jsonb AS geojson FROM {}.{} t",
        quote_identifier(schema),
        quote_identifier(table),
        geom = quote_identifier(GEOMETRY_COLUMN),
    )
}

#[async_trait]
impl SourceReader for Store {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn read_schema(&self, schema: &SchemaId) -> QuasarResult<Vec<SourceRow>> {
        let client = self.client().await?;
        let tables = client.query(LIST_TABLES, &[&schema.as_str()]).await?;

        let mut rows = Vec::new();
        for table in &tables {
            let table_name: String = table.get(0);
            let sql = select_rows_sql(schema.as_str(), &table_name);
            let fetched = client.query(sql.as_str(), &[]).await?;
            tracing::debug!(schema = %schema, table = %table_name, rows = fetched.len(), "read source table");

            for row in &fetched {
                let attributes: Value = row.get("attributes");
                let geojson: Option<Value> = row.get("geojson");
                rows.push(SourceRow::from_json(attributes, geojson));
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_query_quotes_identifiers() {
        let sql = select_rows_sql("navigation_aids__boylat__harbor", "nz_buoy_lateral");
        assert!(sql.starts_with("SELECT to_jsonb(t) AS attributes, ST_AsGeoJSON(t.shape)::jsonb AS geojson"));
        assert!(sql.ends_with("FROM navigation_aids__boylat__harbor.nz_buoy_lateral t"), "{sql}");

        let sql = select_rows_sql("odd schema", "Mixed\"Case");
        assert!(sql.contains(r#"FROM "odd schema"."Mixed""Case" t"#), "{sql}");
    }
}
