use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio_postgres::types::ToSql;

use quasar_utils::QuasarResult;

use crate::destinations::traits::NavAidSink;
use crate::store::db::Store;
use crate::transforms::record::NavigationAid;

/// Insert columns paired with their value expressions, in parameter order.
/// `source_key` is the conflict target; every other column is overwritten.
const COLUMNS: [(&str, &str); 21] = [
    ("source_schema", "$1"),
    ("source_key", "$2"),
    ("source_fidn", "$3::int8"),
    ("source_object_type", "$4"),
    ("scale_band", "$5"),
    ("geom", "ST_SetSRID(ST_GeomFromGeoJSON($6::text), 4326)"),
    ("structure_type", "$7"),
    ("mark_category", "$8"),
    ("lateral_side", "$9"),
    ("name", "$10"),
    ("shape", "$11"),
    ("colors", "$12::text[]"),
    ("color_pattern", "$13"),
    ("topmark_shape", "$14"),
    ("topmark_color", "$15"),
    ("has_light", "$16"),
    ("light_characteristic", "$17"),
    ("light_color", "$18"),
    ("light_range_nm", "$19::float8"),
    ("light_elevation_m", "$20::float8"),
    ("properties", "$21::jsonb"),
];

static UPSERT_SQL: Lazy<String> = Lazy::new(|| {
    let names: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
    let values: Vec<&str> = COLUMNS.iter().map(|(_, value)| *value).collect();
    let updates: Vec<String> = names
        .iter()
        .filter(|name| **name != "source_key")
        .map(|name| format!("{name} = EXCLUDED.{name}"))
        .collect();
    format!(
        "INSERT INTO navigation_aids ({}) VALUES ({}) ON CONFLICT (source_key) DO UPDATE SET {}",
        names.join(", "),
        values.join(", "),
        updates.join(", ")
    )
});

#[async_trait]
impl NavAidSink for Store {
    fn name(&self) -> &str {
        "navigation_aids"
    }

    async fn upsert(&self, aid: &NavigationAid) -> QuasarResult<()> {
        let geom = aid.geom.to_geojson();
        let properties = serde_json::to_value(&aid.properties)?;
        let params: [&(dyn ToSql + Sync); 21] = [
            &aid.source_schema,
            &aid.source_key,
            &aid.source_fidn,
            &aid.source_object_type,
            &aid.scale_band,
            &geom,
            &aid.structure_type,
            &aid.mark_category,
            &aid.lateral_side,
            &aid.name,
            &aid.shape,
            &aid.colors,
            &aid.color_pattern,
            &aid.topmark_shape,
            &aid.topmark_color,
            &aid.has_light,
            &aid.light_characteristic,
            &aid.light_color,
            &aid.light_range_nm,
            &aid.light_elevation_m,
            &properties,
        ];
        self.client().await?.execute(UPSERT_SQL.as_str(), &params).await?;
        Ok(())
    }
}
