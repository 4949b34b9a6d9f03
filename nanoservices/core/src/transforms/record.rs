use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use quasar_utils::error::Error;
use quasar_utils::QuasarResult;

use crate::sources::row::{PropertyValue, SourceRow};
use crate::transforms::schema::SchemaId;

/// Columns that never reach the properties bag: primary key, raw geometry and
/// the rendered GeoJSON.
pub const BOOKKEEPING_COLUMNS: [&str; 3] = ["pk", "shape", "geojson"];

/// WGS84 longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Read the first two coordinates of a GeoJSON point.
    pub fn from_geojson(value: &Value) -> Option<Self> {
        let coords = value.get("coordinates")?.as_array()?;
        let lng = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some(Self { lng, lat })
    }

    pub fn to_geojson(&self) -> String {
        json!({ "type": "Point", "coordinates": [self.lng, self.lat] }).to_string()
    }
}

/// One row of `navigation_aids`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationAid {
    pub source_schema: String,
    pub source_key: String,
    pub source_fidn: i64,
    pub source_object_type: String,
    pub scale_band: String,
    pub geom: GeoPoint,
    pub structure_type: String,
    pub mark_category: String,
    pub lateral_side: Option<String>,
    pub name: Option<String>,
    pub shape: Option<String>,
    pub colors: Option<Vec<String>>,
    pub color_pattern: Option<String>,
    pub topmark_shape: Option<String>,
    pub topmark_color: Option<String>,
    pub has_light: bool,
    pub light_characteristic: Option<String>,
    pub light_color: Option<String>,
    pub light_range_nm: Option<f64>,
    pub light_elevation_m: Option<f64>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl NavigationAid {
    /// The fields every normalizer fills the same way: identity, geometry,
    /// schema-derived attributes and the properties bag. Descriptive
    /// attributes start empty.
    pub fn base(
        schema: &SchemaId,
        row: &SourceRow,
        structure_type: &str,
        mark_category: &str,
    ) -> QuasarResult<Self> {
        let geom = row
            .geojson()
            .and_then(GeoPoint::from_geojson)
            .ok_or_else(|| Error::MissingGeometry {
                fidn: row.text("fidn").unwrap_or_default(),
            })?;
        let fidn = parse_fidn(row)?;

        Ok(Self {
            source_schema: schema.as_str().to_string(),
            source_key: schema.source_key(fidn),
            source_fidn: fidn,
            source_object_type: schema.object_kind(),
            scale_band: schema.scale_band(),
            geom,
            structure_type: structure_type.to_string(),
            mark_category: mark_category.to_string(),
            lateral_side: None,
            name: None,
            shape: None,
            colors: None,
            color_pattern: None,
            topmark_shape: None,
            topmark_color: None,
            has_light: false,
            light_characteristic: None,
            light_color: None,
            light_range_nm: None,
            light_elevation_m: None,
            properties: build_properties(row),
        })
    }
}

fn parse_fidn(row: &SourceRow) -> QuasarResult<i64> {
    let parsed = match row.get("fidn") {
        Some(PropertyValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(PropertyValue::Text(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::InvalidFeatureId(row.text("fidn").unwrap_or_default()))
}

/// Every non-null source attribute except the bookkeeping columns.
pub fn build_properties(row: &SourceRow) -> BTreeMap<String, PropertyValue> {
    row.fields()
        .filter(|(k, v)| !BOOKKEEPING_COLUMNS.contains(&k.as_str()) && !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaId {
        SchemaId::from("navigation_aids__boylat__approach")
    }

    #[test]
    fn base_record_carries_identity_and_geometry() {
        let row = SourceRow::new()
            .with("fidn", "3150")
            .with_point(174.78, -41.29);
        let aid = NavigationAid::base(&schema(), &row, "buoy", "lateral").unwrap();

        assert_eq!(aid.source_key, "navigation_aids__boylat__approach:3150");
        assert_eq!(aid.source_fidn, 3150);
        assert_eq!(aid.source_object_type, "BOYLAT");
        assert_eq!(aid.scale_band, "approach");
        assert_eq!(aid.geom, GeoPoint { lng: 174.78, lat: -41.29 });
        assert!(!aid.has_light);
    }

    #[test]
    fn numeric_fidn_is_accepted() {
        let row = SourceRow::new().with("fidn", 77_i64).with_point(0.0, 0.0);
        let aid = NavigationAid::base(&schema(), &row, "buoy", "lateral").unwrap();
        assert_eq!(aid.source_fidn, 77);
    }

    #[test]
    fn missing_geometry_is_an_error() {
        let row = SourceRow::new().with("fidn", "9");
        let err = NavigationAid::base(&schema(), &row, "buoy", "lateral").unwrap_err();
        assert!(matches!(err, Error::MissingGeometry { ref fidn } if fidn == "9"));

        let not_a_point = SourceRow::new()
            .with("fidn", "9")
            .with_geojson(json!({ "type": "Point" }));
        assert!(NavigationAid::base(&schema(), &not_a_point, "buoy", "lateral").is_err());
    }

    #[test]
    fn unparsable_fidn_is_an_error() {
        let row = SourceRow::new().with("fidn", "abc").with_point(1.0, 2.0);
        let err = NavigationAid::base(&schema(), &row, "buoy", "lateral").unwrap_err();
        assert!(matches!(err, Error::InvalidFeatureId(_)));
    }

    #[test]
    fn properties_skip_bookkeeping_and_nulls() {
        let row = SourceRow::from_json(
            json!({
                "pk": 1,
                "shape": "0101000020E6100000",
                "fidn": 5,
                "colour": "3",
                "inform": null,
                "objnam": "No 5",
            }),
            Some(json!({ "type": "Point", "coordinates": [1.0, 2.0] })),
        );
        let props = build_properties(&row);
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["colour", "fidn", "objnam"]);
    }

    #[test]
    fn point_renders_as_geojson() {
        let p = GeoPoint { lng: 1.5, lat: -2.0 };
        let v: Value = serde_json::from_str(&p.to_geojson()).unwrap();
        assert_eq!(v, json!({ "type": "Point", "coordinates": [1.5, -2.0] }));
    }
}
