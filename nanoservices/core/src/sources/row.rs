use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

/// A scalar attribute value read from a source table.
///
/// Arrays and objects are flattened to their JSON text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// String form of the value; `None` for null and empty text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Bool(b) => Some(b.to_string()),
            PropertyValue::Number(n) => Some(n.to_string()),
            PropertyValue::Text(s) if s.is_empty() => None,
            PropertyValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => PropertyValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

/// One raw feature from a materialized schema, with its geometry already
/// rendered to GeoJSON by the database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    fields: BTreeMap<String, PropertyValue>,
    geojson: Option<Value>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a `to_jsonb(t)` object and the `ST_AsGeoJSON` value.
    pub fn from_json(attributes: Value, geojson: Option<Value>) -> Self {
        let fields = match attributes {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| (k, PropertyValue::from(v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        let geojson = geojson.filter(|g| !g.is_null());
        Self { fields, geojson }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_geojson(mut self, geojson: Value) -> Self {
        self.geojson = Some(geojson);
        self
    }

    /// Convenience for a GeoJSON `Point` at `lng, lat`.
    pub fn with_point(self, lng: f64, lat: f64) -> Self {
        self.with_geojson(serde_json::json!({ "type": "Point", "coordinates": [lng, lat] }))
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.fields.get(key)
    }

    /// Non-empty text form of an attribute.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(PropertyValue::as_text)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.fields.iter()
    }

    pub fn geojson(&self) -> Option<&Value> {
        self.geojson.as_ref()
    }
}
