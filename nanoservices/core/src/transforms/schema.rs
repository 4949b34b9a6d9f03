use std::fmt;

/// A `category__objectKind__scale` schema name, e.g.
/// `navigation_aids__boylat__harbor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(String);

impl SchemaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(&self, index: usize) -> Option<&str> {
        self.0.split("__").nth(index).filter(|s| !s.is_empty())
    }

    /// Second segment upper-cased, or `UNKNOWN`.
    pub fn object_kind(&self) -> String {
        self.segment(1)
            .map(str::to_uppercase)
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    /// Third segment, or `unknown`.
    pub fn scale_band(&self) -> String {
        self.segment(2).unwrap_or("unknown").to_string()
    }

    /// Natural key of a feature in the destination table.
    pub fn source_key(&self, fidn: i64) -> String {
        format!("{}:{}", self.0, fidn)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SchemaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
