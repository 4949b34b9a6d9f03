use serde::{Deserialize, Serialize};
use std::fmt;

/// The whole catalogue file: `repositories: [...]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogueConfig {
    pub repositories: Vec<DatasetDescriptor>,
}

/// One cataloged Kart repository and the schema it materializes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Destination schema name, also the transform-stage schema identifier.
    pub key: String,
    pub name: String,
    pub category: String,
    pub scale: Scale,
    pub url: String,
}

/// Chart scale band of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Harbor,
    Approach,
    Coastal,
    General,
    Overview,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Harbor => "harbor",
            Scale::Approach => "approach",
            Scale::Coastal => "coastal",
            Scale::General => "general",
            Scale::Overview => "overview",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
