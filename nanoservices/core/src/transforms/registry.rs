use std::collections::BTreeMap;
use std::sync::Arc;

use crate::transforms::lateral::LateralNormalizer;
use crate::transforms::traits::Normalizer;

/// Schema identifier → normalizer. Lookups are exact; every scale of a kind
/// is registered explicitly even when they share a normalizer.
///
/// Schemas missing from the registry are skipped by the transform stage.
#[derive(Clone, Default)]
pub struct Registry {
    normalizers: BTreeMap<String, Arc<dyn Normalizer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lateral beacon and lateral buoy datasets at harbor, approach and
    /// coastal scales.
    pub fn builtin() -> Self {
        let beacon: Arc<dyn Normalizer> = Arc::new(LateralNormalizer::beacon());
        let buoy: Arc<dyn Normalizer> = Arc::new(LateralNormalizer::buoy());

        let mut registry = Self::new();
        for scale in ["harbor", "approach", "coastal"] {
            registry = registry
                .register(format!("navigation_aids__bcnlat__{scale}"), beacon.clone())
                .register(format!("navigation_aids__boylat__{scale}"), buoy.clone());
        }
        registry
    }

    pub fn register(mut self, schema: impl Into<String>, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizers.insert(schema.into(), normalizer);
        self
    }

    pub fn get(&self, schema: &str) -> Option<Arc<dyn Normalizer>> {
        self.normalizers.get(schema).cloned()
    }

    pub fn contains(&self, schema: &str) -> bool {
        self.normalizers.contains_key(schema)
    }

    /// All registered schema identifiers, sorted.
    pub fn schemas(&self) -> Vec<&str> {
        self.normalizers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.normalizers.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}
