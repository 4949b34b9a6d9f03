use std::collections::HashSet;
use std::path::Path;
use crate::config::types::{CatalogueConfig, DatasetDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load and validate the dataset catalogue from a YAML file.
pub fn load_catalogue(path: impl AsRef<Path>) -> Result<Vec<DatasetDescriptor>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_catalogue(&content)
}

/// Parse and validate a catalogue from a YAML string.
///
/// Fails closed: any invalid entry rejects the whole document.
pub fn parse_catalogue(yaml: &str) -> Result<Vec<DatasetDescriptor>, ConfigError> {
    let config: CatalogueConfig = serde_yaml::from_str(yaml)?;
    validate(&config.repositories)?;
    Ok(config.repositories)
}

fn validate(repositories: &[DatasetDescriptor]) -> Result<(), ConfigError> {
    if repositories.is_empty() {
        return Err(ConfigError::Invalid("At least one repository required".into()));
    }

    let mut seen = HashSet::new();
    for (i, repo) in repositories.iter().enumerate() {
        for (field, value) in [
            ("key", &repo.key),
            ("name", &repo.name),
            ("category", &repo.category),
            ("url", &repo.url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "repositories[{i}].{field} must not be empty"
                )));
            }
        }
        if !is_valid_schema_key(&repo.key) {
            return Err(ConfigError::Invalid(format!(
                "repositories[{i}].key {:?}: Key must be a valid PostgreSQL identifier \
                 (lowercase, start with letter, only a-z, 0-9, _)",
                repo.key
            )));
        }
        if !seen.insert(repo.key.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Repository keys must be unique (duplicate {:?})",
                repo.key
            )));
        }
    }
    Ok(())
}

/// `^[a-z][a-z0-9_]*$`
pub fn is_valid_schema_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Scale;

    const TWO_REPOS: &str = r#"
repositories:
  - key: navigation_aids__boylat__harbor
    name: "Buoy Lateral (Harbour)"
    category: navigation_aids
    scale: harbor
    url: "kart@data.koordinates.com:land-information-new-zealand/layer-51300"

  - key: navigation_aids__bcnlat__coastal
    name: Beacon Lateral (Coastal)
    category: navigation_aids
    scale: coastal
    url: "kart@data.koordinates.com:land-information-new-zealand/layer-51250"
"#;

    #[test]
    fn parse_simple_catalogue() {
        let repos = parse_catalogue(TWO_REPOS).unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].key, "navigation_aids__boylat__harbor");
        assert_eq!(repos[0].scale, Scale::Harbor);
        assert_eq!(repos[1].name, "Beacon Lateral (Coastal)");
        assert_eq!(repos[1].scale, Scale::Coastal);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let yaml = r#"
repositories:
  - { key: a_b, name: one, category: c, scale: harbor, url: u1 }
  - { key: a_b, name: two, category: c, scale: approach, url: u2 }
"#;
        let err = parse_catalogue(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("unique")));
    }

    #[test]
    fn rejects_invalid_key_pattern() {
        for key in ["Upper", "1abc", "with-dash", "has space"] {
            let yaml = format!(
                "repositories:\n  - {{ key: \"{key}\", name: n, category: c, scale: harbor, url: u }}\n"
            );
            assert!(parse_catalogue(&yaml).is_err(), "key {key:?} should be rejected");
        }
    }

    #[test]
    fn rejects_unknown_scale_and_missing_field() {
        let bad_scale = "repositories:\n  - { key: a, name: n, category: c, scale: local, url: u }\n";
        assert!(matches!(parse_catalogue(bad_scale), Err(ConfigError::Yaml(_))));

        let missing_url = "repositories:\n  - { key: a, name: n, category: c, scale: harbor }\n";
        assert!(matches!(parse_catalogue(missing_url), Err(ConfigError::Yaml(_))));

        let empty_name = "repositories:\n  - { key: a, name: \"\", category: c, scale: harbor, url: u }\n";
        assert!(matches!(parse_catalogue(empty_name), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_catalogue() {
        assert!(parse_catalogue("repositories: []\n").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_catalogue("/definitely/not/here/repos.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn schema_key_pattern() {
        assert!(is_valid_schema_key("navigation_aids__boylat__harbor"));
        assert!(is_valid_schema_key("a"));
        assert!(!is_valid_schema_key(""));
        assert!(!is_valid_schema_key("_a"));
    }
}
