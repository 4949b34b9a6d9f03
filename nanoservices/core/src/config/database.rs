use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::loader::ConfigError;

const MASK: &str = "***";

/// A validated PostgreSQL connection URL.
///
/// `Display` and `Debug` always print the masked form, so the password can
/// only leak through [`DatabaseUrl::expose`].
#[derive(Clone)]
pub struct DatabaseUrl {
    raw: String,
    password: Option<String>,
}

impl DatabaseUrl {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::Invalid("DATABASE_URL is required".into()));
        }
        if !(raw.starts_with("postgresql://") || raw.starts_with("postgres://")) {
            return Err(ConfigError::Invalid(
                "DATABASE_URL must be a PostgreSQL connection string".into(),
            ));
        }
        let parsed = Url::parse(raw)
            .map_err(|e| ConfigError::Invalid(format!("DATABASE_URL is not a valid URL: {e}")))?;
        let password = parsed.password().map(str::to_string);
        Ok(Self {
            raw: raw.to_string(),
            password,
        })
    }

    /// The unmasked connection string, for handing to drivers and `kart`.
    pub fn expose(&self) -> &str {
        &self.raw
    }

    /// Target URL for `kart create-workingcopy`: trailing slash removed,
    /// `postgresql://` scheme, `/{schema}` appended.
    pub fn working_copy_url(&self, schema: &str) -> DatabaseUrl {
        let mut base = self.raw.trim_end_matches('/').to_string();
        if let Some(rest) = base.strip_prefix("postgres://") {
            base = format!("postgresql://{rest}");
        }
        DatabaseUrl {
            raw: format!("{base}/{schema}"),
            password: self.password.clone(),
        }
    }

    /// Replace every occurrence of the password (percent-encoded or decoded)
    /// in `text` with `***`.
    pub fn redact(&self, text: &str) -> String {
        let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) else {
            return text.to_string();
        };
        let mut out = text.replace(password, MASK);
        let decoded = percent_decode_str(password).decode_utf8_lossy();
        if decoded != password && !decoded.is_empty() {
            out = out.replace(decoded.as_ref(), MASK);
        }
        out
    }
}

impl FromStr for DatabaseUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseUrl::parse(s)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redact(&self.raw))
    }
}

impl fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseUrl").field(&self.to_string()).finish()
    }
}
