use thiserror::Error;
use tokio_postgres::Error as PostgresError;
use std::io::Error as IoError;
use serde_json::Error as JsonError;
use url::ParseError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Postgres Error: {0}")]
    PostgresError(#[from] PostgresError),

    /// Checking a connection out of the pool failed (database unreachable,
    /// pool misconfigured).
    #[error("Pool Error: {0}")]
    PoolError(String),

    #[error("Io Error: {0}")]
    IoError(#[from] IoError),

    #[error("Json Error: {0}")]
    JsonError(#[from] JsonError),

    #[error("Url Error: {0}")]
    UrlParseError(#[from] ParseError),

    /// A `kart` (or other helper binary) invocation that failed to spawn or
    /// exited non-zero. All fields are already credential-masked.
    #[error("{message} (command: `{command}`, exit code: {}): {stderr}", fmt_exit(.exit_code))]
    ExternalTool {
        message: String,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Missing geometry for row with fidn: {fidn}")]
    MissingGeometry { fidn: String },

    #[error("Invalid feature id: {0:?}")]
    InvalidFeatureId(String),

    #[error("Credential Error: {0}")]
    CredentialError(String),
}

fn fmt_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    }
}
