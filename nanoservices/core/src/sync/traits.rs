use std::path::Path;

use async_trait::async_trait;
use quasar_utils::QuasarResult;

use crate::config::database::DatabaseUrl;

/// The external version-control tool.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into the (empty) directory `dest`.
    async fn clone_repo(&self, url: &str, dest: &Path) -> QuasarResult<()>;

    /// Render the clone at `repo_dir` into the schema named by the last path
    /// segment of `target`, replacing whatever is there.
    async fn materialize(&self, repo_dir: &Path, target: &DatabaseUrl) -> QuasarResult<()>;
}

/// Destination-side schema management needed before materialization.
#[async_trait]
pub trait SchemaAdmin: Send + Sync {
    async fn drop_schema(&self, schema: &str) -> QuasarResult<()>;
}
