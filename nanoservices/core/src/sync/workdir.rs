use std::path::{Path, PathBuf};

use quasar_utils::QuasarResult;

/// Map a dataset name onto a safe directory name: every character outside
/// `[A-Za-z0-9_]` becomes `_`, then the result is lowercased.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Scratch directory for one dataset. [`WorkDir::remove`] deletes it off the
/// runtime threads; if the sync is cut short (panic, dropped future) the
/// `Drop` impl removes it instead.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Create `<root>/<sanitized name>`, replacing any leftover from an
    /// earlier run.
    pub async fn create(root: &Path, dataset_name: &str) -> QuasarResult<Self> {
        let path = root.join(sanitize_name(dataset_name));
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_dir_all(&path).await?;
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path, removed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory. Failure is logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove working directory")
            }
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.removed || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove working directory");
        }
    }
}
