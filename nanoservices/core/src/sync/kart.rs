use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use quasar_utils::error::Error;
use quasar_utils::QuasarResult;

use crate::config::database::DatabaseUrl;
use crate::sync::traits::VersionControl;

/// `kart` invoked as a child process.
#[derive(Debug, Clone)]
pub struct KartCli {
    bin: PathBuf,
}

struct ExecResult {
    stderr: String,
    exit_code: Option<i32>,
}

impl Default for KartCli {
    fn default() -> Self {
        Self::new("kart")
    }
}

impl KartCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Run kart to completion. `shown` is the masked command line used in
    /// errors.
    async fn exec(&self, args: &[OsString], cwd: Option<&Path>, shown: &str) -> QuasarResult<ExecResult> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| Error::ExternalTool {
            message: format!("Failed to spawn {}: {e}", self.bin.display()),
            command: shown.to_string(),
            exit_code: None,
            stderr: String::new(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::trace!(command = shown, stdout = %stdout.trim(), "kart output");
        }

        Ok(ExecResult {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: if output.status.success() { Some(0) } else { output.status.code() },
        })
    }
}

fn failed(result: &ExecResult) -> bool {
    result.exit_code != Some(0)
}

#[async_trait]
impl VersionControl for KartCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> QuasarResult<()> {
        let shown = format!("kart clone {url} {}", dest.display());
        tracing::debug!(url, path = %dest.display(), "cloning kart repository");

        let args = [OsString::from("clone"), OsString::from(url), dest.as_os_str().to_owned()];
        let result = self.exec(&args, None, &shown).await?;
        if failed(&result) {
            return Err(Error::ExternalTool {
                message: format!("Failed to clone repository: {url}"),
                command: shown,
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        tracing::debug!(url, "clone completed");
        Ok(())
    }

    async fn materialize(&self, repo_dir: &Path, target: &DatabaseUrl) -> QuasarResult<()> {
        // `target` displays masked.
        let shown = format!("kart create-workingcopy --delete-existing {target}");
        tracing::debug!(path = %repo_dir.display(), target = %target, "creating working copy");

        let args = [
            OsString::from("create-workingcopy"),
            OsString::from("--delete-existing"),
            OsString::from(target.expose()),
        ];
        let result = self.exec(&args, Some(repo_dir), &shown).await?;
        if failed(&result) {
            return Err(Error::ExternalTool {
                message: "Failed to create working copy".to_string(),
                command: shown,
                exit_code: result.exit_code,
                stderr: target.redact(&result.stderr),
            });
        }

        tracing::debug!(path = %repo_dir.display(), "working copy created");
        Ok(())
    }
}
