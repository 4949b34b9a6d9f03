//! SSH credential install for cloning over `kart@host:` URLs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use quasar_utils::error::Error;
use quasar_utils::QuasarResult;

/// Host whose keys are added to `known_hosts`.
pub const KNOWN_HOST: &str = "data.koordinates.com";

/// Decode a base64 private key, check it looks like one and make sure it ends
/// with a newline (ssh refuses keys without one).
pub fn decode_private_key(encoded: &str) -> QuasarResult<String> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::CredentialError(format!("SSH_PRIVATE_KEY is not valid base64: {e}")))?;
    let mut key = String::from_utf8(bytes)
        .map_err(|_| Error::CredentialError("SSH_PRIVATE_KEY does not decode to text".into()))?;
    if !key.contains("PRIVATE KEY") {
        return Err(Error::CredentialError(
            "SSH_PRIVATE_KEY does not contain a private key".into(),
        ));
    }
    if !key.ends_with('\n') {
        key.push('\n');
    }
    Ok(key)
}

/// File name ssh looks for, picked from the PEM header.
pub fn key_file_name(key: &str) -> &'static str {
    if key.contains("BEGIN RSA PRIVATE KEY") {
        "id_rsa"
    } else if key.contains("BEGIN EC PRIVATE KEY") {
        "id_ecdsa"
    } else {
        // OpenSSH format is ed25519 in practice.
        "id_ed25519"
    }
}

/// Write the key under `ssh_dir` (created `0700`, key `0600`) and return its
/// path.
pub fn write_key(ssh_dir: &Path, key: &str) -> QuasarResult<PathBuf> {
    fs::create_dir_all(ssh_dir)?;
    set_mode(ssh_dir, 0o700)?;

    let path = ssh_dir.join(key_file_name(key));
    fs::write(&path, key)?;
    set_mode(&path, 0o600)?;
    Ok(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> QuasarResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> QuasarResult<()> {
    Ok(())
}

/// Append the host keys of [`KNOWN_HOST`] to `known_hosts`. Failure only
/// warns; the clone will report it if it matters.
pub async fn add_known_host(ssh_dir: &Path) {
    let output = tokio::process::Command::new("ssh-keyscan")
        .args(["-t", "ed25519,rsa", KNOWN_HOST])
        .stdin(std::process::Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(o) if o.status.success() && !o.stdout.is_empty() => o,
        Ok(o) => {
            tracing::warn!(
                host = KNOWN_HOST,
                stderr = %String::from_utf8_lossy(&o.stderr).trim(),
                "ssh-keyscan returned no keys"
            );
            return;
        }
        Err(e) => {
            tracing::warn!(host = KNOWN_HOST, error = %e, "failed to run ssh-keyscan");
            return;
        }
    };

    let path = ssh_dir.join("known_hosts");
    let appended = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| f.write_all(&output.stdout));
    if let Err(e) = appended {
        tracing::warn!(path = %path.display(), error = %e, "failed to update known_hosts");
    }
}

/// `$HOME/.ssh`
pub fn default_ssh_dir() -> QuasarResult<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".ssh"))
        .ok_or_else(|| Error::CredentialError("HOME is not set; cannot locate ~/.ssh".into()))
}

/// Full install: decode, write, trust the host.
pub async fn install(encoded: &str, ssh_dir: &Path) -> QuasarResult<PathBuf> {
    let key = decode_private_key(encoded)?;
    let path = write_key(ssh_dir, &key)?;
    tracing::info!(path = %path.display(), "installed SSH private key");
    add_known_host(ssh_dir).await;
    Ok(path)
}
