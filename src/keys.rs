use std::{
    fs, io,
    path::Path,
    process::{Command, Output},
};

use tracing::{debug, info};

use crate::{config::public_key_path, error::AppError, profile::Identity, prompt::Confirm};

/// Key type passed to `ssh-keygen`
pub const KEY_TYPE: &str = "rsa";
/// Key size passed to `ssh-keygen`
pub const KEY_BITS: u32 = 4096;

/// Creates a keypair at a path
pub trait KeyGenerator {
    /// Writes a passphrase-less private key to `path` and its public half to `path.pub`
    fn generate(&self, path: &Path, comment: &str) -> Result<(), AppError>;
}

/// [`KeyGenerator`] backed by the `ssh-keygen` binary
#[derive(Debug, Default, Clone, Copy)]
pub struct SshKeygen;

impl KeyGenerator for SshKeygen {
    fn generate(&self, path: &Path, comment: &str) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bits = KEY_BITS.to_string();
        let keygen_output: Output = Command::new("ssh-keygen")
            .args(["-t", KEY_TYPE, "-b", bits.as_str(), "-C", comment, "-N", "", "-f"])
            .arg(path)
            .output()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => AppError::ExternalToolMissing("ssh-keygen".to_string()),
                _ => AppError::Io(err),
            })?;

        if !keygen_output.status.success() {
            return Err(AppError::ExternalToolFailed {
                tool: "ssh-keygen".to_string(),
                stderr: String::from_utf8_lossy(&keygen_output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of [`ensure_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// A private key was already present
    Existing,
    Generated,
    /// Generation was refused; the identity has no key material
    Declined,
}

/// Outcome of [`remove_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRemoval {
    NoneFound,
    Declined,
    Removed,
}

/// Makes sure a private key exists for `identity`, generating one on confirmation
pub fn ensure_key(
    identity: &Identity,
    generator: &dyn KeyGenerator,
    confirm: &dyn Confirm,
) -> Result<KeyStatus, AppError> {
    let path = &identity.ssh_key_path;
    if path.exists() {
        debug!(path = %path.display(), "ssh key already present");
        return Ok(KeyStatus::Existing);
    }

    let message = format!("No SSH key at {}. Generate one?", path.display());
    if !confirm.confirm(&message)? {
        info!(alias = %identity.alias, "ssh key generation declined");
        return Ok(KeyStatus::Declined);
    }

    generator.generate(path, &identity.email)?;
    info!(alias = %identity.alias, path = %path.display(), "ssh key generated");
    Ok(KeyStatus::Generated)
}

/// Deletes the keypair of `identity` on confirmation.
///
/// The private and public files are removed independently; either being
/// absent is fine.
pub fn remove_key(identity: &Identity, confirm: &dyn Confirm) -> Result<KeyRemoval, AppError> {
    let private = identity.ssh_key_path.as_path();
    let public = public_key_path(private);
    if !private.exists() && !public.exists() {
        return Ok(KeyRemoval::NoneFound);
    }

    let message = format!("Delete SSH key {}?", private.display());
    if !confirm.confirm(&message)? {
        return Ok(KeyRemoval::Declined);
    }

    let private_removed = remove_if_present(private);
    let public_removed = remove_if_present(&public);
    private_removed?;
    public_removed?;
    info!(alias = %identity.alias, "ssh key removed");
    Ok(KeyRemoval::Removed)
}

fn remove_if_present(path: &Path) -> Result<(), AppError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Public key contents of `identity`, or `None` if there is none
pub fn public_key(identity: &Identity) -> Result<Option<String>, AppError> {
    match fs::read_to_string(public_key_path(&identity.ssh_key_path)) {
        Ok(contents) => Ok(Some(contents.trim().to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
