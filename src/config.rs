use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Environment variable that overrides the home directory gitmt works in
pub const HOME_OVERRIDE_ENV: &str = "GITMT_HOME";
/// Registry file in user's home directory
const REGISTRY_FILE: &str = ".gitmt.json";
/// SSH directory in user's home directory
const SSH_DIR: &str = ".ssh";
/// SSH client config file inside the SSH directory
const SSH_CONFIG_FILE: &str = "config";

/// Filesystem locations of every store gitmt touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub home: PathBuf,
    pub registry_file: PathBuf,
    pub ssh_dir: PathBuf,
    pub ssh_config: PathBuf,
}

impl Paths {
    /// Resolves paths from `GITMT_HOME`, falling back to the user's home directory
    pub fn from_env() -> Result<Self, AppError> {
        let home = match std::env::var_os(HOME_OVERRIDE_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir().ok_or(AppError::HomeDirMissing)?,
        };
        Ok(Self::under(home))
    }

    /// Lays out every store beneath `home`
    pub fn under(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let ssh_dir = home.join(SSH_DIR);
        Self {
            registry_file: home.join(REGISTRY_FILE),
            ssh_config: ssh_dir.join(SSH_CONFIG_FILE),
            ssh_dir,
            home,
        }
    }

    /// Private key path for an alias
    pub fn key_path(&self, alias: &str) -> PathBuf {
        self.ssh_dir.join(format!("id_rsa_{alias}"))
    }
}

/// Public half of a private key path
pub fn public_key_path(private_key: &Path) -> PathBuf {
    let mut path = private_key.as_os_str().to_owned();
    path.push(".pub");
    PathBuf::from(path)
}
