use std::{
    fmt, io,
    process::{Command, Output},
};

use crate::error::AppError;

/// Git config key for the username
pub const USER_NAME: &str = "user.name";
/// Git config key for the email
pub const USER_EMAIL: &str = "user.email";

/// Scope a git identity is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Global,
    Local,
}

impl Scope {
    pub fn from_local_flag(local: bool) -> Self {
        if local { Scope::Local } else { Scope::Global }
    }

    fn flag(self) -> &'static str {
        match self {
            Scope::Global => "--global",
            Scope::Local => "--local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Local => f.write_str("local"),
        }
    }
}

/// Read/write access to git's `user.*` config
pub trait GitConfig {
    /// Returns the value of `key` at `scope`, or `None` when it is unset
    fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, AppError>;

    /// Sets `key` to `value` at `scope`
    fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), AppError>;
}

/// Applies a name/email pair at `scope`
pub fn apply_identity(git: &dyn GitConfig, name: &str, email: &str, scope: Scope) -> Result<(), AppError> {
    git.set(USER_NAME, name, scope)?;
    git.set(USER_EMAIL, email, scope)
}

/// [`GitConfig`] backed by the `git` binary
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitCli {
    fn run(args: &[&str]) -> Result<Output, AppError> {
        Command::new("git").args(args).output().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => AppError::ExternalToolMissing("git".to_string()),
            _ => AppError::Io(err),
        })
    }

    fn failure(output: &Output) -> AppError {
        AppError::ExternalToolFailed {
            tool: "git".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl GitConfig for GitCli {
    /// Executes a Git config get command
    ///
    /// `git config --get` exits with 1 when the key is unset.
    fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, AppError> {
        let git_command_output: Output = Self::run(&["config", scope.flag(), "--get", key])?;

        if git_command_output.status.code() == Some(1) {
            return Ok(None);
        }
        if !git_command_output.status.success() {
            return Err(Self::failure(&git_command_output));
        }

        let value = String::from_utf8_lossy(&git_command_output.stdout).trim().to_string();
        Ok(Some(value).filter(|value| !value.is_empty()))
    }

    /// Executes a Git config set command
    fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), AppError> {
        let git_command_output: Output = Self::run(&["config", scope.flag(), key, value])?;

        if !git_command_output.status.success() {
            return Err(Self::failure(&git_command_output));
        }

        Ok(())
    }
}
