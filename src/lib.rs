//! Manage several Git identities on one machine.
//!
//! Each identity has a name, an email, an SSH keypair and a
//! `github.com-<alias>` SSH host alias. The [`sync::Engine`] keeps the
//! identity registry, the SSH client config and git's `user.*` config
//! consistent across add, change and remove.
//!
//! Concurrent invocations against the same home directory are not guarded:
//! the last registry write wins and SSH config edits can interleave.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod keys;
pub mod logging;
pub mod profile;
pub mod prompt;
pub mod ssh_config;
pub mod storage;
pub mod sync;
pub mod validation;

pub use error::AppError;
pub use profile::{GlobalConfig, Identity, Registry};
