//! Shared fakes for driving the sync engine without `git` or `ssh-keygen`.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    path::Path,
};

use gitmt::{
    AppError, Registry,
    config::{Paths, public_key_path},
    git::{GitConfig, Scope, USER_EMAIL, USER_NAME},
    keys::KeyGenerator,
    prompt::Confirm,
    ssh_config::SshAliasStore,
    storage::load_registry,
};
use tempfile::TempDir;

/// In-memory git config
#[derive(Default)]
pub struct FakeGit {
    values: RefCell<HashMap<(Scope, String), String>>,
    pub fail_set: Cell<bool>,
    pub sets: Cell<u32>,
}

impl FakeGit {
    pub fn with_global(name: &str, email: &str) -> Self {
        let git = FakeGit::default();
        git.insert(Scope::Global, USER_NAME, name);
        git.insert(Scope::Global, USER_EMAIL, email);
        git
    }

    fn insert(&self, scope: Scope, key: &str, value: &str) {
        self.values.borrow_mut().insert((scope, key.to_string()), value.to_string());
    }

    pub fn value(&self, scope: Scope, key: &str) -> Option<String> {
        self.values.borrow().get(&(scope, key.to_string())).cloned()
    }
}

impl GitConfig for FakeGit {
    fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, AppError> {
        Ok(self.value(scope, key))
    }

    fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), AppError> {
        if self.fail_set.get() {
            return Err(AppError::ExternalToolFailed {
                tool: "git".to_string(),
                stderr: "fatal: not in a git directory".to_string(),
            });
        }
        self.insert(scope, key, value);
        self.sets.set(self.sets.get() + 1);
        Ok(())
    }
}

/// Writes placeholder key files instead of running `ssh-keygen`
#[derive(Default)]
pub struct FakeKeygen {
    pub fail: Cell<bool>,
    pub calls: Cell<u32>,
}

impl KeyGenerator for FakeKeygen {
    fn generate(&self, path: &Path, comment: &str) -> Result<(), AppError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(AppError::ExternalToolMissing("ssh-keygen".to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "PRIVATE KEY")?;
        fs::write(public_key_path(path), format!("ssh-rsa AAAAB3Nza {comment}\n"))?;
        Ok(())
    }
}

/// Fixed answer to every confirmation
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&self, _message: &str) -> Result<bool, AppError> {
        Ok(self.0)
    }
}

/// Dismisses every confirmation, as Esc or Ctrl-C would
pub struct Cancel;

impl Confirm for Cancel {
    fn confirm(&self, _message: &str) -> Result<bool, AppError> {
        Err(AppError::Inquire(inquire::InquireError::OperationCanceled))
    }
}

/// A throwaway home directory
pub struct Home {
    _dir: TempDir,
    pub paths: Paths,
}

impl Home {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        Self { _dir: dir, paths }
    }

    pub fn registry(&self) -> Registry {
        load_registry(&self.paths.registry_file).unwrap()
    }

    pub fn registry_bytes(&self) -> Option<Vec<u8>> {
        fs::read(&self.paths.registry_file).ok()
    }

    pub fn stanzas(&self, alias: &str) -> usize {
        SshAliasStore::new(&self.paths.ssh_config).count(alias).unwrap()
    }
}
