//! Synchronization engine.
//!
//! Keeps the registry, the SSH alias stanzas and git's identity config in
//! step across `add`, `change` and `remove`. Each handler takes the
//! [`Registry`] by value and hands it back, so the caller decides what is
//! loaded and when. Nothing here is transactional: a failed step leaves every
//! earlier step in place. The [`Journal`] records which steps landed and what
//! would undo them, and that record travels with the error.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::{
    config::Paths,
    error::AppError,
    git::{self, GitConfig, Scope, USER_EMAIL, USER_NAME},
    keys::{self, KeyGenerator, KeyRemoval, KeyStatus},
    profile::{GlobalConfig, Identity, Registry},
    prompt::Confirm,
    ssh_config::SshAliasStore,
    storage,
    validation::validate_new_identity,
};

/// A single mutation of one of the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EnsureKey,
    AppendRecord,
    SnapshotGlobal,
    ActivateIdentity,
    ApplyGitIdentity,
    UpsertAlias,
    RemoveKey,
    RemoveAlias,
    RemoveRecord,
    Persist,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::EnsureKey => "ensure-key",
            Step::AppendRecord => "append-record",
            Step::SnapshotGlobal => "snapshot-global",
            Step::ActivateIdentity => "activate-identity",
            Step::ApplyGitIdentity => "apply-git-identity",
            Step::UpsertAlias => "upsert-alias",
            Step::RemoveKey => "remove-key",
            Step::RemoveAlias => "remove-alias",
            Step::RemoveRecord => "remove-record",
            Step::Persist => "persist",
        }
    }

    /// The action that would undo this step
    pub fn compensation(self) -> &'static str {
        match self {
            Step::EnsureKey => "delete the generated keypair",
            Step::AppendRecord => "drop the appended record",
            Step::SnapshotGlobal => "clear the stored global snapshot",
            Step::ActivateIdentity => "restore the previous active user",
            Step::ApplyGitIdentity => "re-apply the previous git identity",
            Step::UpsertAlias => "remove the SSH alias stanza",
            Step::RemoveKey => "restore the deleted keypair",
            Step::RemoveAlias => "re-add the SSH alias stanza",
            Step::RemoveRecord => "re-insert the removed record",
            Step::Persist => "restore the previous registry file",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered record of the steps an operation has carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    operation: &'static str,
    completed: Vec<Step>,
    failures: Vec<(Step, String)>,
}

impl Journal {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            completed: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn done(&mut self, step: Step) {
        debug!(operation = self.operation, %step, "step completed");
        self.completed.push(step);
    }

    /// Records a failed step that the operation continues past
    fn skip(&mut self, step: Step, err: &AppError) {
        warn!(operation = self.operation, %step, error = %err, "step failed, continuing");
        self.failures.push((step, err.to_string()));
    }

    /// Turns a failed step into the error that ends the operation
    fn abort(&self, step: Step, err: AppError) -> AppError {
        error!(operation = self.operation, %step, error = %err, "step failed, aborting");
        for done in self.completed.iter().rev() {
            warn!(
                operation = self.operation,
                step = %done,
                compensation = done.compensation(),
                "completed step left in place"
            );
        }
        AppError::StepFailed {
            step,
            completed: self.completed.clone(),
            source: Box::new(err),
        }
    }

    pub fn completed(&self) -> &[Step] {
        &self.completed
    }

    /// Steps that failed without stopping the operation, with their error text
    pub fn failures(&self) -> &[(Step, String)] {
        &self.failures
    }
}

/// Input for [`Engine::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub alias: String,
}

impl NewIdentity {
    /// Builds the input with surrounding whitespace stripped from every field
    pub fn new(name: &str, email: &str, alias: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            alias: alias.trim().to_string(),
        }
    }
}

#[derive(Debug)]
pub struct AddOutcome {
    pub registry: Registry,
    pub identity: Identity,
    pub key: KeyStatus,
    /// Whether the new identity became the active one
    pub activated: bool,
    pub journal: Journal,
}

#[derive(Debug)]
pub struct ChangeOutcome {
    pub registry: Registry,
    pub identity: Identity,
    pub journal: Journal,
}

#[derive(Debug)]
pub struct RemoveOutcome {
    pub registry: Registry,
    pub identity: Identity,
    /// `None` when key removal failed
    pub key: Option<KeyRemoval>,
    pub aliases_removed: usize,
    pub journal: Journal,
}

/// Runs multi-store operations against one home directory
pub struct Engine<'a> {
    paths: &'a Paths,
    ssh: SshAliasStore,
    git: &'a dyn GitConfig,
    keygen: &'a dyn KeyGenerator,
    confirm: &'a dyn Confirm,
}

impl<'a> Engine<'a> {
    pub fn new(
        paths: &'a Paths,
        git: &'a dyn GitConfig,
        keygen: &'a dyn KeyGenerator,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            paths,
            ssh: SshAliasStore::new(&paths.ssh_config),
            git,
            keygen,
            confirm,
        }
    }

    /// Adds an identity, activating it when nothing is active yet
    pub fn add(&self, mut registry: Registry, new: NewIdentity, scope: Scope) -> Result<AddOutcome, AppError> {
        validate_new_identity(&new, &registry.users)?;

        let mut journal = Journal::new("add");
        let identity = Identity {
            id: registry.next_id(),
            ssh_key_path: self.paths.key_path(&new.alias),
            name: new.name,
            email: new.email,
            alias: new.alias,
        };

        // A cancelled prompt ends the command before anything is touched.
        let key = match keys::ensure_key(&identity, self.keygen, self.confirm) {
            Ok(status) => status,
            Err(err @ AppError::Inquire(_)) => return Err(err),
            Err(err) => return Err(journal.abort(Step::EnsureKey, err)),
        };
        journal.done(Step::EnsureKey);

        registry.add(identity.clone());
        journal.done(Step::AppendRecord);

        let activated = registry.active().is_none();
        if activated {
            self.snapshot_global_if_first(&mut registry, &mut journal);
            registry.active_user = Some(identity.id);
            journal.done(Step::ActivateIdentity);
            self.apply(&mut registry, &mut journal, &identity, scope)?;
        }

        self.ssh
            .upsert(&identity.alias, &identity.ssh_key_path)
            .map_err(|err| journal.abort(Step::UpsertAlias, err))?;
        journal.done(Step::UpsertAlias);

        self.persist(&registry, &mut journal)?;
        info!(id = identity.id, alias = %identity.alias, activated, "identity added");

        Ok(AddOutcome {
            registry,
            identity,
            key,
            activated,
            journal,
        })
    }

    /// Makes `id` the active identity and applies it to git
    pub fn change(&self, mut registry: Registry, id: u32, scope: Scope) -> Result<ChangeOutcome, AppError> {
        let identity = registry.find_by_id(id).cloned().ok_or(AppError::NotFound(id))?;
        let mut journal = Journal::new("change");

        self.snapshot_global_if_first(&mut registry, &mut journal);
        registry.active_user = Some(id);
        journal.done(Step::ActivateIdentity);
        self.apply(&mut registry, &mut journal, &identity, scope)?;

        self.persist(&registry, &mut journal)?;
        info!(id, alias = %identity.alias, %scope, "active identity changed");

        Ok(ChangeOutcome {
            registry,
            identity,
            journal,
        })
    }

    /// Removes `id` from every store.
    ///
    /// Key and alias removal are best effort: their failures are recorded in
    /// the journal and the record is still removed. Only a failed save or a
    /// cancelled confirmation prompt aborts.
    pub fn remove(&self, mut registry: Registry, id: u32) -> Result<RemoveOutcome, AppError> {
        let identity = registry.find_by_id(id).cloned().ok_or(AppError::NotFound(id))?;
        let mut journal = Journal::new("remove");

        let key = match keys::remove_key(&identity, self.confirm) {
            Ok(removal) => {
                journal.done(Step::RemoveKey);
                Some(removal)
            }
            Err(err @ AppError::Inquire(_)) => return Err(err),
            Err(err) => {
                journal.skip(Step::RemoveKey, &err);
                None
            }
        };

        let aliases_removed = match self.ssh.remove(&identity.alias) {
            Ok(count) => {
                journal.done(Step::RemoveAlias);
                count
            }
            Err(err) => {
                journal.skip(Step::RemoveAlias, &err);
                0
            }
        };

        registry.remove(id);
        journal.done(Step::RemoveRecord);

        self.persist(&registry, &mut journal)?;
        info!(id, alias = %identity.alias, "identity removed");

        Ok(RemoveOutcome {
            registry,
            identity,
            key,
            aliases_removed,
            journal,
        })
    }

    /// Stores the global git identity before gitmt first overwrites it.
    ///
    /// A missing global identity is not an error; nothing is stored.
    fn snapshot_global_if_first(&self, registry: &mut Registry, journal: &mut Journal) {
        if registry.git_applied || registry.global_config.is_some() || registry.active_user.is_some() {
            return;
        }

        let name = self.git.get(USER_NAME, Scope::Global);
        let email = self.git.get(USER_EMAIL, Scope::Global);
        match (name, email) {
            (Ok(Some(name)), Ok(Some(email))) => {
                registry.global_config = Some(GlobalConfig { name, email });
                journal.done(Step::SnapshotGlobal);
            }
            (Err(err), _) | (_, Err(err)) => {
                info!(error = %err, "could not read global git identity, no snapshot stored");
            }
            _ => info!("no global git identity to snapshot"),
        }
    }

    fn apply(
        &self,
        registry: &mut Registry,
        journal: &mut Journal,
        identity: &Identity,
        scope: Scope,
    ) -> Result<(), AppError> {
        git::apply_identity(self.git, &identity.name, &identity.email, scope)
            .map_err(|err| journal.abort(Step::ApplyGitIdentity, err))?;
        registry.git_applied = true;
        journal.done(Step::ApplyGitIdentity);
        Ok(())
    }

    fn persist(&self, registry: &Registry, journal: &mut Journal) -> Result<(), AppError> {
        storage::save_registry(&self.paths.registry_file, registry)
            .map_err(|err| journal.abort(Step::Persist, err))?;
        journal.done(Step::Persist);
        Ok(())
    }
}

/// All identities, in registry order
pub fn list(registry: &Registry) -> &[Identity] {
    &registry.users
}

/// The active identity, if any
pub fn current(registry: &Registry) -> Option<&Identity> {
    registry.active()
}

/// The global identity captured before gitmt first changed it
pub fn global(registry: &Registry) -> Option<&GlobalConfig> {
    registry.global_config.as_ref()
}

/// Public key of identity `id`; `Ok(None)` when it has no key
pub fn key(registry: &Registry, id: u32) -> Result<Option<String>, AppError> {
    let identity = registry.find_by_id(id).ok_or(AppError::NotFound(id))?;
    keys::public_key(identity)
}
