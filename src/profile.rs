use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Represents a Git identity stored in the registry file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Registry id, assigned at creation
    pub id: u32,
    /// Git username (user.name)
    pub name: String,
    /// Git email address (user.email)
    pub email: String,
    /// Unique alias, used as the `github.com-<alias>` SSH host suffix
    pub alias: String,
    /// Private key path derived from the alias
    pub ssh_key_path: PathBuf,
}

/// Global git identity as it was before gitmt first overwrote it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub name: String,
    pub email: String,
}

/// The full registry document
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Registry {
    pub users: Vec<Identity>,
    pub active_user: Option<u32>,
    pub global_config: Option<GlobalConfig>,
    /// Set once gitmt has written a git identity; the snapshot is only taken before that
    pub git_applied: bool,
}

impl Registry {
    /// Id for the next identity.
    ///
    /// This is `users.len() + 1`, not `max(id) + 1`, so an id can be handed out
    /// again after a removal. Collisions are logged, not corrected.
    pub fn next_id(&self) -> u32 {
        let id = self.users.len() as u32 + 1;
        if self.find_by_id(id).is_some() {
            warn!(id, "next id collides with an existing identity");
        }
        id
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Identity> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&Identity> {
        self.users.iter().find(|user| user.alias == alias)
    }

    pub fn add(&mut self, identity: Identity) {
        self.users.push(identity);
    }

    /// Removes the identity with `id`, clearing `active_user` if it pointed at it.
    ///
    /// No other identity is promoted to active.
    pub fn remove(&mut self, id: u32) -> Option<Identity> {
        let index = self.users.iter().position(|user| user.id == id)?;
        let removed = self.users.remove(index);
        if self.active_user == Some(id) {
            self.active_user = None;
        }
        Some(removed)
    }

    /// The active identity, if any
    pub fn active(&self) -> Option<&Identity> {
        self.active_user.and_then(|id| self.find_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity(id: u32, alias: &str) -> Identity {
        Identity {
            id,
            name: format!("User {id}"),
            email: format!("{alias}@example.com"),
            alias: alias.to_string(),
            ssh_key_path: PathBuf::from(format!("/tmp/.ssh/id_rsa_{alias}")),
        }
    }

    #[test]
    fn test_next_id_counts_users() {
        let mut registry = Registry::default();
        assert_eq!(registry.next_id(), 1);
        registry.add(identity(1, "a"));
        registry.add(identity(2, "b"));
        assert_eq!(registry.next_id(), 3);
    }

    #[test]
    fn test_next_id_reuses_after_removal() {
        let mut registry = Registry::default();
        registry.add(identity(1, "a"));
        registry.add(identity(2, "b"));
        registry.remove(1);
        // Only one user left, so the next id is 2 again.
        assert_eq!(registry.next_id(), 2);
    }

    #[test]
    fn test_remove_clears_active_without_promotion() {
        let mut registry = Registry::default();
        registry.add(identity(1, "a"));
        registry.add(identity(2, "b"));
        registry.active_user = Some(1);

        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.alias, "a");
        assert_eq!(registry.active_user, None);
        assert_eq!(registry.users.len(), 1);
    }

    #[test]
    fn test_remove_other_keeps_active() {
        let mut registry = Registry::default();
        registry.add(identity(1, "a"));
        registry.add(identity(2, "b"));
        registry.active_user = Some(1);

        registry.remove(2);
        assert_eq!(registry.active().map(|user| user.id), Some(1));
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut registry = Registry::default();
        registry.add(identity(1, "a"));
        assert!(registry.remove(9).is_none());
        assert_eq!(registry.users.len(), 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut registry = Registry::default();
        registry.add(identity(1, "a"));
        registry.active_user = Some(1);
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["activeUser"], 1);
        assert_eq!(json["users"][0]["sshKeyPath"], "/tmp/.ssh/id_rsa_a");
        assert!(json["globalConfig"].is_null());
    }
}
