use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grant::{GrantScope, PermissionKey};

/// On-disk shape: `{"toolPermissions": {"<abs-repo-path>:<tool-name>": true, ...}}`.
/// The composite key is produced by [`composite_key`]; the bool is always
/// `true` for a stored grant (absence means not granted).
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedGrants {
    #[serde(default, rename = "toolPermissions")]
    tool_permissions: HashMap<String, bool>,
}

fn composite_key(key: &PermissionKey) -> String {
    format!("{}:{}", key.repo_path, key.tool_name)
}

fn split_composite_key(composite: &str) -> Option<PermissionKey> {
    let (repo_path, tool_name) = composite.rsplit_once(':')?;
    Some(PermissionKey::new(repo_path, tool_name))
}

/// Holds both grant tiers: `always` grants persisted to a JSON config file,
/// `session` grants that live only in memory for this process. `once`
/// grants are never stored — callers just act on them directly.
pub struct GrantStore {
    config_path: PathBuf,
    always: RwLock<HashSet<PermissionKey>>,
    session: RwLock<HashSet<PermissionKey>>,
}

impl GrantStore {
    pub async fn load(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let always = match tokio::fs::read(&config_path).await {
            Ok(bytes) => {
                let persisted: PersistedGrants = serde_json::from_slice(&bytes)?;
                persisted
                    .tool_permissions
                    .into_iter()
                    .filter(|(_, granted)| *granted)
                    .filter_map(|(composite, _)| split_composite_key(&composite))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            config_path,
            always: RwLock::new(always),
            session: RwLock::new(HashSet::new()),
        })
    }

    pub fn scope_for(&self, key: &PermissionKey) -> Option<GrantScope> {
        if self.always.read().contains(key) {
            Some(GrantScope::Always)
        } else if self.session.read().contains(key) {
            Some(GrantScope::Session)
        } else {
            None
        }
    }

    pub fn has_always(&self, key: &PermissionKey) -> bool {
        self.always.read().contains(key)
    }

    pub fn has_session(&self, key: &PermissionKey) -> bool {
        self.session.read().contains(key)
    }

    pub fn grant_session(&self, key: PermissionKey) {
        self.session.write().insert(key);
    }

    pub async fn grant_always(&self, key: PermissionKey) -> Result<()> {
        self.always.write().insert(key);
        self.persist().await
    }

    /// Clears session grants only. `always` grants survive a session reset.
    pub fn reset_session(&self) {
        self.session.write().clear();
    }

    async fn persist(&self) -> Result<()> {
        let snapshot = PersistedGrants {
            tool_permissions: self
                .always
                .read()
                .iter()
                .map(|key| (composite_key(key), true))
                .collect(),
        };
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(&self.config_path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_grant_persists_across_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("grants.json");

        let store = GrantStore::load(&config_path).await.unwrap();
        let key = PermissionKey::new("/repo", "bash");
        store.grant_always(key.clone()).await.unwrap();

        let reloaded = GrantStore::load(&config_path).await.unwrap();
        assert!(reloaded.has_always(&key));
    }

    #[tokio::test]
    async fn session_grant_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("grants.json");
        let store = GrantStore::load(&config_path).await.unwrap();
        let key = PermissionKey::new("/repo", "edit");
        store.grant_session(key.clone());
        assert!(store.has_session(&key));

        store.reset_session();
        assert!(!store.has_session(&key));
    }

    #[tokio::test]
    async fn always_grant_is_persisted_as_the_documented_tool_permissions_map() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("grants.json");
        let store = GrantStore::load(&config_path).await.unwrap();
        let key = PermissionKey::new("/repo", "bash");
        store.grant_always(key.clone()).await.unwrap();

        let raw = tokio::fs::read_to_string(&config_path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["toolPermissions"][composite_key(&key)], true);
    }

    #[tokio::test]
    async fn missing_config_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nonexistent").join("grants.json");
        let store = GrantStore::load(&config_path).await.unwrap();
        assert!(store.scope_for(&PermissionKey::new("/repo", "bash")).is_none());
    }
}
