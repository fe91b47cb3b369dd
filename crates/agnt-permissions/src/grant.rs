use std::path::Path;

use serde::{Deserialize, Serialize};

/// How long a permission grant lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantScope {
    /// Persisted to config, survives restarts.
    Always,
    /// Lives in memory, cleared on session reset.
    Session,
    /// Never stored; covers exactly the call it was raised for.
    Once,
}

/// What the user chose when prompted for a write-class tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Always,
    Session,
    Once,
    Deny,
}

/// `(normalized_repo_path, tool_name)` — the grant map key.
///
/// Normalization: absolute path, trailing separator stripped, compared
/// case-insensitively. The original casing is preserved in the struct
/// itself; only the derived `Eq`/`Hash`/`Ord` keys treat it
/// case-insensitively via [`PermissionKey::comparison_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionKey {
    pub repo_path: String,
    pub tool_name: String,
}

impl PermissionKey {
    pub fn new(repo_path: impl AsRef<Path>, tool_name: impl Into<String>) -> Self {
        Self {
            repo_path: normalize_path(repo_path.as_ref()),
            tool_name: tool_name.into(),
        }
    }

    fn comparison_key(&self) -> (String, String) {
        (
            self.repo_path.to_ascii_lowercase(),
            self.tool_name.to_ascii_lowercase(),
        )
    }
}

impl PartialEq for PermissionKey {
    fn eq(&self, other: &Self) -> bool {
        self.comparison_key() == other.comparison_key()
    }
}
impl Eq for PermissionKey {}

impl std::hash::Hash for PermissionKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.comparison_key().hash(state);
    }
}

fn normalize_path(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let mut s = absolute.to_string_lossy().into_owned();
    while s.len() > 1 && (s.ends_with('/') || s.ends_with('\\')) {
        s.pop();
    }
    s
}
