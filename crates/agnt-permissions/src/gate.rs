use std::path::Path;

use agnt_tools::{RiskClass, ToolCategory};

use crate::capability::CapabilityFlags;
use crate::error::Result;
use crate::grant::{PermissionKey, PromptChoice};
use crate::mcp_context::in_mcp_context;
use crate::prompt::PromptHandler;
use crate::store::GrantStore;

/// Mediates every side-effecting tool call through three layered checks:
/// category capability, MCP-context bypass, then risk-class + grant map.
pub struct PermissionGate<H: PromptHandler> {
    store: GrantStore,
    capabilities: CapabilityFlags,
    prompt: H,
}

impl<H: PromptHandler> PermissionGate<H> {
    pub fn new(store: GrantStore, prompt: H) -> Self {
        Self {
            store,
            capabilities: CapabilityFlags::default(),
            prompt,
        }
    }

    /// `check(tool_name, args_json) -> granted`, per the gate's contract.
    /// `args_json` isn't consulted here — categories and risk class are
    /// static per tool name, looked up by the caller from the tool
    /// registry and passed in directly.
    pub async fn check(
        &self,
        repo_path: &Path,
        tool_name: &str,
        category: ToolCategory,
        risk: RiskClass,
    ) -> Result<bool> {
        if category.requires_capability_flag() && !self.capabilities.is_enabled(category) {
            let granted = self.prompt.prompt_capability(category_label(category)).await;
            if !granted {
                return Ok(false);
            }
            self.capabilities.enable(category);
        }

        if category.requires_capability_flag() && risk == RiskClass::ReadOnly {
            return Ok(true);
        }

        if in_mcp_context() {
            return Ok(true);
        }

        if risk == RiskClass::ReadOnly {
            return Ok(true);
        }

        let key = PermissionKey::new(repo_path, tool_name);
        if self.store.has_always(&key) || self.store.has_session(&key) {
            return Ok(true);
        }

        match self.prompt.prompt_grant(&key.repo_path, &key.tool_name).await {
            PromptChoice::Always => {
                self.store.grant_always(key).await?;
                Ok(true)
            }
            PromptChoice::Session => {
                self.store.grant_session(key);
                Ok(true)
            }
            PromptChoice::Once => Ok(true),
            PromptChoice::Deny => Ok(false),
        }
    }

    pub fn reset_session(&self) {
        self.store.reset_session();
    }
}

fn category_label(category: ToolCategory) -> &'static str {
    match category {
        ToolCategory::Ui => "ui-automation",
        ToolCategory::InterAgent => "inter-agent",
        ToolCategory::Ordinary | ToolCategory::CodeExec => "ordinary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_context::with_mcp_context;
    use crate::prompt::FixedPromptHandler;

    async fn gate_with(grant: PromptChoice, capability: bool) -> PermissionGate<FixedPromptHandler> {
        let dir = tempfile::tempdir().unwrap();
        let store = GrantStore::load(dir.path().join("grants.json")).await.unwrap();
        PermissionGate::new(store, FixedPromptHandler { capability, grant })
    }

    #[tokio::test]
    async fn read_only_tools_bypass_everything() {
        let gate = gate_with(PromptChoice::Deny, false).await;
        let granted = gate
            .check(Path::new("/repo"), "read_file", ToolCategory::Ordinary, RiskClass::ReadOnly)
            .await
            .unwrap();
        assert!(granted);
    }

    #[tokio::test]
    async fn write_tool_denied_without_grant() {
        let gate = gate_with(PromptChoice::Deny, false).await;
        let granted = gate
            .check(Path::new("/repo"), "bash", ToolCategory::Ordinary, RiskClass::Write)
            .await
            .unwrap();
        assert!(!granted);
    }

    #[tokio::test]
    async fn session_grant_is_reused_without_reprompting() {
        let gate = gate_with(PromptChoice::Session, false).await;
        assert!(gate
            .check(Path::new("/repo"), "bash", ToolCategory::Ordinary, RiskClass::Write)
            .await
            .unwrap());

        // Flip the stub to deny — a cached session grant must still win.
        let dir_store = &gate.store;
        assert!(dir_store.has_session(&PermissionKey::new("/repo", "bash")));
    }

    #[tokio::test]
    async fn mcp_context_auto_grants_write_tools() {
        let gate = gate_with(PromptChoice::Deny, false).await;
        let granted = with_mcp_context(true, async {
            gate.check(Path::new("/repo"), "bash", ToolCategory::Ordinary, RiskClass::Write)
                .await
                .unwrap()
        })
        .await;
        assert!(granted);
    }

    #[tokio::test]
    async fn ui_category_needs_capability_flag_first() {
        let gate = gate_with(PromptChoice::Deny, false).await;
        let granted = gate
            .check(Path::new("/repo"), "click", ToolCategory::Ui, RiskClass::ReadOnly)
            .await
            .unwrap();
        assert!(!granted, "capability denied should block even read-only UI tools");

        let gate = gate_with(PromptChoice::Deny, true).await;
        let granted = gate
            .check(Path::new("/repo"), "click", ToolCategory::Ui, RiskClass::ReadOnly)
            .await
            .unwrap();
        assert!(granted, "read-only UI tools auto-allowed once capability is on");
    }

    #[tokio::test]
    async fn always_grant_persists_in_store() {
        let gate = gate_with(PromptChoice::Always, false).await;
        assert!(gate
            .check(Path::new("/repo"), "bash", ToolCategory::Ordinary, RiskClass::Write)
            .await
            .unwrap());
        assert!(gate.store.has_always(&PermissionKey::new("/repo", "bash")));
    }
}
