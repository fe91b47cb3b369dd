use serde::{Deserialize, Serialize};

/// Whether a tool call needs a permission grant before it runs. Read-only
/// tools bypass the grant map entirely; write tools consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskClass {
    ReadOnly,
    Write,
}

/// Groups tools for the extra capability-flag gate layered on top of the
/// risk-class check. UI-automation and inter-agent tools need a session-wide
/// capability flag to be on before per-tool grants apply at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    Ordinary,
    Ui,
    InterAgent,
    CodeExec,
}

impl ToolCategory {
    pub fn requires_capability_flag(self) -> bool {
        matches!(self, ToolCategory::Ui | ToolCategory::InterAgent)
    }
}
