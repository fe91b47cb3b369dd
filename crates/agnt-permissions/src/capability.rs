use std::sync::atomic::{AtomicBool, Ordering};

use agnt_tools::ToolCategory;

/// Session-wide capability flags gating the UI-automation and inter-agent
/// tool categories. Off by default; flipped on once the user answers the
/// one-shot capability prompt.
#[derive(Default)]
pub struct CapabilityFlags {
    ui: AtomicBool,
    inter_agent: AtomicBool,
}

impl CapabilityFlags {
    pub fn is_enabled(&self, category: ToolCategory) -> bool {
        match category {
            ToolCategory::Ui => self.ui.load(Ordering::Relaxed),
            ToolCategory::InterAgent => self.inter_agent.load(Ordering::Relaxed),
            ToolCategory::Ordinary | ToolCategory::CodeExec => true,
        }
    }

    pub fn enable(&self, category: ToolCategory) {
        match category {
            ToolCategory::Ui => self.ui.store(true, Ordering::Relaxed),
            ToolCategory::InterAgent => self.inter_agent.store(true, Ordering::Relaxed),
            ToolCategory::Ordinary | ToolCategory::CodeExec => {}
        }
    }
}
