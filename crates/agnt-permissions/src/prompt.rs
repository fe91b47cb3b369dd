use std::future::Future;

use crate::grant::PromptChoice;

/// How the gate asks a human (or an automated policy) for a decision.
/// Implementations can be backed by a terminal prompt, a UI dialog, or a
/// fixed-answer stub for tests — the gate itself doesn't care which.
pub trait PromptHandler: Send + Sync {
    fn prompt_capability(&self, category_label: &str) -> impl Future<Output = bool> + Send;

    fn prompt_grant(
        &self,
        repo_path: &str,
        tool_name: &str,
    ) -> impl Future<Output = PromptChoice> + Send;
}

/// Always answers the same way. Useful for tests and for headless/CI runs
/// that want a fixed policy instead of an interactive prompt.
pub struct FixedPromptHandler {
    pub capability: bool,
    pub grant: PromptChoice,
}

impl PromptHandler for FixedPromptHandler {
    async fn prompt_capability(&self, _category_label: &str) -> bool {
        self.capability
    }

    async fn prompt_grant(&self, _repo_path: &str, _tool_name: &str) -> PromptChoice {
        self.grant
    }
}
