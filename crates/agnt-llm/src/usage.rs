use serde::{Deserialize, Serialize};

/// Token accounting for one server response.
///
/// `max_context_length`, when the server supplies it, overrides the
/// configured ceiling for that model for the remainder of the session — see
/// agnt-context's model-context update step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_length: Option<u32>,
}

impl Usage {
    /// Merge a trailing usage-only event into an existing tally, as the
    /// streaming decoder does when a provider sends a second usage event
    /// after `[DONE]`-adjacent finish.
    pub fn merge(&mut self, other: Usage) {
        *self = other;
    }
}
