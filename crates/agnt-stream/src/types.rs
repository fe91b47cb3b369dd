//! Wire shapes for the chat-completions SSE grammar.
//!
//! These map loosely to the JSON emitted by `data: <json>` events; unknown
//! fields are ignored (`#[serde(default)]` everywhere) so the decoder keeps
//! working across minor provider differences.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ChunkEvent {
    #[serde(default)]
    pub choices: Vec<ChoiceDelta>,
    #[serde(default)]
    pub usage: Option<UsageWire>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChoiceDelta {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallDelta>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToolCallDelta {
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UsageWire {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub context_length: Option<u32>,
    #[serde(default)]
    pub max_context_length: Option<u32>,
}

impl From<UsageWire> for agnt_llm::Usage {
    fn from(w: UsageWire) -> Self {
        agnt_llm::Usage {
            prompt_tokens: w.prompt_tokens,
            completion_tokens: w.completion_tokens,
            total_tokens: w.total_tokens,
            context_length: w.context_length,
            max_context_length: w.max_context_length,
        }
    }
}

