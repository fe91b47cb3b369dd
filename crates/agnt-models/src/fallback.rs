//! Known-model context-length table. Used only when the
//! upstream models-list response doesn't advertise a length for a model, or
//! when no models-list call has happened yet.

pub const DEFAULT_FALLBACK: u32 = 32_768;

const TABLE: &[(&str, u32)] = &[
    ("deepseek", 131_072),
    ("gpt-4o", 128_000),
    ("claude-3", 200_000),
    ("claude-sonnet", 200_000),
    ("claude-opus", 200_000),
    ("claude-haiku", 200_000),
    ("gemini-1.5", 1_048_576),
    ("gemini-2", 1_048_576),
    ("llama-3.1", 131_072),
    ("llama-3.3", 131_072),
];

/// Longest-prefix-ish match against known model name fragments. Matching is
/// substring-based (not a strict prefix) since provider-qualified ids like
/// `anthropic/claude-3-opus` or `openrouter/deepseek/deepseek-chat` are
/// common on the wire.
pub fn fallback_context_length(model_id: &str) -> u32 {
    let lower = model_id.to_ascii_lowercase();
    TABLE
        .iter()
        .filter(|(needle, _)| lower.contains(needle))
        .max_by_key(|(needle, _)| needle.len())
        .map(|(_, len)| *len)
        .unwrap_or(DEFAULT_FALLBACK)
}
