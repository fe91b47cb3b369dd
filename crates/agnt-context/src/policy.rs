pub const SUMMARIZE_THRESHOLD: f32 = 0.90;
pub const TRUNCATE_THRESHOLD: f32 = 0.95;

/// Rough tokens-per-character ratio used to project post-summarization
/// usage without waiting for a real completion's token count.
const CHARS_PER_TOKEN: f32 = 4.0;

pub fn estimate_tokens(total_chars: usize) -> u32 {
    (total_chars as f32 / CHARS_PER_TOKEN).ceil() as u32
}

pub fn projected_usage_percent(total_chars: usize, max_context_length: u32) -> f32 {
    if max_context_length == 0 {
        return 0.0;
    }
    estimate_tokens(total_chars) as f32 / max_context_length as f32
}
