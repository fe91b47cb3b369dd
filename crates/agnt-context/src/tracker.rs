use agnt_llm::Usage;

/// Records token accounting from the latest response and exposes
/// `usage_percent` against the model's max context length. One tracker is
/// chosen per call site — per-agent in orchestrated mode, a single global
/// tracker otherwise.
#[derive(Debug, Clone)]
pub struct TokenTracker {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub max_context_length: u32,
    pub auto_summarize_enabled: bool,
}

impl TokenTracker {
    pub fn new(max_context_length: u32) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            max_context_length,
            auto_summarize_enabled: true,
        }
    }

    /// Record the latest usage snapshot. `max_context_length`, if the
    /// server reported one, overrides the tracker's own value — the caller
    /// is responsible for separately updating the model registry when this
    /// differs from what's registered there.
    pub fn record(&mut self, usage: &Usage) {
        self.prompt_tokens = usage.prompt_tokens;
        self.completion_tokens = usage.completion_tokens;
        self.total_tokens = usage.total_tokens;
        if let Some(max) = usage.max_context_length.or(usage.context_length) {
            self.max_context_length = max;
        }
    }

    pub fn usage_percent(&self) -> f32 {
        if self.max_context_length == 0 {
            return 0.0;
        }
        self.prompt_tokens as f32 / self.max_context_length as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_percent_divides_prompt_by_max_context() {
        let mut tracker = TokenTracker::new(1000);
        tracker.record(&Usage {
            prompt_tokens: 500,
            completion_tokens: 10,
            total_tokens: 510,
            context_length: None,
            max_context_length: None,
        });
        assert!((tracker.usage_percent() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn server_reported_max_context_overrides_tracker() {
        let mut tracker = TokenTracker::new(1000);
        tracker.record(&Usage {
            prompt_tokens: 500,
            completion_tokens: 10,
            total_tokens: 510,
            context_length: None,
            max_context_length: Some(2000),
        });
        assert_eq!(tracker.max_context_length, 2000);
        assert!((tracker.usage_percent() - 0.25).abs() < f32::EPSILON);
    }
}
