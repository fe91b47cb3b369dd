use agnt_llm::Message;

use crate::error::Result;
use crate::policy::{projected_usage_percent, SUMMARIZE_THRESHOLD, TRUNCATE_THRESHOLD};
use crate::summarize::{summarize_messages, Summarizer};
use crate::tracker::TokenTracker;
use crate::truncate::{truncate_messages, DEFAULT_KEEP};

/// Runs the trigger policy against the tracker's current usage: below 90%,
/// nothing happens. At or above 90%, summarize; if the projected usage
/// after summarizing is still at or above 95%, truncate as a second pass.
pub async fn manage_context<S: Summarizer>(
    tracker: &TokenTracker,
    messages: Vec<Message>,
    model: &str,
    summarizer: &S,
) -> Result<Vec<Message>> {
    if !tracker.auto_summarize_enabled || tracker.usage_percent() < SUMMARIZE_THRESHOLD {
        return Ok(messages);
    }

    let summarized = summarize_messages(messages, model, summarizer).await?;

    let total_chars: usize = summarized.iter().map(|m| m.plain_text().len()).sum();
    let projected = projected_usage_percent(total_chars, tracker.max_context_length);

    if projected >= TRUNCATE_THRESHOLD {
        Ok(truncate_messages(summarized, DEFAULT_KEEP))
    } else {
        Ok(summarized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agnt_llm::Usage;

    struct EchoSummarizer;
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, _model: &str, transcript: &str) -> Result<String> {
            Ok(format!("summary of {} chars", transcript.len()))
        }
    }

    #[tokio::test]
    async fn below_threshold_leaves_messages_untouched() {
        let mut tracker = TokenTracker::new(1000);
        tracker.record(&Usage {
            prompt_tokens: 100,
            completion_tokens: 10,
            total_tokens: 110,
            context_length: None,
            max_context_length: None,
        });
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let result = manage_context(&tracker, messages.clone(), "gpt-4o", &EchoSummarizer)
            .await
            .unwrap();
        assert_eq!(result.len(), messages.len());
    }

    #[tokio::test]
    async fn above_threshold_summarizes() {
        let mut tracker = TokenTracker::new(1000);
        tracker.record(&Usage {
            prompt_tokens: 950,
            completion_tokens: 10,
            total_tokens: 960,
            context_length: None,
            max_context_length: None,
        });
        let messages = vec![Message::system("sys"), Message::user("a long message")];
        let result = manage_context(&tracker, messages, "gpt-4o", &EchoSummarizer)
            .await
            .unwrap();
        assert_eq!(result.len(), 3);
        assert!(result[1].plain_text().contains("CONVERSATION SUMMARY"));
    }
}
