use std::future::Future;

use agnt_llm::Message;

use crate::error::Result;

const MAX_BODY_CHARS: usize = 2_000;

const SUMMARY_SYSTEM_PROMPT: &str = "You are summarizing an in-progress coding session. \
Create a concise summary that preserves all important context, decisions made, files \
modified, errors encountered, and current task status.";

/// Issues the dedicated summarization completion. Kept as a trait so the
/// context manager doesn't need to depend on a concrete transport — the
/// agent loop supplies an implementation backed by the real streaming
/// client.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, model: &str, transcript: &str) -> impl Future<Output = Result<String>>;
}

/// Builds the role-labeled transcript handed to the summarization request.
pub fn build_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| !m.is_system())
        .map(|m| {
            let label = role_label(m);
            let mut body = m.plain_text();
            if body.len() > MAX_BODY_CHARS {
                body.truncate(MAX_BODY_CHARS);
                body.push_str("...[truncated]");
            }
            format!("{label}: {body}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn role_label(message: &Message) -> String {
    match message {
        Message::User { .. } => "User".to_string(),
        Message::Assistant { .. } => "Assistant".to_string(),
        Message::Tool { name, .. } => format!("Tool({name})"),
        Message::System { .. } => "System".to_string(),
    }
}

/// Replaces the message list with `[system] + [user: wrapped summary] +
/// [assistant: acknowledgement]`, preserving the original system message.
pub async fn summarize_messages<S: Summarizer>(
    messages: Vec<Message>,
    model: &str,
    summarizer: &S,
) -> Result<Vec<Message>> {
    let system = messages.iter().find(|m| m.is_system()).cloned();
    let transcript = build_transcript(&messages);

    let summary = summarizer.summarize(model, &transcript).await?;

    let wrapped = format!("[CONVERSATION SUMMARY - continuing an in-progress session]\n{summary}\n[END SUMMARY - Continue from here]");

    let mut result = Vec::with_capacity(3);
    if let Some(system) = system {
        result.push(system);
    }
    result.push(Message::user(wrapped));
    result.push(Message::assistant(
        "Understood — I've reviewed the summary and will continue from here.",
    ));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSummarizer;
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, _model: &str, transcript: &str) -> Result<String> {
            Ok(format!("summary of: {transcript}"))
        }
    }

    #[tokio::test]
    async fn preserves_system_message_and_wraps_summary() {
        let messages = vec![
            Message::system("be helpful"),
            Message::user("do the thing"),
            Message::assistant("doing it"),
        ];
        let result = summarize_messages(messages, "gpt-4o", &EchoSummarizer).await.unwrap();
        assert!(result[0].is_system());
        assert!(result[1].plain_text().contains("CONVERSATION SUMMARY"));
        assert!(result[1].plain_text().contains("END SUMMARY"));
        assert!(result[2].is_assistant());
    }

    #[test]
    fn transcript_labels_roles_and_caps_body_length() {
        let long_body = "x".repeat(3_000);
        let messages = vec![
            Message::user(long_body.clone()),
            Message::tool_result("call-1", "read_file", "ok"),
        ];
        let transcript = build_transcript(&messages);
        assert!(transcript.starts_with("User: "));
        assert!(transcript.contains("...[truncated]"));
        assert!(transcript.len() < long_body.len() + 500);
    }
}
