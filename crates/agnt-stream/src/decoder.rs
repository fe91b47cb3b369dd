//! The streaming protocol decoder.
//!
//! `decode` consumes a stream of already-unwrapped SSE `data:` payloads (the
//! transport in `http.rs` does the byte-level SSE framing) and merges
//! fragmented content, reasoning, and index-addressed tool-call argument
//! chunks into one [`TurnResult`]. Kept independent of the transport so it
//! can be exercised with plain `Vec<String>` fixtures in tests.

use std::collections::BTreeMap;
use std::time::Duration;

use agnt_llm::{ToolCallPart, Usage};
use futures::Stream;
use tokio_stream::StreamExt;

use crate::error::Error;
use crate::types::ChunkEvent;

/// Terminal state of a decoded turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    fn from_wire(raw: &str) -> Self {
        match raw {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// The merged result of one streamed turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub content: String,
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCallPart>,
    pub finish_reason: FinishReason,
    pub usage: Option<Usage>,
}

/// Optional callbacks fired as tokens arrive. All are no-ops by default.
#[derive(Default)]
pub struct DecodeCallbacks<'a> {
    pub on_token: Option<&'a mut dyn FnMut(&str)>,
    pub on_reasoning: Option<&'a mut dyn FnMut(&str)>,
    pub on_usage: Option<&'a mut dyn FnMut(&Usage)>,
}

/// In-flight tool-call builder, keyed by stream index. Take-once semantics
/// for `id`/`name` (only set while `None`); `arguments` is a simple
/// concatenation buffer — argument fragments only become valid JSON once
/// fully assembled.
#[derive(Default, Debug)]
struct ToolCallBuilder {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Decode one turn from a stream of SSE `data:` payload strings (the
/// `[DONE]` sentinel and blank-line skipping has already been handled by the
/// caller — see `http::data_lines`).
///
/// `idle_timeout` bounds how long the decoder waits for the next event once
/// progress (any content byte, or a `finish_reason`) has been observed. An
/// idle period before any progress is a hard error.
pub async fn decode<S>(
    mut events: S,
    idle_timeout: Option<Duration>,
    mut callbacks: DecodeCallbacks<'_>,
) -> Result<TurnResult, Error>
where
    S: Stream<Item = Result<String, Error>> + Unpin,
{
    let idle_timeout = idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT);

    let mut content = String::new();
    let mut reasoning = String::new();
    let mut usage: Option<Usage> = None;
    let mut finish_reason: Option<FinishReason> = None;
    let mut builders: BTreeMap<usize, ToolCallBuilder> = BTreeMap::new();
    let mut made_progress = false;

    loop {
        let next = tokio::time::timeout(idle_timeout, events.next()).await;

        let payload = match next {
            Ok(Some(payload)) => payload?,
            Ok(None) => break, // stream closed cleanly
            Err(_elapsed) => {
                if made_progress {
                    tracing::debug!("stream went idle after progress; treating as end-of-stream");
                    break;
                } else {
                    return Err(Error::from(agnt_llm::Error::IdleTimeout));
                }
            }
        };

        if payload.trim().is_empty() {
            continue;
        }
        if payload.trim() == "[DONE]" {
            break;
        }

        let event: ChunkEvent = serde_json::from_str(&payload)?;

        if event.choices.is_empty() {
            if let Some(u) = event.usage {
                let u: Usage = u.into();
                if let Some(cb) = callbacks.on_usage.as_deref_mut() {
                    cb(&u);
                }
                usage = Some(u);
            }
            continue;
        }

        let choice = &event.choices[0];

        if let Some(raw) = &choice.finish_reason {
            finish_reason = Some(FinishReason::from_wire(raw));
            made_progress = true;
            // Keep reading: trailing usage-only events may still follow.
        }

        if let Some(delta) = &choice.delta.content {
            content.push_str(delta);
            made_progress = true;
            if let Some(cb) = callbacks.on_token.as_deref_mut() {
                cb(delta);
            }
        }

        if let Some(delta) = &choice.delta.reasoning_content {
            reasoning.push_str(delta);
            if let Some(cb) = callbacks.on_reasoning.as_deref_mut() {
                cb(delta);
            }
        }

        for tc in &choice.delta.tool_calls {
            let builder = builders.entry(tc.index).or_default();
            if builder.id.is_none()
                && let Some(id) = &tc.id
            {
                builder.id = Some(id.clone());
            }
            if let Some(function) = &tc.function {
                if builder.name.is_none()
                    && let Some(name) = &function.name
                {
                    builder.name = Some(name.clone());
                }
                if let Some(arguments) = &function.arguments {
                    builder.arguments.push_str(arguments);
                }
            }
        }

        if let Some(u) = event.usage {
            let u: Usage = u.into();
            if let Some(cb) = callbacks.on_usage.as_deref_mut() {
                cb(&u);
            }
            usage = Some(u);
        }
    }

    let mut tool_calls = Vec::with_capacity(builders.len());
    for (_, builder) in builders {
        let id = builder
            .id
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        tool_calls.push(ToolCallPart {
            id,
            name: builder.name.unwrap_or_default(),
            arguments: builder.arguments,
        });
    }

    Ok(TurnResult {
        content,
        reasoning: if reasoning.is_empty() {
            None
        } else {
            Some(reasoning)
        },
        tool_calls,
        finish_reason: finish_reason.unwrap_or(FinishReason::Stop),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn events(payloads: Vec<&str>) -> impl Stream<Item = Result<String, Error>> + Unpin {
        stream::iter(payloads.into_iter().map(|p| Ok(p.to_string())))
    }

    #[tokio::test]
    async fn merges_tool_call_argument_fragments_across_events() {
        let stream = events(vec![
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"c1","function":{"name":"write_file","arguments":"{\"path\":"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"x\"}"}}]}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
            "[DONE]",
        ]);

        let result = decode(stream, None, DecodeCallbacks::default()).await.unwrap();
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].id, "c1");
        assert_eq!(result.tool_calls[0].name, "write_file");
        assert_eq!(result.tool_calls[0].arguments, r#"{"path":"x"}"#);
        assert_eq!(result.finish_reason, FinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn id_and_name_are_take_once() {
        let stream = events(vec![
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"first","function":{"name":"a"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"second","function":{"name":"b","arguments":"{}"}}]}}]}"#,
            "[DONE]",
        ]);
        let result = decode(stream, None, DecodeCallbacks::default()).await.unwrap();
        assert_eq!(result.tool_calls[0].id, "first");
        assert_eq!(result.tool_calls[0].name, "a");
        assert_eq!(result.tool_calls[0].arguments, "{}");
    }

    #[tokio::test]
    async fn accumulates_content_and_reasoning_deltas() {
        let stream = events(vec![
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            r#"{"choices":[{"delta":{"reasoning_content":"thinking"}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]);
        let result = decode(stream, None, DecodeCallbacks::default()).await.unwrap();
        assert_eq!(result.content, "Hello");
        assert_eq!(result.reasoning.as_deref(), Some("thinking"));
        assert_eq!(result.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn trailing_usage_only_event_after_choices_is_surfaced() {
        let stream = events(vec![
            r#"{"choices":[{"delta":{"content":"hi"},"finish_reason":"stop"}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#,
            "[DONE]",
        ]);
        let result = decode(stream, None, DecodeCallbacks::default()).await.unwrap();
        assert_eq!(result.usage.unwrap().total_tokens, 12);
    }

    #[tokio::test]
    async fn empty_lines_are_ignored() {
        let stream = events(vec![
            "",
            r#"{"choices":[{"delta":{"content":"x"},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]);
        let result = decode(stream, None, DecodeCallbacks::default()).await.unwrap();
        assert_eq!(result.content, "x");
    }

    #[tokio::test]
    async fn stream_ends_without_done_after_finish_reason_terminates_on_idle() {
        let stream = events(vec![r#"{"choices":[{"delta":{"content":"x"},"finish_reason":"stop"}]}"#]);
        let result = decode(stream, Some(Duration::from_millis(20)), DecodeCallbacks::default())
            .await
            .unwrap();
        assert_eq!(result.content, "x");
        assert_eq!(result.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn idle_before_any_progress_is_a_hard_error() {
        // A stream that never yields anything within the idle window, and
        // never closes, must error rather than return an empty result.
        let pending = stream::pending::<Result<String, Error>>();
        let result = decode(pending, Some(Duration::from_millis(10)), DecodeCallbacks::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn callbacks_fire_for_each_delta() {
        let mut tokens = Vec::new();
        let mut reasonings = Vec::new();
        let stream = events(vec![
            r#"{"choices":[{"delta":{"content":"a"}}]}"#,
            r#"{"choices":[{"delta":{"content":"b"}}]}"#,
            r#"{"choices":[{"delta":{"reasoning_content":"r"}}]}"#,
            "[DONE]",
        ]);
        let mut on_token = |t: &str| tokens.push(t.to_string());
        let mut on_reasoning = |t: &str| reasonings.push(t.to_string());
        let callbacks = DecodeCallbacks {
            on_token: Some(&mut on_token),
            on_reasoning: Some(&mut on_reasoning),
            on_usage: None,
        };
        decode(stream, None, callbacks).await.unwrap();
        assert_eq!(tokens, vec!["a", "b"]);
        assert_eq!(reasonings, vec!["r"]);
    }
}
