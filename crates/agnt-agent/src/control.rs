//! The agent control loop: issues completions, classifies the
//! response, dispatches tool calls through the permission gate and executor,
//! manages the context window, and stops on completion, a final answer, or a
//! stall.

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use agnt_context::{compress_tool_result, manage_context, Summarizer, TokenTracker};
use agnt_llm::request::{request, ImagePart, Message};
use agnt_llm::Usage;
use agnt_models::ModelRegistry;
use agnt_permissions::{PermissionGate, PromptHandler};
use agnt_stream::{stream_once, DecodeCallbacks, FinishReason, ProviderConfig};
use agnt_tools::{execute as execute_tool, DEFAULT_TOOL_TIMEOUT, ToolRegistry};
use tokio_util::sync::CancellationToken;

use crate::classify::{detect_action_signal, has_completion_signal, ActionSignal};
use crate::error::Result;
use crate::inline::recover_inline_calls;
use crate::observer::LoopObserver;
use crate::stall::{is_failure_result, StallConfig, StallDetector, StallOutcome};

const CONTINUE_AFTER_ACTION_SIGNAL: &str =
    "Please proceed with the action you described. Make the appropriate tool call.";
const NO_PROGRESS_WARNING: &str =
    "You've repeated the same tool calls without making progress. Try a different approach.";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_iterations: u32,
    pub max_consecutive_failures: u32,
    pub no_progress_warn_at: u32,
    pub no_progress_hard_at: u32,
    pub tool_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        let stall_defaults = StallConfig::default();
        Self {
            max_iterations: stall_defaults.max_iterations,
            max_consecutive_failures: stall_defaults.max_consecutive_failures,
            no_progress_warn_at: stall_defaults.no_progress_warn_at,
            no_progress_hard_at: stall_defaults.no_progress_hard_at,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Drives `messages` through the reason/act loop until the assistant signals
/// completion, gives a final answer, or a stall detector trips. `messages`
/// is mutated in place and always ends self-consistent: every assistant
/// tool-call is followed by exactly one matching tool-role message.
#[allow(clippy::too_many_arguments)]
pub async fn complete_with_tools<H, S>(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    model: &str,
    messages: &mut Vec<Message>,
    tool_registry: &ToolRegistry,
    permission_gate: &PermissionGate<H>,
    model_registry: &ModelRegistry,
    tracker: &mut TokenTracker,
    summarizer: &S,
    repo_path: &Path,
    observer: &mut dyn LoopObserver,
    config: &LoopConfig,
    cancel: &CancellationToken,
) -> Result<String>
where
    H: PromptHandler,
    S: Summarizer,
{
    let mut stall = StallDetector::new(StallConfig {
        max_iterations: config.max_iterations,
        max_consecutive_failures: config.max_consecutive_failures,
        no_progress_warn_at: config.no_progress_warn_at,
        no_progress_hard_at: config.no_progress_hard_at,
    });

    let known_tool_names: Vec<String> = tool_registry
        .definitions()
        .into_iter()
        .map(|d| d.name)
        .collect();

    let mut iteration: u32 = 0;

    loop {
        iteration += 1;
        if stall.record_iteration() == StallOutcome::Stop {
            return Ok(stop_sentinel("the agent reached its iteration limit"));
        }
        observer.on_iteration(iteration);

        if messages.last().map(Message::is_user).unwrap_or(false) {
            for message in messages.iter_mut() {
                message.clear_reasoning();
            }
        }

        let owned = std::mem::take(messages);
        *messages = manage_context(tracker, owned, model, summarizer).await?;

        let vision_capable = model_registry.supports_vision(model);
        let generate_request = request()
            .model(model)
            .messages(messages.clone())
            .tools(tool_registry.definitions())
            .build();

        let observer_cell = RefCell::new(&mut *observer);
        let mut on_token = |delta: &str| observer_cell.borrow_mut().on_token(delta);
        let mut on_reasoning = |delta: &str| observer_cell.borrow_mut().on_reasoning(delta);
        let mut on_usage = |usage: &Usage| tracker.record(usage);
        let callbacks = DecodeCallbacks {
            on_token: Some(&mut on_token),
            on_reasoning: Some(&mut on_reasoning),
            on_usage: Some(&mut on_usage),
        };

        let turn = stream_once(client, provider, &generate_request, vision_capable, callbacks).await?;
        drop(observer_cell);

        if let Some(usage) = &turn.usage {
            if let Some(max) = usage.max_context_length.or(usage.context_length) {
                model_registry.update_context_length(model, max);
            }
        }

        if has_completion_signal(&turn.content) {
            return Ok(turn.content);
        }

        let (content_for_dispatch, tool_calls) = if !turn.tool_calls.is_empty() {
            (turn.content.clone(), turn.tool_calls.clone())
        } else {
            let (cleaned, recovered) = recover_inline_calls(&turn.content, &known_tool_names);
            if recovered.is_empty() {
                (turn.content.clone(), Vec::new())
            } else {
                observer.on_content_replace(&cleaned);
                let synthesized = recovered
                    .into_iter()
                    .map(|call| agnt_llm::ToolCallPart {
                        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                        name: call.name,
                        arguments: call.arguments,
                    })
                    .collect();
                (cleaned, synthesized)
            }
        };

        if tool_calls.is_empty() {
            match detect_action_signal(&turn.content) {
                ActionSignal::Strong | ActionSignal::Weak => {
                    messages.push(Message::assistant_with_tool_calls(
                        Some(turn.content.clone()),
                        turn.reasoning.clone(),
                        Vec::new(),
                    ));
                    messages.push(Message::user(CONTINUE_AFTER_ACTION_SIGNAL));
                    continue;
                }
                ActionSignal::None => {}
            }

            let final_text = if !turn.content.trim().is_empty() {
                turn.content.clone()
            } else if let Some(reasoning) = turn.reasoning.clone().filter(|r| !r.trim().is_empty()) {
                reasoning
            } else {
                "⚠️ The model returned an empty response.".to_string()
            };

            messages.push(Message::assistant_with_tool_calls(
                Some(turn.content.clone()),
                turn.reasoning.clone(),
                Vec::new(),
            ));
            return Ok(final_text);
        }

        messages.push(Message::assistant_with_tool_calls(
            if content_for_dispatch.trim().is_empty() {
                None
            } else {
                Some(content_for_dispatch)
            },
            turn.reasoning.clone(),
            tool_calls.clone(),
        ));

        let mut signatures = Vec::with_capacity(tool_calls.len());
        let mut any_failure_streak_tripped: Option<String> = None;

        for (dispatched, call) in tool_calls.iter().enumerate() {
            signatures.push(format!("{}:{}", call.name, call.arguments));

            let dispatched_result = dispatch_one_call(
                tool_registry,
                permission_gate,
                repo_path,
                &call.name,
                &call.arguments,
                cancel,
                config.tool_timeout,
                observer,
                &call.id,
            )
            .await;

            let result_json = match dispatched_result {
                Ok(result_json) => result_json,
                Err(error) if is_cancellation(&error) => {
                    // The in-flight call and every call after it never got a
                    // result. Leaving them unpaired would corrupt the
                    // message list for the next request, so synthesize a
                    // cancelled result for each before surfacing the error.
                    for call in &tool_calls[dispatched..] {
                        let cancelled = serde_json::json!({ "error": "Cancelled" }).to_string();
                        observer.on_tool_result(&call.id, &call.name, &cancelled);
                        messages.push(Message::tool_result(call.id.clone(), call.name.clone(), cancelled));
                    }
                    return Err(error);
                }
                Err(error) => return Err(error),
            };

            let compressed = compress_tool_result(&call.name, &result_json);

            if vision_capable {
                if let Some(image) = extract_screenshot(&compressed) {
                    messages.push(Message::user_with_image("", image));
                }
            }

            observer.on_tool_result(&call.id, &call.name, &compressed);
            messages.push(Message::tool_result(call.id.clone(), call.name.clone(), compressed.clone()));

            let failed = is_failure_result(&compressed);
            if stall.record_tool_result(&call.name, failed) == StallOutcome::Stop {
                any_failure_streak_tripped = Some(call.name.clone());
            }
        }

        if let Some(tool_name) = any_failure_streak_tripped {
            return Ok(stop_sentinel(&format!(
                "tool '{tool_name}' failed too many times in a row"
            )));
        }

        match stall.record_turn_signatures(&signatures) {
            StallOutcome::Stop => {
                return Ok(stop_sentinel("no progress was made across repeated tool calls"));
            }
            StallOutcome::Warn => {
                messages.push(Message::user(NO_PROGRESS_WARNING));
            }
            StallOutcome::Continue => {}
        }

        if turn.finish_reason == FinishReason::Length {
            tracing::warn!(model, "completion was truncated at the provider's length limit");
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn dispatch_one_call<H: PromptHandler>(
    tool_registry: &ToolRegistry,
    permission_gate: &PermissionGate<H>,
    repo_path: &Path,
    tool_name: &str,
    arguments: &str,
    cancel: &CancellationToken,
    timeout: Duration,
    observer: &mut dyn LoopObserver,
    call_id: &str,
) -> Result<String> {
    let Some(risk) = tool_registry.risk_class(tool_name) else {
        return Ok(serde_json::json!({ "error": format!("Unknown tool: {tool_name}") }).to_string());
    };
    let category = tool_registry.category(tool_name).unwrap_or(agnt_tools::ToolCategory::Ordinary);

    let granted = permission_gate.check(repo_path, tool_name, category, risk).await?;
    if !granted {
        return Ok(serde_json::json!({ "error": "Permission denied by user" }).to_string());
    }

    let call_id = call_id.to_string();
    let tool_name_owned = tool_name.to_string();
    let observer_cell = RefCell::new(observer);
    let result = execute_tool(tool_registry, tool_name, arguments, cancel, timeout, |status| {
        observer_cell.borrow_mut().on_tool_progress(&call_id, &tool_name_owned, status);
    })
    .await?;
    Ok(result)
}

fn extract_screenshot(result_json: &str) -> Option<ImagePart> {
    let value: serde_json::Value = serde_json::from_str(result_json).ok()?;
    if value.get("success") != Some(&serde_json::Value::Bool(true)) {
        return None;
    }
    let base64_data = value.get("base64_data")?.as_str()?;
    let mime_type = value.get("mime_type").and_then(|m| m.as_str()).unwrap_or("image/png");
    Some(ImagePart {
        url: format!("data:{mime_type};base64,{base64_data}"),
        mime_type: Some(mime_type.to_string()),
    })
}

fn is_cancellation(error: &crate::error::Error) -> bool {
    matches!(error, crate::error::Error::Tool(agnt_tools::Error::Cancelled))
}

fn stop_sentinel(reason: &str) -> String {
    format!("⛔ Stopping: {reason}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_sentinel_names_the_reason() {
        assert!(stop_sentinel("too many failures").contains("too many failures"));
    }

    #[test]
    fn is_cancellation_recognizes_the_tool_cancelled_variant() {
        let cancelled: crate::error::Error = agnt_tools::Error::Cancelled.into();
        assert!(is_cancellation(&cancelled));

        let unknown: crate::error::Error = agnt_tools::Error::UnknownTool("x".to_string()).into();
        assert!(!is_cancellation(&unknown));
    }

    #[test]
    fn extracts_screenshot_from_successful_result() {
        let json = r#"{"success": true, "base64_data": "abc123", "mime_type": "image/jpeg"}"#;
        let image = extract_screenshot(json).unwrap();
        assert_eq!(image.mime_type.as_deref(), Some("image/jpeg"));
        assert!(image.url.starts_with("data:image/jpeg;base64,abc123"));
    }

    #[test]
    fn no_screenshot_extracted_from_failed_result() {
        let json = r#"{"success": false, "error": "no display"}"#;
        assert!(extract_screenshot(json).is_none());
    }
}
