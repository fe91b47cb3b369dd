//! Task decomposition: a fixed-prompt completion asking the
//! model for a JSON plan, parsed leniently and falling back to a
//! single-subtask plan on any failure.

use std::future::Future;

use chrono::Utc;
use serde::Deserialize;

use agnt_llm::request::{request, Message};
use agnt_stream::{stream_once, DecodeCallbacks, ProviderConfig};

use crate::plan::{Subtask, TaskPlan};

const DECOMPOSE_SYSTEM_PROMPT: &str = "You break a coding request into an ordered set of \
subtasks that can be worked on independently where possible. Respond with a single JSON \
object: {\"summary\": string, \"subtasks\": [{\"id\": string, \"description\": string, \
\"taskType\": \"implementation\"|\"research\"|\"testing\"|\"review\"|\"documentation\", \
\"complexity\": \"simple\"|\"medium\"|\"complex\"|\"very_complex\", \"dependencies\": [string]}], \
\"recommendedAgentCount\": number, \"parallelizationStrategy\": string, \"riskAssessment\": \
string}. Respond with JSON only, no commentary.";

pub trait DecompositionModel: Send + Sync {
    fn complete(&self, model: &str, prompt: &str) -> impl Future<Output = std::result::Result<String, agnt_stream::Error>>;
}

pub struct StreamDecompositionModel {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl StreamDecompositionModel {
    pub fn new(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

impl DecompositionModel for StreamDecompositionModel {
    async fn complete(&self, model: &str, prompt: &str) -> std::result::Result<String, agnt_stream::Error> {
        let generate_request = request()
            .model(model)
            .messages(vec![Message::system(DECOMPOSE_SYSTEM_PROMPT), Message::user(prompt)])
            .build();
        let turn = stream_once(&self.client, &self.config, &generate_request, false, DecodeCallbacks::default()).await?;
        Ok(turn.content)
    }
}

/// Decomposes `original_request` into a plan. Prefers `thinking_model_name`
/// when one is registered, falling back to `model_name` when it's `None` or
/// empty.
pub async fn decompose<D: DecompositionModel>(
    original_request: &str,
    codebase_hints: Option<&str>,
    model_name: &str,
    thinking_model_name: Option<&str>,
    model: &D,
) -> TaskPlan {
    let prompt = match codebase_hints {
        Some(hints) => format!("{original_request}\n\nRelevant codebase context:\n{hints}"),
        None => original_request.to_string(),
    };

    let selected_model = thinking_model_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(model_name);

    let raw = match model.complete(selected_model, &prompt).await {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(%error, "decomposition request failed, falling back to a single subtask");
            return TaskPlan::degenerate(original_request);
        }
    };

    let Some(json) = extract_json(&raw) else {
        tracing::warn!("decomposition response had no parseable JSON plan");
        return TaskPlan::degenerate(original_request);
    };

    match parse_plan(json, original_request) {
        Ok(plan) => plan,
        Err(error) => {
            tracing::warn!(%error, "decomposition response did not match the plan schema");
            TaskPlan::degenerate(original_request)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecompositionResponse {
    summary: Option<String>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
    #[serde(default)]
    recommended_agent_count: Option<u32>,
    #[serde(default)]
    parallelization_strategy: Option<String>,
    #[serde(default)]
    risk_assessment: Option<String>,
}

fn parse_plan(json: &str, original_request: &str) -> serde_json::Result<TaskPlan> {
    let response: DecompositionResponse = serde_json::from_str(json)?;
    let subtasks = if response.subtasks.is_empty() {
        vec![Subtask::new(format!("subtask-{}", uuid::Uuid::new_v4()), original_request.to_string())]
    } else {
        response.subtasks
    };
    Ok(TaskPlan {
        task_id: format!("task-{}", uuid::Uuid::new_v4()),
        original_request: original_request.to_string(),
        summary: response.summary.unwrap_or_else(|| original_request.to_string()),
        recommended_agent_count: response.recommended_agent_count.unwrap_or(1).max(1),
        parallelization_strategy: response.parallelization_strategy.unwrap_or_else(|| "sequential".to_string()),
        risk_assessment: response.risk_assessment.unwrap_or_else(|| "unknown".to_string()),
        subtasks,
        created_at: Utc::now(),
    })
}

/// Pulls a JSON object out of free-form model output: a ```json fence, then
/// a bare ``` fence, then the largest balanced `{...}` span in the text.
pub fn extract_json(text: &str) -> Option<&str> {
    extract_fenced(text, "```json")
        .or_else(|| extract_fenced(text, "```"))
        .or_else(|| extract_largest_balanced_object(text))
}

fn extract_fenced<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let candidate = rest[..end].trim();
    candidate.starts_with('{').then_some(candidate)
}

fn extract_largest_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = find_balanced_end(text, i) {
                if best.map(|(s, e)| end - i > e - s).unwrap_or(true) {
                    best = Some((i, end));
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    best.map(|(start, end)| &text[start..end])
}

fn find_balanced_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = start;
    while i < bytes.len() {
        let byte = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else {
            match byte {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(&'static str);
    impl DecompositionModel for FixedModel {
        async fn complete(&self, _model: &str, _prompt: &str) -> std::result::Result<String, agnt_stream::Error> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;
    impl DecompositionModel for FailingModel {
        async fn complete(&self, _model: &str, _prompt: &str) -> std::result::Result<String, agnt_stream::Error> {
            Err(agnt_stream::Error::Sse("connection reset".to_string()))
        }
    }

    /// Records which `model` it was called with, so tests can assert on
    /// thinking-model selection without a real completion backend.
    struct RecordingModel {
        response: &'static str,
        seen_model: std::sync::Mutex<Option<String>>,
    }
    impl RecordingModel {
        fn new(response: &'static str) -> Self {
            Self { response, seen_model: std::sync::Mutex::new(None) }
        }
    }
    impl DecompositionModel for RecordingModel {
        async fn complete(&self, model: &str, _prompt: &str) -> std::result::Result<String, agnt_stream::Error> {
            *self.seen_model.lock().unwrap() = Some(model.to_string());
            Ok(self.response.to_string())
        }
    }

    #[test]
    fn extracts_json_from_a_fenced_block() {
        let text = "Here is the plan:\n```json\n{\"summary\": \"s\", \"subtasks\": []}\n```\nDone.";
        assert_eq!(extract_json(text), Some("{\"summary\": \"s\", \"subtasks\": []}"));
    }

    #[test]
    fn extracts_the_largest_balanced_object_when_unfenced() {
        let text = "note: {\"a\": 1} then the real one {\"summary\": \"s\", \"subtasks\": [{\"nested\": true}]}";
        let extracted = extract_json(text).unwrap();
        assert!(extracted.contains("subtasks"));
    }

    #[tokio::test]
    async fn well_formed_response_produces_a_matching_plan() {
        let model = FixedModel(
            r#"{"summary": "add auth", "subtasks": [{"id": "s1", "description": "add middleware", "taskType": "implementation"}], "recommendedAgentCount": 2}"#,
        );
        let plan = decompose("add auth to the api", None, "gpt", None, &model).await;
        assert_eq!(plan.summary, "add auth");
        assert_eq!(plan.subtasks.len(), 1);
        assert_eq!(plan.recommended_agent_count, 2);
    }

    #[tokio::test]
    async fn unparseable_response_degenerates_to_a_single_subtask() {
        let model = FixedModel("sorry, I can't help with that");
        let plan = decompose("do something", None, "gpt", None, &model).await;
        assert_eq!(plan.subtasks.len(), 1);
        assert_eq!(plan.subtasks[0].description, "do something");
    }

    #[tokio::test]
    async fn a_failed_request_degenerates_to_a_single_subtask() {
        let plan = decompose("do something", None, "gpt", None, &FailingModel).await;
        assert_eq!(plan.subtasks.len(), 1);
    }

    #[tokio::test]
    async fn prefers_the_thinking_model_when_one_is_registered() {
        let model = RecordingModel::new(r#"{"summary": "s", "subtasks": []}"#);
        decompose("do something", None, "gpt-fast", Some("gpt-thinking"), &model).await;
        assert_eq!(model.seen_model.lock().unwrap().as_deref(), Some("gpt-thinking"));
    }

    #[tokio::test]
    async fn falls_back_to_the_caller_model_when_no_thinking_model_is_registered() {
        let model = RecordingModel::new(r#"{"summary": "s", "subtasks": []}"#);
        decompose("do something", None, "gpt-fast", None, &model).await;
        assert_eq!(model.seen_model.lock().unwrap().as_deref(), Some("gpt-fast"));
    }

    #[tokio::test]
    async fn falls_back_to_the_caller_model_when_the_thinking_model_is_empty() {
        let model = RecordingModel::new(r#"{"summary": "s", "subtasks": []}"#);
        decompose("do something", None, "gpt-fast", Some(""), &model).await;
        assert_eq!(model.seen_model.lock().unwrap().as_deref(), Some("gpt-fast"));
    }
}
