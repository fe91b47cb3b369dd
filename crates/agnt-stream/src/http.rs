//! The one concrete transport the streaming decoder is handed in practice: a
//! `POST .../chat/completions` with `stream: true`. General HTTP/TLS
//! concerns (retries, connection pooling tuning, auth schemes beyond a
//! bearer token) are intentionally out of scope — this stays thin, firing
//! the request and handing the SSE body to the decoder.

use std::collections::HashMap;
use std::time::Duration;

use agnt_llm::request::{GenerateRequest, Message, ToolChoice, UserPart};
use eventsource_stream::Eventsource;
use tokio_stream::StreamExt;

use crate::decoder::{decode, DecodeCallbacks, TurnResult};
use crate::error::Error;

/// Connection details for the upstream chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub auth_token: String,
    pub extra_headers: HashMap<String, String>,
    pub idle_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            auth_token: String::new(),
            extra_headers: HashMap::new(),
            idle_timeout: Duration::from_secs(5),
        }
    }
}

/// Fire the request and decode the response in one call. `vision_capable`
/// controls whether the message list is shaped with flattened image parts
/// before serialization.
pub async fn stream_once(
    client: &reqwest::Client,
    config: &ProviderConfig,
    request: &GenerateRequest,
    vision_capable: bool,
    callbacks: DecodeCallbacks<'_>,
) -> Result<TurnResult, Error> {
    let body = to_wire_request(request, vision_capable);

    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let mut req = client
        .post(&url)
        .bearer_auth(&config.auth_token)
        .json(&body);
    for (k, v) in &config.extra_headers {
        req = req.header(k, v);
    }

    let resp = req
        .send()
        .await
        .map_err(|e| Error::Http(Box::new(e)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(Error::Sse(format!("http {status}: {text}")));
    }

    let lines = resp
        .bytes_stream()
        .eventsource()
        .map(|event| match event {
            Ok(event) => Ok(event.data),
            Err(e) => Err(Error::Sse(e.to_string())),
        });

    decode(lines, Some(config.idle_timeout), callbacks).await
}

// ---------------------------------------------------------------------------
// Wire request shaping
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    stream_options: WireStreamOptions,
}

#[derive(serde::Serialize)]
struct WireStreamOptions {
    include_usage: bool,
}

#[derive(serde::Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(serde::Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum WireMessage {
    Simple {
        role: &'static str,
        content: String,
    },
    Assistant {
        role: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<WireToolCall>,
    },
    Tool {
        role: &'static str,
        tool_call_id: String,
        content: String,
    },
    Multimodal {
        role: &'static str,
        content: Vec<serde_json::Value>,
    },
}

#[derive(serde::Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolCallFunction,
}

#[derive(serde::Serialize)]
struct WireToolCallFunction {
    name: String,
    arguments: String,
}

/// Shape messages for the wire, flattening multimodal parts to text when the
/// active model lacks vision support. The original message
/// list passed in is never mutated — only the serialized body differs.
fn to_wire_request(request: &GenerateRequest, vision_capable: bool) -> serde_json::Value {
    let messages = request
        .messages
        .iter()
        .map(|m| to_wire_message(m, vision_capable))
        .collect::<Vec<_>>();

    let tools = request
        .tools
        .iter()
        .map(|t| WireTool {
            kind: "function",
            function: WireFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.to_json_schema(),
            },
        })
        .collect();

    let tool_choice = match &request.options.tool_choice {
        ToolChoice::Auto => None,
        ToolChoice::None => Some(serde_json::json!("none")),
        ToolChoice::Required => Some(serde_json::json!("required")),
        ToolChoice::Tool(name) => Some(serde_json::json!({
            "type": "function",
            "function": { "name": name },
        })),
    };

    let wire = WireRequest {
        model: request.model.clone(),
        messages,
        tools,
        tool_choice,
        temperature: request.options.temperature,
        max_tokens: request.options.max_tokens,
        stream: true,
        stream_options: WireStreamOptions { include_usage: true },
    };

    serde_json::to_value(wire).expect("WireRequest always serializes")
}

fn to_wire_message(message: &Message, vision_capable: bool) -> WireMessage {
    match message {
        Message::System { content } => WireMessage::Simple {
            role: "system",
            content: content.clone(),
        },
        Message::User { parts } => {
            if vision_capable && parts.iter().any(|p| matches!(p, UserPart::Image(_))) {
                let content = parts
                    .iter()
                    .map(|p| match p {
                        UserPart::Text(t) => serde_json::json!({"type": "text", "text": t.text}),
                        UserPart::Image(img) => serde_json::json!({
                            "type": "image_url",
                            "image_url": { "url": img.url },
                        }),
                    })
                    .collect();
                WireMessage::Multimodal {
                    role: "user",
                    content,
                }
            } else {
                let text = parts
                    .iter()
                    .map(|p| match p {
                        UserPart::Text(t) => t.text.clone(),
                        UserPart::Image(_) => "[An image was shared here]\n".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("");
                WireMessage::Simple {
                    role: "user",
                    content: text,
                }
            }
        }
        Message::Assistant {
            content,
            tool_calls,
            ..
        } => WireMessage::Assistant {
            role: "assistant",
            content: content.clone(),
            tool_calls: tool_calls
                .iter()
                .map(|tc| WireToolCall {
                    id: tc.id.clone(),
                    kind: "function",
                    function: WireToolCallFunction {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect(),
        },
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => WireMessage::Tool {
            role: "tool",
            tool_call_id: tool_call_id.clone(),
            content: content.clone(),
        },
    }
}
