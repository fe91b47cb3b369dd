use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reusable part types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePart {
    /// Base64-encoded image data or a data/http URL, provider-dependent.
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A tool call emitted by the assistant. `arguments` is the raw JSON object
/// text as assembled by the streaming decoder — see agnt-stream — not yet
/// parsed, since the agent loop is the one that knows each tool's input type.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolCallPart {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// A chunk of chain-of-thought the model produced before its answer.
/// Reasoning from prior turns is dropped once a new user turn begins (see
/// agnt-agent), since most providers don't consider it valid context for
/// turns other than the one it was produced in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReasoningPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPart {
    pub tool_call_id: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Role-specific part enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserPart {
    Text(TextPart),
    Image(ImagePart),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantPart {
    Text(TextPart),
    Reasoning(ReasoningPart),
    ToolCall(ToolCallPart),
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One turn of the conversation.
///
/// Invariants: a `Tool` message's `tool_call_id` must reference
/// an id from a preceding `Assistant` message's tool-call list; an
/// `Assistant` message may carry both `content` and `tool_calls` together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System { content: String },
    User { parts: Vec<UserPart> },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        reasoning_content: Option<String>,
        #[serde(default)]
        tool_calls: Vec<ToolCallPart>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Message::System {
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User {
            parts: vec![UserPart::Text(TextPart { text: text.into() })],
        }
    }

    pub fn user_with_image(text: impl Into<String>, image: ImagePart) -> Self {
        Message::User {
            parts: vec![
                UserPart::Text(TextPart { text: text.into() }),
                UserPart::Image(image),
            ],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(text.into()),
            reasoning_content: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(
        content: Option<String>,
        reasoning_content: Option<String>,
        tool_calls: Vec<ToolCallPart>,
    ) -> Self {
        Message::Assistant {
            content,
            reasoning_content,
            tool_calls,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Whether this message carries any tool calls (only assistant messages can).
    pub fn tool_calls(&self) -> &[ToolCallPart] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant { .. })
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }

    /// Clear reasoning content, as done at the start of a new user turn.
    pub fn clear_reasoning(&mut self) {
        if let Message::Assistant {
            reasoning_content, ..
        } = self
        {
            *reasoning_content = None;
        }
    }

    /// Best-effort plain-text rendering, used by the context-window
    /// summarizer's transcript builder.
    pub fn plain_text(&self) -> String {
        match self {
            Message::System { content } => content.clone(),
            Message::User { parts } => parts
                .iter()
                .map(|p| match p {
                    UserPart::Text(t) => t.text.clone(),
                    UserPart::Image(_) => "[An image was shared here]".to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Message::Assistant { content, .. } => content.clone().unwrap_or_default(),
            Message::Tool { content, .. } => content.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// A tool definition as presented to the model.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Schema,
}

/// Controls how the model selects tools.
#[derive(Debug, Clone, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
    /// Force calling a specific tool by name.
    Tool(String),
}

// ---------------------------------------------------------------------------
// Top-level request
// ---------------------------------------------------------------------------

/// A request to generate a language model response.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerateOptions,
    /// Provider-specific metadata, passed through to the transport as-is.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Knobs that control generation behavior.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
    pub tool_choice: ToolChoice,
    pub stream: bool,
    pub include_usage: bool,
}

/// Fluent builder for [`GenerateRequest`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    inner: GenerateRequest,
}

impl RequestBuilder {
    pub fn model(&mut self, model: impl Into<String>) -> &mut Self {
        self.inner.model = model.into();
        self
    }

    pub fn system(&mut self, text: impl Into<String>) -> &mut Self {
        self.inner.messages.push(Message::system(text));
        self
    }

    pub fn messages(&mut self, messages: Vec<Message>) -> &mut Self {
        self.inner.messages = messages;
        self
    }

    pub fn tools(&mut self, tools: Vec<ToolDefinition>) -> &mut Self {
        self.inner.tools = tools;
        self
    }

    pub fn temperature(&mut self, value: f32) -> &mut Self {
        self.inner.options.temperature = Some(value);
        self
    }

    pub fn max_tokens(&mut self, value: u32) -> &mut Self {
        self.inner.options.max_tokens = Some(value);
        self
    }

    pub fn stream(&mut self, value: bool) -> &mut Self {
        self.inner.options.stream = value;
        self
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> &mut Self {
        self.inner.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(&mut self) -> GenerateRequest {
        std::mem::take(&mut self.inner)
    }
}

pub fn request() -> RequestBuilder {
    RequestBuilder::default()
}

// ---------------------------------------------------------------------------
// Schema descriptor — Rust-native, converts to JSON Schema downstream
// ---------------------------------------------------------------------------

/// A Rust-native description of a value's shape, convertible to JSON Schema.
#[derive(Debug, Clone)]
pub enum Schema {
    String {
        description: Option<String>,
        enumeration: Option<Vec<String>>,
    },
    Number {
        description: Option<String>,
    },
    Integer {
        description: Option<String>,
    },
    Boolean {
        description: Option<String>,
    },
    Array {
        description: Option<String>,
        items: Box<Schema>,
    },
    Object {
        description: Option<String>,
        properties: Vec<Property>,
        required: Vec<String>,
    },
    /// Escape hatch: a literal JSON Schema value for cases we don't cover.
    Raw(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
}

impl Schema {
    /// Convert to a JSON Schema `serde_json::Value`.
    pub fn to_json_schema(&self) -> serde_json::Value {
        match self {
            Schema::String {
                description,
                enumeration,
            } => {
                let mut obj = serde_json::json!({ "type": "string" });
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                if let Some(e) = enumeration {
                    obj["enum"] = serde_json::json!(e);
                }
                obj
            }
            Schema::Number { description } => {
                let mut obj = serde_json::json!({ "type": "number" });
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                obj
            }
            Schema::Integer { description } => {
                let mut obj = serde_json::json!({ "type": "integer" });
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                obj
            }
            Schema::Boolean { description } => {
                let mut obj = serde_json::json!({ "type": "boolean" });
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                obj
            }
            Schema::Array { description, items } => {
                let mut obj = serde_json::json!({
                    "type": "array",
                    "items": items.to_json_schema(),
                });
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                obj
            }
            Schema::Object {
                description,
                properties,
                required,
            } => {
                let props: serde_json::Map<String, serde_json::Value> = properties
                    .iter()
                    .map(|p| (p.name.clone(), p.schema.to_json_schema()))
                    .collect();
                let mut obj = serde_json::json!({
                    "type": "object",
                    "properties": props,
                });
                if !required.is_empty() {
                    obj["required"] = serde_json::json!(required);
                }
                if let Some(d) = description {
                    obj["description"] = serde_json::json!(d);
                }
                obj
            }
            Schema::Raw(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_references_assistant_message() {
        let assistant = Message::assistant_with_tool_calls(
            None,
            None,
            vec![ToolCallPart {
                id: "call_1".into(),
                name: "read_file".into(),
                arguments: "{}".into(),
            }],
        );
        let tool_call_id = &assistant.tool_calls()[0].id;
        let result = Message::tool_result(tool_call_id.clone(), "read_file", "ok");
        match result {
            Message::Tool { tool_call_id, .. } => assert_eq!(tool_call_id, "call_1"),
            _ => panic!("expected tool message"),
        }
    }

    #[test]
    fn clear_reasoning_only_touches_assistant_messages() {
        let mut msg = Message::assistant_with_tool_calls(
            Some("hi".into()),
            Some("thinking...".into()),
            Vec::new(),
        );
        msg.clear_reasoning();
        match msg {
            Message::Assistant {
                reasoning_content, ..
            } => assert!(reasoning_content.is_none()),
            _ => panic!(),
        }
    }

    #[test]
    fn object_schema_round_trips_required_fields() {
        let schema = Schema::Object {
            description: Some("input".into()),
            properties: vec![Property {
                name: "path".into(),
                schema: Schema::String {
                    description: None,
                    enumeration: None,
                },
            }],
            required: vec!["path".into()],
        };
        let json = schema.to_json_schema();
        assert_eq!(json["required"][0], "path");
        assert_eq!(json["properties"]["path"]["type"], "string");
    }
}
