pub mod describe;
pub mod error;
pub mod request;
pub mod usage;

pub use describe::Describe;
pub use error::Error;
pub use request::{
    AssistantPart, GenerateOptions, GenerateRequest, ImagePart, Message, Property, ReasoningPart,
    RequestBuilder, Schema, TextPart, ToolCallPart, ToolChoice, ToolDefinition, ToolResultPart,
    UserPart, request,
};
pub use usage::Usage;
