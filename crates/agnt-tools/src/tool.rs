use std::future::Future;
use std::pin::Pin;

use agnt_llm::{Describe, ToolDefinition};
use serde::de::DeserializeOwned;

use crate::risk::{RiskClass, ToolCategory};

/// A callable tool with typed input. The result is always a JSON string —
/// even on failure, the tool itself produces `{"error": "..."}` rather than
/// returning a Rust error, so the model always gets something parseable
/// back.
///
/// `Tool` requires `Clone` so the erasure layer below can clone before
/// calling `call`, giving a `'static` future without borrowing `self`
/// across the await point.
pub trait Tool: Clone + Send + Sync + 'static {
    type Input: Describe + DeserializeOwned + Send;

    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn risk_class(&self) -> RiskClass;
    fn category(&self) -> ToolCategory;

    fn call(&self, input: Self::Input) -> impl Future<Output = String> + Send;
}

/// Object-safe, type-erased wrapper around a [`Tool`], keyed by name in the
/// [`crate::registry::ToolRegistry`].
pub(crate) trait ErasedTool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    fn risk_class(&self) -> RiskClass;
    fn category(&self) -> ToolCategory;
    fn call_erased(&self, arguments: &str) -> Pin<Box<dyn Future<Output = String> + Send>>;
}

impl<T: Tool> ErasedTool for T {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: T::Input::describe(),
        }
    }

    fn risk_class(&self) -> RiskClass {
        Tool::risk_class(self)
    }

    fn category(&self) -> ToolCategory {
        Tool::category(self)
    }

    fn call_erased(&self, arguments: &str) -> Pin<Box<dyn Future<Output = String> + Send>> {
        let parsed: Result<T::Input, serde_json::Error> = serde_json::from_str(arguments);
        let this = self.clone();
        Box::pin(async move {
            match parsed {
                Ok(input) => this.call(input).await,
                Err(e) => serde_json::json!({ "error": format!("invalid arguments: {e}") })
                    .to_string(),
            }
        })
    }
}
