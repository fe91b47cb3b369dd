use std::collections::HashMap;

use agnt_llm::ToolDefinition;

use crate::risk::{RiskClass, ToolCategory};
use crate::tool::{ErasedTool, Tool};

/// Static, name-keyed table of registered tools. Each name maps to exactly
/// one risk-class and one category; registration happens at startup and the
/// registry is read-only thereafter.
#[derive(Default)]
pub struct ToolRegistry {
    entries: HashMap<String, Box<dyn ErasedTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool) -> &mut Self {
        self.entries.insert(tool.name().to_string(), Box::new(tool));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn risk_class(&self, name: &str) -> Option<RiskClass> {
        self.entries.get(name).map(|t| t.risk_class())
    }

    pub fn category(&self, name: &str) -> Option<ToolCategory> {
        self.entries.get(name).map(|t| t.category())
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.values().map(|t| t.definition()).collect()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&dyn ErasedTool> {
        self.entries.get(name).map(|t| t.as_ref())
    }
}
