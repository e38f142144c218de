//! Tool registry resolved at startup.
//!
//! The [`ToolRegistry`] maps tool names to [`Tool`] implementations, exports
//! their schemas for the intent classifier and executes function calls.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::intent::FunctionCall;
use crate::session::SessionContext;

use super::types::{ActionOutcome, DispatchMode, Tool};

/// Registry of callable tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch mode of a tool, if registered.
    pub fn dispatch_mode(&self, name: &str) -> Option<DispatchMode> {
        self.tools.get(name).map(|t| t.dispatch_mode())
    }

    /// Export function schemas for all tools, sorted by name.
    ///
    /// Each entry is `{"type": "function", "function": {name, description, parameters}}`.
    pub fn schemas_for_api(&self) -> Vec<serde_json::Value> {
        let mut schemas: Vec<(String, serde_json::Value)> = self
            .tools
            .values()
            .map(|t| {
                let entry = serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema(),
                    }
                });
                (t.name().to_string(), entry)
            })
            .collect();
        schemas.sort_by(|a, b| a.0.cmp(&b.0));
        schemas.into_iter().map(|(_, v)| v).collect()
    }

    /// Execute a function call.
    ///
    /// An unknown tool yields [`ActionOutcome::NotFound`] with a spoken message.
    ///
    /// # Errors
    ///
    /// Returns an error when the arguments are not valid JSON or the tool fails.
    pub async fn handle_function_call(
        &self,
        session: &SessionContext,
        call: &FunctionCall,
    ) -> Result<ActionOutcome> {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!(parent: session.span(), tool = %call.name, "function call for unknown tool");
            return Ok(ActionOutcome::not_found(format!(
                "没有找到对应的功能：{}",
                call.name
            )));
        };
        let args = call.arguments_value()?;
        tool.invoke(session, args).await
    }
}
