//! Retrieval tools exposed to the completion model.
//!
//! Each tool implements the [`Tool`] trait; the [`ToolManager`] owns the
//! catalog, dispatches by name, and aggregates the provenance sources the
//! tools record while executing.

pub mod outline;
pub mod search;

pub use outline::CourseOutlineTool;
pub use search::CourseSearchTool;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolDefinition;

/// Provenance record for content an answer drew upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub text: String,
    pub url: Option<String>,
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model named a tool absent from the catalog. This is a
    /// catalog/definition mismatch and is never converted into model-visible
    /// text.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool ran and failed. The loop reports this to the model as a
    /// tool-result string.
    #[error("{0}")]
    Execution(anyhow::Error),
}

/// A named capability the completion model may request.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    /// Run the tool against structured arguments, returning model-readable
    /// text.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;

    /// Sources recorded by the most recent execution.
    fn last_sources(&self) -> Vec<Source> {
        Vec::new()
    }

    /// Clear any recorded sources.
    fn reset_sources(&self) {}

    /// The definition advertised to the completion API.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Owns the tool catalog for one query: registration, dispatch-by-name, and
/// source aggregation across invocations.
#[derive(Default)]
pub struct ToolManager {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, Arc<dyn Tool>>,
    invoked: Mutex<Vec<String>>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.by_name.insert(name.clone(), tool.clone()).is_some() {
            tracing::warn!(tool = %name, "replacing previously registered tool");
            self.tools.retain(|existing| existing.name() != name);
        }
        self.tools.push(tool);
    }

    /// Definitions for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Dispatch by name.
    pub async fn execute_tool(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .by_name
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        {
            let mut invoked = self.invoked.lock().unwrap();
            if !invoked.iter().any(|invoked_name| invoked_name == name) {
                invoked.push(name.to_string());
            }
        }

        tool.execute(args).await.map_err(ToolError::Execution)
    }

    /// Sources recorded during the current query, concatenated in
    /// first-invocation order. Tools that were never invoked contribute
    /// nothing.
    pub fn last_sources(&self) -> Vec<Source> {
        let invoked = self.invoked.lock().unwrap();
        invoked
            .iter()
            .filter_map(|name| self.by_name.get(name))
            .flat_map(|tool| tool.last_sources())
            .collect()
    }

    /// Clear every tool's recorded sources, not just the aggregate view.
    pub fn reset_sources(&self) {
        self.invoked.lock().unwrap().clear();
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}
