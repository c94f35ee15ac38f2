//! Mock storefront tool system
//!
//! Tools expose the static storefront data to the pipeline behind a common
//! interface: `describe()` returns a JSON-Schema parameter object,
//! `execute(parameters)` runs the lookup. Parameters are validated against
//! the schema before execution. All lookups fail softly: "no match" is an
//! empty result, never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::store::Storefront;

pub mod builtin;

/// Tool interface
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns JSON-serializable structure with a JSON Schema parameter object
    fn describe(&self) -> ToolDescription;

    /// Receives an optional configuration dictionary; called once at startup
    async fn initialize(&mut self, config: Option<&Value>) -> Result<(), ToolError>;

    /// Receives parameters matching the schema from describe()
    /// Parameters MUST be validated against the schema before execution
    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError>;
}

/// Tool description
#[derive(Debug, Clone)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry that owns the storefront tools and validates invocations
pub struct ToolSystem {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolSystem {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build the full builtin tool set over a shared storefront
    pub async fn with_builtin_tools(store: Arc<Storefront>) -> Result<Self, ToolError> {
        let mut system = Self::new();

        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(builtin::ProductSearchTool::new(store.clone())),
            Box::new(builtin::SizeRecommenderTool::new()),
            Box::new(builtin::DeliveryEstimateTool::new(store.clone())),
            Box::new(builtin::OrderLookupTool::new(store.clone())),
            Box::new(builtin::OrderCancelTool::new(store)),
        ];

        for mut tool in tools {
            tool.initialize(None).await?;
            system.register(tool);
        }

        Ok(system)
    }

    /// Register a tool under its described name
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.describe().name, tool);
    }

    /// Get tool description
    pub fn describe_tool(&self, tool_name: &str) -> Option<ToolDescription> {
        self.tools.get(tool_name).map(|tool| tool.describe())
    }

    /// Execute tool with validated parameters
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: &Value,
    ) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        self.validate_parameters(tool_name, parameters)?;

        tool.execute(parameters).await
    }

    /// Validate parameters against the tool schema
    fn validate_parameters(&self, tool_name: &str, parameters: &Value) -> Result<(), ToolError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let description = tool.describe();
        let validator = jsonschema::validator_for(&description.parameters)
            .map_err(|e| ToolError::SchemaError(format!("Schema compilation error: {e}")))?;

        validator.validate(parameters).map_err(|errors| {
            let error_messages: Vec<String> = errors
                .map(|e| format!("At '{}': {}", e.instance_path, e))
                .collect();
            ToolError::ValidationError(error_messages.join("; "))
        })
    }

    /// Get list of available tools
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool system errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Tool initialization failed: {0}")]
    InitializationError(String),
    #[error("Parameter validation failed: {0}")]
    ValidationError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}
