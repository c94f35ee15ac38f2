//! Error types for the support-agent pipeline
//!
//! Pipeline outcomes that read as "nothing found" or "policy blocked" are
//! normal results, not errors. These types cover the remaining failure
//! surface: bad configuration, malformed data files, invalid tool
//! parameters, and LLM transport problems.

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("LLM provider error: {message}")]
    LlmError { message: String },

    #[error("Tool execution failed: {message}")]
    ToolExecutionFailed { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Tool error: {0}")]
    ToolError(#[from] crate::tools::ToolError),

    #[error("Storefront data error: {0}")]
    StoreError(#[from] crate::store::StoreError),
}

impl AgentError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create LLM error
    pub fn llm_error<S: Into<String>>(message: S) -> Self {
        Self::LlmError {
            message: message.into(),
        }
    }

    /// Create tool execution error
    pub fn tool_execution_failed<S: Into<String>>(message: S) -> Self {
        Self::ToolExecutionFailed {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<crate::llm::provider::LlmError> for AgentError {
    fn from(e: crate::llm::provider::LlmError) -> Self {
        Self::LlmError {
            message: e.to_string(),
        }
    }
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
