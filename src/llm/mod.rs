//! LLM provider integrations
//!
//! The pipeline optionally classifies intent and composes replies through
//! an LLM. Providers implement a common trait over plain HTTP; when no key
//! is configured the pipeline never touches this module.

pub mod provider;
pub mod providers;

pub use provider::{
    CompletionRequest, CompletionResponse, FinishReason, JsonSchemaDefinition, LlmError,
    LlmProvider, Message, MessageRole, ResponseFormat, TokenUsage,
};
