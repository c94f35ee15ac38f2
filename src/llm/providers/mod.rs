//! Concrete LLM provider backends

pub mod gemini;
pub mod openai;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
