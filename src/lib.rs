//! Shopagent - demonstration customer-support agent
//!
//! A four-node directed pipeline (Router → ToolSelector → PolicyGuard →
//! Responder) that optionally calls an LLM API, with a deterministic
//! rule-based fallback when no API key is configured. It resolves two user
//! intents (product suggestion and order cancellation) against static
//! mock storefront data and a hardcoded 60-minute cancellation policy.
//!
//! # Overview
//!
//! This crate provides:
//! - The linear pipeline executor with per-node trace logging
//! - Dual execution strategies (LLM vs deterministic rules) behind
//!   configuration-time trait selection
//! - A mock storefront tool system with JSON Schema parameter validation
//! - OpenAI and Gemini provider backends over plain HTTP
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shopagent::config::AgentConfig;
//! use shopagent::pipeline::Pipeline;
//! use shopagent::store::Storefront;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> shopagent::error::AgentResult<()> {
//! let config = AgentConfig::from_env()?;
//! let store = Arc::new(Storefront::load(
//!     Path::new(&config.catalog.products_path),
//!     Path::new(&config.catalog.orders_path),
//! )?);
//!
//! // No provider: the pipeline runs the deterministic fallback strategy
//! let pipeline = Pipeline::assemble(&config, store, None).await?;
//! let report = pipeline
//!     .run("Wedding guest, midi, under $120 — ETA to 560001?")
//!     .await?;
//!
//! println!("{}", serde_json::to_string_pretty(&report.trace).unwrap());
//! println!("{}", report.reply);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod tools;

pub use clock::Clock;
pub use config::{AgentConfig, ExecutionMode};
pub use error::{AgentError, AgentResult};
pub use pipeline::{Pipeline, RunReport};
pub use store::{Order, Product, Storefront};
pub use tools::{Tool, ToolDescription, ToolError, ToolSystem};
