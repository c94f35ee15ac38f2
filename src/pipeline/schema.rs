//! Structured output schema for LLM intent classification
//!
//! Used with providers that support strict JSON output (OpenAI JSON
//! Schema). Providers without schema support return free text, which the
//! classifier falls back to parsing by substring.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pipeline::state::Intent;

/// Structured output for an intent classification call
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntentOutput {
    /// One of "product_assist", "order_help", "other"
    pub intent: String,
    /// Short reasoning for observability
    pub reasoning: String,
}

impl IntentOutput {
    /// Map the label to an intent, tolerating loose provider output
    ///
    /// Mirrors the free-text rule: anything mentioning "product" is product
    /// assistance, anything mentioning "order" is order help, the rest is
    /// other.
    pub fn resolve_intent(&self) -> Intent {
        parse_intent_label(&self.intent)
    }

    /// Generate the JSON schema for this structure
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(IntentOutput);
        serde_json::to_value(schema).expect("Schema should be serializable")
    }
}

/// Parse an intent label out of arbitrary completion text
pub fn parse_intent_label(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if lower.contains("product") {
        Intent::ProductAssist
    } else if lower.contains("order") {
        Intent::OrderHelp
    } else {
        Intent::Other
    }
}
