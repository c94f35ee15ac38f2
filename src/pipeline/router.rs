//! Router node - intent classification
//!
//! First node in the pipeline. Classifies the user message into one of the
//! supported intents through an `IntentClassifier` strategy chosen at
//! configuration time: an LLM-backed classifier when a key is configured,
//! deterministic keyword rules otherwise. A failing LLM call degrades to
//! the keyword rules for the run; there is no error path beyond
//! "unclassifiable → other".

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AgentResult;
use crate::llm::provider::{
    CompletionRequest, JsonSchemaDefinition, LlmProvider, Message, MessageRole, ResponseFormat,
};
use crate::observability::metrics::metrics;
use crate::pipeline::schema::{parse_intent_label, IntentOutput};
use crate::pipeline::state::{Intent, RunState};

/// Intent classification strategy
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Strategy name recorded in the trace
    fn name(&self) -> &str;

    /// Classify a user message
    async fn classify(&self, message: &str) -> AgentResult<Intent>;
}

/// Keyword phrases that mark an order-help request; checked first so
/// "cancel order" beats the product vocabulary
const ORDER_KEYWORDS: &[&str] = &[
    "cancel order",
    "order status",
    "order help",
    "where is my order",
    "order ",
    "refund",
];

/// Keyword fragments that mark a product-assist request
const PRODUCT_KEYWORDS: &[&str] = &["dress", "product", "wedding", "midi", "size", "eta", "zip"];

/// Deterministic keyword classifier
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Keyword rule (pure function)
    pub fn classify_text(message: &str) -> Intent {
        let lower = message.to_lowercase();
        if ORDER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Intent::OrderHelp
        } else if PRODUCT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Intent::ProductAssist
        } else {
            Intent::Other
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, message: &str) -> AgentResult<Intent> {
        Ok(Self::classify_text(message))
    }
}

/// LLM-backed classifier
///
/// Requests structured JSON output from providers that support it and
/// falls back to substring parsing of the completion text otherwise.
pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    temperature: f32,
}

impl LlmClassifier {
    /// Create a new LLM-backed classifier
    pub fn new(provider: Arc<dyn LlmProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
            temperature: 0.1, // Low temperature for consistent routing
        }
    }

    /// Create classifier with custom temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the classification request with provider-specific output format
    fn build_request(&self, message: &str) -> CompletionRequest {
        let mut request = CompletionRequest {
            messages: vec![
                Message {
                    role: MessageRole::System,
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: MessageRole::User,
                    content: format!(
                        "Classify the user message into one of: product_assist, order_help, other\n\nUser message:\n{message}"
                    ),
                },
            ],
            model: self.model.clone(),
            max_tokens: Some(200),
            temperature: Some(self.temperature),
            top_p: None,
            stop_sequences: None,
            response_format: None,
            metadata: HashMap::new(),
        };

        if self.provider.name() == "openai" {
            request.response_format = Some(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaDefinition {
                    name: "intent_classification".to_string(),
                    strict: Some(true),
                    schema: IntentOutput::json_schema(),
                },
            });
        }

        request
    }

    /// Parse the completion into an intent (pure function)
    fn parse_completion(content: &str) -> Intent {
        if let Ok(output) = serde_json::from_str::<IntentOutput>(content) {
            return output.resolve_intent();
        }
        parse_intent_label(content)
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(&self, message: &str) -> AgentResult<Intent> {
        metrics().record_llm_call();
        let request = self.build_request(message);
        let response = self.provider.complete(request).await?;

        let content = response.content.unwrap_or_default();
        if content.is_empty() {
            return Err(crate::error::AgentError::llm_error(
                "Empty classification completion",
            ));
        }

        debug!(completion = %content, "Intent classification completion");
        Ok(Self::parse_completion(&content))
    }
}

/// Router node
pub struct Router {
    classifier: Box<dyn IntentClassifier>,
}

impl Router {
    pub fn new(classifier: Box<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }

    /// Classify the message and record the decision
    pub async fn run(&self, state: &mut RunState) {
        let (intent, strategy) = match self.classifier.classify(&state.user_message).await {
            Ok(intent) => (intent, self.classifier.name().to_string()),
            Err(e) => {
                warn!(error = %e, "Classifier failed, degrading to keyword rules");
                metrics().record_llm_fallback();
                (
                    KeywordClassifier::classify_text(&state.user_message),
                    format!("{}+keyword_fallback", self.classifier.name()),
                )
            }
        };

        state.intent = Some(intent);
        metrics().record_intent(intent);
        state.record_node(
            "router",
            json!({
                "intent": intent.as_str(),
                "strategy": strategy,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockLlmProvider;

    #[test]
    fn test_keyword_rules_order_help() {
        for message in [
            "Cancel order A1003 — email mira@example.com.",
            "where is my order?",
            "I want a refund",
            "Order A1002 status please",
        ] {
            assert_eq!(KeywordClassifier::classify_text(message), Intent::OrderHelp);
        }
    }

    #[test]
    fn test_keyword_rules_product_assist() {
        for message in [
            "Wedding guest, midi, under $120",
            "What size should I take?",
            "ETA to 560001?",
        ] {
            assert_eq!(
                KeywordClassifier::classify_text(message),
                Intent::ProductAssist
            );
        }
    }

    #[test]
    fn test_keyword_rules_other() {
        assert_eq!(
            KeywordClassifier::classify_text("Can you give me a discount code that doesn't exist?"),
            Intent::Other
        );
    }

    #[test]
    fn test_order_keywords_beat_product_keywords() {
        // Mentions "size" but cancellation wins
        assert_eq!(
            KeywordClassifier::classify_text("cancel order A1003, wrong size"),
            Intent::OrderHelp
        );
    }

    #[test]
    fn test_parse_structured_completion() {
        let content = r#"{"intent": "product_assist", "reasoning": "asks about dresses"}"#;
        assert_eq!(
            LlmClassifier::parse_completion(content),
            Intent::ProductAssist
        );
    }

    #[test]
    fn test_parse_free_text_completion() {
        assert_eq!(
            LlmClassifier::parse_completion("I would say order_help here."),
            Intent::OrderHelp
        );
        assert_eq!(LlmClassifier::parse_completion("no idea"), Intent::Other);
    }

    #[tokio::test]
    async fn test_llm_classifier_classifies_via_provider() {
        let provider = Arc::new(MockLlmProvider::single_response(
            r#"{"intent": "order_help", "reasoning": "cancellation request"}"#,
        ));
        let classifier = LlmClassifier::new(
            provider,
            "mock-model".to_string(),
            "Be concise.".to_string(),
        );

        let intent = classifier.classify("Cancel order A1003").await.unwrap();
        assert_eq!(intent, Intent::OrderHelp);
    }

    #[tokio::test]
    async fn test_router_records_intent_and_strategy() {
        let router = Router::new(Box::new(KeywordClassifier::new()));
        let mut state = RunState::new("Wedding guest, midi, under $120");

        router.run(&mut state).await;

        assert_eq!(state.intent, Some(Intent::ProductAssist));
        let entry = &state.trace_entries()[0];
        assert_eq!(entry.node, "router");
        assert_eq!(entry.detail["strategy"], "keyword");
    }

    #[tokio::test]
    async fn test_router_degrades_to_keywords_on_llm_failure() {
        let provider = Arc::new(MockLlmProvider::with_failure());
        let classifier = LlmClassifier::new(
            provider,
            "mock-model".to_string(),
            "Be concise.".to_string(),
        );
        let router = Router::new(Box::new(classifier));
        let mut state = RunState::new("Cancel order A1003 — email mira@example.com.");

        router.run(&mut state).await;

        assert_eq!(state.intent, Some(Intent::OrderHelp));
        let entry = &state.trace_entries()[0];
        assert_eq!(entry.detail["strategy"], "llm+keyword_fallback");
    }
}
