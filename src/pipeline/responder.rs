//! Responder node - final reply composition
//!
//! Last node in the pipeline. Renders the accumulated run state into the
//! user-facing reply through a `ReplyComposer` strategy chosen at
//! configuration time: an LLM completion over the serialized run context,
//! or fixed templates per intent and outcome. A failing or empty LLM
//! completion degrades to the templates for the run.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AgentError, AgentResult};
use crate::llm::provider::{CompletionRequest, LlmProvider, Message, MessageRole};
use crate::observability::metrics::metrics;
use crate::pipeline::state::{Intent, PolicyAlternative, RunState};

/// Reply composition strategy
#[async_trait]
pub trait ReplyComposer: Send + Sync {
    /// Strategy name recorded in the trace
    fn name(&self) -> &str;

    /// Compose the final reply from the accumulated run state
    async fn compose(&self, state: &RunState) -> AgentResult<String>;
}

/// Deterministic template composer
#[derive(Debug, Clone, Default)]
pub struct TemplateComposer;

impl TemplateComposer {
    pub fn new() -> Self {
        Self
    }

    /// Render the reply templates (pure function)
    pub fn compose_text(state: &RunState) -> String {
        match state.intent.unwrap_or(Intent::Other) {
            Intent::ProductAssist => Self::compose_product_assist(state),
            Intent::OrderHelp => Self::compose_order_help(state),
            Intent::Other => Self::compose_guardrail(),
        }
    }

    fn compose_product_assist(state: &RunState) -> String {
        if state.products.is_empty() {
            return "I couldn't find items that match your filters. If you can relax the \
                    budget or tags, I can search again."
                .to_string();
        }

        let lines: Vec<String> = state
            .products
            .iter()
            .map(|p| {
                let sizes: Vec<&str> = p["sizes"]
                    .as_array()
                    .map(|s| s.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                format!(
                    "• {} — ${} | sizes: {}",
                    p["name"].as_str().unwrap_or("unknown"),
                    format_price(p["price"].as_f64().unwrap_or(0.0)),
                    sizes.join(", ")
                )
            })
            .collect();

        let size = state.size.clone().unwrap_or_default();
        let recommended = size["recommended"].as_str().unwrap_or("M").to_string();
        let rationale = size["rationale"].as_str().unwrap_or("").to_string();

        let eta = state.eta.clone().unwrap_or_default();
        let zip = eta["zip"].as_str().unwrap_or("your area").to_string();
        let window = eta["eta_window"]
            .as_str()
            .unwrap_or("2–5 business days")
            .to_string();

        format!(
            "Here are two options under your budget:\n{}\n\nSize tip: go **{}**. {}\nETA to {}: {}.",
            lines.join("\n"),
            recommended,
            rationale,
            zip,
            window
        )
    }

    fn compose_order_help(state: &RunState) -> String {
        let order = match &state.order {
            Some(order) => order,
            None => {
                return "I couldn't verify that order. Please double-check the order ID and \
                        email, or I can hand you to support."
                    .to_string()
            }
        };
        let order_id = order["order_id"].as_str().unwrap_or("unknown");

        match &state.policy_decision {
            Some(decision) if decision.cancel_allowed => format!(
                "Order {order_id} is cancelled successfully. You'll see a confirmation \
                 email shortly."
            ),
            Some(decision) => {
                let options: Vec<String> = decision
                    .alternatives
                    .iter()
                    .map(|alt| format!("• {}", alternative_line(*alt)))
                    .collect();
                format!(
                    "I can't cancel order {} because our policy allows cancellations only \
                     within 60 minutes of purchase ({}).\nNext best options:\n{}",
                    order_id,
                    decision.reason,
                    options.join("\n")
                )
            }
            None => format!("Order {order_id} was found, but no policy decision was recorded."),
        }
    }

    fn compose_guardrail() -> String {
        "I can't generate custom discount codes. You can still save by:\n\
         • Joining our newsletter for first-order perks\n\
         • Watching seasonal sales on the site\n\
         • Building a wishlist so we alert you if prices drop"
            .to_string()
    }
}

/// Human-readable line for a blocked-cancellation alternative
fn alternative_line(alt: PolicyAlternative) -> &'static str {
    match alt {
        PolicyAlternative::EditAddress => {
            "Edit the delivery address (if the carrier hasn't picked it up)"
        }
        PolicyAlternative::StoreCredit => "Convert to store credit after delivery",
        PolicyAlternative::SupportHandoff => "Or I can hand you off to a human agent",
    }
}

/// Format a price the way the catalog shows it ($89, $89.50)
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{price:.2}")
    }
}

#[async_trait]
impl ReplyComposer for TemplateComposer {
    fn name(&self) -> &str {
        "template"
    }

    async fn compose(&self, state: &RunState) -> AgentResult<String> {
        Ok(Self::compose_text(state))
    }
}

/// LLM-backed composer
///
/// The completion prompt embeds the serialized run context; the model is
/// told to use only those fields so the reply never invents facts.
pub struct LlmComposer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
            temperature: 0.2,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Serialize the run context handed to the model (pure function)
    fn build_context(state: &RunState) -> String {
        let context = json!({
            "intent": state.intent.map(|i| i.as_str()),
            "evidence": state.evidence,
            "policy_decision": state.policy_decision,
            "products": state.products,
            "size": state.size,
            "eta": state.eta,
            "order": state.order,
        });
        serde_json::to_string_pretty(&context).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_request(&self, state: &RunState) -> CompletionRequest {
        let instruction = "Compose the final user reply. Do not invent facts; only use \
                           fields in context. If product_assist: list up to 2 items with \
                           name, price, sizes; give size tip and ETA. If order_help and \
                           cancel_allowed: confirm cancellation. If blocked: explain the \
                           60-minute policy and offer at least two alternatives. If other: \
                           refuse discount code creation and suggest perks.";

        CompletionRequest {
            messages: vec![
                Message {
                    role: MessageRole::System,
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: MessageRole::User,
                    content: format!(
                        "{instruction}\n\nContext:\n{}",
                        Self::build_context(state)
                    ),
                },
            ],
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            top_p: None,
            stop_sequences: None,
            response_format: None,
            metadata: HashMap::new(),
        }
    }
}

#[async_trait]
impl ReplyComposer for LlmComposer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn compose(&self, state: &RunState) -> AgentResult<String> {
        metrics().record_llm_call();
        let request = self.build_request(state);
        let response = self.provider.complete(request).await?;

        let content = response.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AgentError::llm_error("Empty reply completion"));
        }
        Ok(content)
    }
}

/// Responder node
pub struct Responder {
    composer: Box<dyn ReplyComposer>,
}

impl Responder {
    pub fn new(composer: Box<dyn ReplyComposer>) -> Self {
        Self { composer }
    }

    /// Compose the reply and record the decision
    pub async fn run(&self, state: &mut RunState) {
        let (reply, strategy) = match self.composer.compose(state).await {
            Ok(reply) => (reply, self.composer.name().to_string()),
            Err(e) => {
                warn!(error = %e, "Composer failed, degrading to templates");
                metrics().record_llm_fallback();
                (
                    TemplateComposer::compose_text(state),
                    format!("{}+template_fallback", self.composer.name()),
                )
            }
        };

        state.record_node("responder", json!({"strategy": strategy}));
        state.final_reply = Some(reply);
    }
}
