//! PolicyGuard node - cancellation window check
//!
//! Third node in the pipeline. Only acts on order-help runs: checks the
//! looked-up order's age against the 60-minute cancellation window through
//! the `order_cancel` tool and records a structured decision. A block is a
//! normal outcome, not an error; it carries the three standard
//! alternatives for the Responder to offer.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, Instrument};

use crate::clock::Clock;
use crate::error::{AgentError, AgentResult};
use crate::observability::metrics::metrics;
use crate::pipeline::state::{Intent, PolicyDecision, RunState};
use crate::tools::ToolSystem;

/// PolicyGuard node
pub struct PolicyGuard {
    tools: Arc<ToolSystem>,
    clock: Clock,
}

impl PolicyGuard {
    pub fn new(tools: Arc<ToolSystem>, clock: Clock) -> Self {
        Self { tools, clock }
    }

    /// Evaluate the cancellation policy and record the decision
    pub async fn run(&self, state: &mut RunState) -> AgentResult<()> {
        if state.intent != Some(Intent::OrderHelp) {
            state.record_node("policy_guard", json!({"skipped": true}));
            return Ok(());
        }

        let order_id = state
            .order
            .as_ref()
            .and_then(|o| o["order_id"].as_str())
            .map(|s| s.to_string());

        let decision = match order_id {
            None => PolicyDecision::not_verified("order_not_found_or_missing_credentials"),
            Some(order_id) => {
                let now = self.clock.now().to_rfc3339();

                state.tools_called.push("order_cancel".to_string());
                let result = self
                    .tools
                    .execute_tool("order_cancel", &json!({"order_id": order_id, "now": now}))
                    .instrument(crate::tool_span!(tool = "order_cancel"))
                    .await
                    .map_err(AgentError::from)?;
                metrics().record_tool_execution();

                let reason = result["reason"].as_str().unwrap_or_default().to_string();
                if result["cancel_allowed"].as_bool().unwrap_or(false) {
                    PolicyDecision::allowed(reason)
                } else {
                    PolicyDecision::blocked(reason)
                }
            }
        };

        debug!(
            cancel_allowed = decision.cancel_allowed,
            reason = %decision.reason,
            "Cancellation policy evaluated"
        );
        metrics().record_policy_outcome(decision.cancel_allowed);
        state.record_node(
            "policy_guard",
            json!({
                "cancel_allowed": decision.cancel_allowed,
                "reason": decision.reason,
            }),
        );
        state.policy_decision = Some(decision);

        Ok(())
    }
}
