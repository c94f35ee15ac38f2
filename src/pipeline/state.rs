//! Run state carried through the pipeline
//!
//! One `RunState` is created per user message, mutated by each node in
//! sequence, and discarded after the reply is emitted. Fields are only
//! appended to, never rolled back; the trace entry log mirrors node
//! execution order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Classification label for the user request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductAssist,
    OrderHelp,
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ProductAssist => "product_assist",
            Intent::OrderHelp => "order_help",
            Intent::Other => "other",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery offered when a cancellation is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAlternative {
    EditAddress,
    StoreCredit,
    SupportHandoff,
}

/// The alternatives offered with every blocked cancellation, in order
pub const BLOCKED_ALTERNATIVES: [PolicyAlternative; 3] = [
    PolicyAlternative::EditAddress,
    PolicyAlternative::StoreCredit,
    PolicyAlternative::SupportHandoff,
];

/// Outcome of the cancellation-policy check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub cancel_allowed: bool,
    pub reason: String,
    /// Empty when the cancellation is allowed
    #[serde(default)]
    pub alternatives: Vec<PolicyAlternative>,
}

impl PolicyDecision {
    /// Allowed decision
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self {
            cancel_allowed: true,
            reason: reason.into(),
            alternatives: Vec::new(),
        }
    }

    /// Blocked decision carrying the standard alternatives
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            cancel_allowed: false,
            reason: reason.into(),
            alternatives: BLOCKED_ALTERNATIVES.to_vec(),
        }
    }

    /// Blocked decision without alternatives (order could not be verified)
    pub fn not_verified(reason: impl Into<String>) -> Self {
        Self {
            cancel_allowed: false,
            reason: reason.into(),
            alternatives: Vec::new(),
        }
    }
}

/// One entry in the per-node decision log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub node: String,
    pub detail: Value,
}

/// Transient pipeline state for a single run
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: Uuid,
    pub user_message: String,
    pub intent: Option<Intent>,
    pub tools_called: Vec<String>,
    pub evidence: Vec<Value>,
    /// Working fields filled by the ToolSelector
    pub products: Vec<Value>,
    pub size: Option<Value>,
    pub eta: Option<Value>,
    pub order: Option<Value>,
    pub order_id: Option<String>,
    pub email: Option<String>,
    pub policy_decision: Option<PolicyDecision>,
    pub final_reply: Option<String>,
    trace_entries: Vec<TraceEntry>,
}

impl RunState {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            user_message: user_message.into(),
            intent: None,
            tools_called: Vec::new(),
            evidence: Vec::new(),
            products: Vec::new(),
            size: None,
            eta: None,
            order: None,
            order_id: None,
            email: None,
            policy_decision: None,
            final_reply: None,
            trace_entries: Vec::new(),
        }
    }

    /// Append a node decision to the trace log (append-only)
    pub fn record_node(&mut self, node: impl Into<String>, detail: Value) {
        self.trace_entries.push(TraceEntry {
            node: node.into(),
            detail,
        });
    }

    pub fn trace_entries(&self) -> &[TraceEntry] {
        &self.trace_entries
    }

    /// Render the trace object emitted alongside the reply
    pub fn trace_report(&self) -> Value {
        serde_json::json!({
            "run_id": self.run_id,
            "intent": self.intent.map(|i| i.as_str()),
            "tools_called": self.tools_called,
            "evidence": self.evidence,
            "policy_decision": self.policy_decision,
            "nodes": self.trace_entries,
            "final_message": self.final_reply.as_deref().unwrap_or(""),
        })
    }
}
