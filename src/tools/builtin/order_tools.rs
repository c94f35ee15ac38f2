//! Order-side tools: lookup and simulated cancellation

use crate::store::Storefront;
use crate::tools::{Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

/// Cancellation window in minutes
pub const CANCEL_WINDOW_MIN: i64 = 60;

/// Order lookup tool
///
/// Requires an exact, case-insensitive match on BOTH order id and email.
/// Any mismatch yields `found: false`.
pub struct OrderLookupTool {
    store: Arc<Storefront>,
}

impl OrderLookupTool {
    pub fn new(store: Arc<Storefront>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for OrderLookupTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "order_lookup".to_string(),
            description: "Look up an order by order id and account email".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string"},
                    "email": {"type": "string"}
                },
                "required": ["order_id", "email"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let order_id = parameters["order_id"].as_str().unwrap_or_default();
        let email = parameters["email"].as_str().unwrap_or_default();

        match self.store.find_order(order_id, email) {
            Some(order) => {
                let order_json = serde_json::to_value(order)
                    .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
                Ok(json!({"found": true, "order": order_json}))
            }
            None => Ok(json!({"found": false, "order": null})),
        }
    }
}

/// Simulated order cancellation tool
///
/// Evaluates the cancellation window against an explicit `now` timestamp so
/// policy checks stay deterministic under a frozen clock. Nothing is
/// mutated; the order book is read-only.
pub struct OrderCancelTool {
    store: Arc<Storefront>,
}

impl OrderCancelTool {
    pub fn new(store: Arc<Storefront>) -> Self {
        Self { store }
    }

    /// Window rule (pure function): allowed iff the order is at most
    /// `CANCEL_WINDOW_MIN` minutes old.
    fn evaluate(created_at: DateTime<Utc>, now: DateTime<Utc>) -> (bool, String, f64) {
        let age_min = (now - created_at).num_seconds() as f64 / 60.0;
        if age_min <= CANCEL_WINDOW_MIN as f64 + 1e-9 {
            (true, format!("within_60_min ({age_min:.1} min)"), age_min)
        } else {
            (false, format!(">60 min ({age_min:.1} min)"), age_min)
        }
    }
}

#[async_trait]
impl Tool for OrderCancelTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "order_cancel".to_string(),
            description: "Check whether an order can still be cancelled and simulate it"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string"},
                    "now": {"type": "string"}
                },
                "required": ["order_id", "now"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let order_id = parameters["order_id"].as_str().unwrap_or_default();
        let now_raw = parameters["now"].as_str().unwrap_or_default();
        let now = DateTime::parse_from_rfc3339(now_raw)
            .map_err(|e| ToolError::ExecutionError(format!("Invalid 'now' timestamp: {e}")))?
            .with_timezone(&Utc);

        let order = match self.store.order_by_id(order_id) {
            Some(order) => order,
            None => {
                return Ok(json!({
                    "cancel_allowed": false,
                    "reason": "order_not_found"
                }))
            }
        };

        let (cancel_allowed, reason, age_min) = Self::evaluate(order.created_at, now);
        Ok(json!({
            "cancel_allowed": cancel_allowed,
            "reason": reason,
            "age_minutes": age_min
        }))
    }
}
