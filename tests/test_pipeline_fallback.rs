//! End-to-end tests for the deterministic fallback path
//!
//! Runs the four canned prompts through the assembled pipeline with no
//! LLM provider and checks the observable contract: a well-formed trace
//! object followed by non-empty reply text, nodes in execution order,
//! bounded product suggestions, and the exact policy outcomes.


use shopagent::pipeline::{Pipeline, RunReport};
use test_helpers::{storefront, test_config, DEMO_PROMPTS};

async fn run_fallback(prompt: &str, now: Option<&str>) -> RunReport {
    let mut config = test_config();
    if let Some(raw) = now {
        config = config.with_now_override(raw.parse().unwrap());
    }
    let pipeline = Pipeline::assemble(&config, storefront(), None)
        .await
        .unwrap();
    pipeline.run(prompt).await.unwrap()
}

fn assert_well_formed(report: &RunReport) {
    assert!(report.trace.is_object(), "trace must be a JSON object");
    assert!(report.trace["run_id"].is_string());
    assert!(report.trace["intent"].is_string());
    assert!(report.trace["tools_called"].is_array());
    assert!(report.trace["nodes"].is_array());
    assert!(!report.reply.is_empty(), "reply text must be non-empty");
    assert_eq!(report.trace["final_message"], report.reply.as_str());
}

// ========== Contract Shared by All Prompts ==========

#[tokio::test]
async fn test_all_demo_prompts_produce_trace_and_reply() {
    for prompt in DEMO_PROMPTS {
        let report = run_fallback(prompt, Some("2025-09-07T12:40:00Z")).await;
        assert_well_formed(&report);
    }
}

#[tokio::test]
async fn test_nodes_mirror_execution_order() {
    let report = run_fallback(DEMO_PROMPTS[0], None).await;

    let nodes: Vec<&str> = report.trace["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["node"].as_str().unwrap())
        .collect();
    assert_eq!(
        nodes,
        vec!["router", "tool_selector", "policy_guard", "responder"]
    );
}

// ========== Product Assist ==========

#[tokio::test]
async fn test_product_assist_trace_and_reply() {
    let report = run_fallback(DEMO_PROMPTS[0], None).await;

    assert_eq!(report.trace["intent"], "product_assist");
    assert_eq!(
        report.trace["tools_called"],
        serde_json::json!(["product_search", "size_recommender", "delivery_estimate"])
    );

    // Never more than 2 suggestions, never above the stated cap
    let evidence = report.trace["evidence"].as_array().unwrap();
    assert!(evidence.len() <= 2);
    for row in evidence {
        assert!(row["price"].as_f64().unwrap() <= 120.0);
    }

    assert!(report.reply.contains("Size tip"));
    assert!(report.reply.contains("ETA to 560001: 3–5 business days."));
}

#[tokio::test]
async fn test_product_assist_no_match_reply() {
    let report = run_fallback("Any wedding midi dress under $5?", None).await;

    assert_eq!(report.trace["intent"], "product_assist");
    assert_eq!(report.trace["evidence"].as_array().unwrap().len(), 0);
    assert!(report.reply.contains("couldn't find items"));
}

// ========== Order Help ==========

#[tokio::test]
async fn test_cancellation_allowed_within_window() {
    // A1003 placed at 12:00Z, cancelled at 12:40Z
    let report = run_fallback(DEMO_PROMPTS[1], Some("2025-09-07T12:40:00Z")).await;

    assert_eq!(report.trace["intent"], "order_help");
    assert_eq!(report.trace["policy_decision"]["cancel_allowed"], true);
    assert!(report.reply.contains("cancelled successfully"));
}

#[tokio::test]
async fn test_cancellation_blocked_past_window_offers_exactly_three_alternatives() {
    // A1002 placed at 13:05Z the day before, cancelled at 15:10Z
    let report = run_fallback(DEMO_PROMPTS[2], Some("2025-09-06T15:10:00Z")).await;

    assert_eq!(report.trace["policy_decision"]["cancel_allowed"], false);
    assert_eq!(
        report.trace["policy_decision"]["alternatives"],
        serde_json::json!(["edit_address", "store_credit", "support_handoff"])
    );
    assert!(report.reply.contains("within 60 minutes of purchase"));
    assert!(report.reply.contains("Edit the delivery address"));
    assert!(report.reply.contains("store credit"));
    assert!(report.reply.contains("human agent"));
}

#[tokio::test]
async fn test_order_lookup_requires_exact_match_on_both_fields() {
    // Right order id, wrong email
    let report = run_fallback(
        "Cancel order A1003 — email alex@example.com.",
        Some("2025-09-07T12:40:00Z"),
    )
    .await;

    assert_eq!(report.trace["evidence"][0]["found"], false);
    assert_eq!(report.trace["policy_decision"]["cancel_allowed"], false);
    assert_eq!(
        report.trace["policy_decision"]["reason"],
        "order_not_found_or_missing_credentials"
    );
    assert!(report.reply.contains("couldn't verify that order"));
}

#[tokio::test]
async fn test_order_help_with_missing_credentials() {
    let report = run_fallback("Please cancel order A1003", Some("2025-09-07T12:40:00Z")).await;

    assert_eq!(report.trace["intent"], "order_help");
    assert_eq!(report.trace["evidence"][0]["found"], false);
    assert!(report.reply.contains("couldn't verify that order"));
}

// ========== Guardrail ==========

#[tokio::test]
async fn test_guardrail_refuses_discount_codes() {
    let report = run_fallback(DEMO_PROMPTS[3], None).await;

    assert_eq!(report.trace["intent"], "other");
    assert_eq!(report.trace["tools_called"].as_array().unwrap().len(), 0);
    assert!(report.trace["policy_decision"].is_null());
    assert!(report.reply.contains("can't generate custom discount codes"));
}
