//! Thread-safe metrics collection system
//!
//! Provides atomic counters for tracking operational statistics across
//! pipeline runs, tool execution, and LLM usage. The collector is a
//! process-wide singleton; the CLI prints a snapshot after a demo run.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::state::Intent;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics
#[derive(Debug, Default)]
pub struct MetricsCollector {
    // Pipeline runs
    runs_started: AtomicU64,
    runs_completed: AtomicU64,

    // Intent distribution
    intents_product_assist: AtomicU64,
    intents_order_help: AtomicU64,
    intents_other: AtomicU64,

    // Tool and LLM activity
    tools_executed: AtomicU64,
    llm_calls: AtomicU64,
    llm_fallbacks: AtomicU64,

    // Policy outcomes
    policy_allowed: AtomicU64,
    policy_blocked: AtomicU64,
}

/// Serializable point-in-time view of the collector
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub intents_product_assist: u64,
    pub intents_order_help: u64,
    pub intents_other: u64,
    pub tools_executed: u64,
    pub llm_calls: u64,
    pub llm_fallbacks: u64,
    pub policy_allowed: u64,
    pub policy_blocked: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_intent(&self, intent: Intent) {
        let counter = match intent {
            Intent::ProductAssist => &self.intents_product_assist,
            Intent::OrderHelp => &self.intents_order_help,
            Intent::Other => &self.intents_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tool_execution(&self) {
        self.tools_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_llm_call(&self) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_llm_fallback(&self) {
        self.llm_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_policy_outcome(&self, cancel_allowed: bool) {
        if cancel_allowed {
            self.policy_allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.policy_blocked.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            intents_product_assist: self.intents_product_assist.load(Ordering::Relaxed),
            intents_order_help: self.intents_order_help.load(Ordering::Relaxed),
            intents_other: self.intents_other.load(Ordering::Relaxed),
            tools_executed: self.tools_executed.load(Ordering::Relaxed),
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            llm_fallbacks: self.llm_fallbacks.load(Ordering::Relaxed),
            policy_allowed: self.policy_allowed.load(Ordering::Relaxed),
            policy_blocked: self.policy_blocked.load(Ordering::Relaxed),
        }
    }
}
