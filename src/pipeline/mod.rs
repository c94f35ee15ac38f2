//! Four-stage support pipeline
//!
//! Implements the fixed linear sequence over one run state:
//! 1. Router - classify the message intent
//! 2. ToolSelector - dispatch mock tools for the intent
//! 3. PolicyGuard - check the cancellation window
//! 4. Responder - compose the reply and render the trace
//!
//! Control flows strictly forward; there is no branching back and no
//! parallelism. Each invocation is independent and stateless across calls.

use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use crate::clock::Clock;
use crate::config::AgentConfig;
use crate::error::AgentResult;
use crate::llm::provider::LlmProvider;
use crate::observability::metrics::metrics;
use crate::stage_span;
use crate::store::Storefront;
use crate::tools::ToolSystem;

pub mod policy_guard;
pub mod responder;
pub mod router;
pub mod schema;
pub mod state;
pub mod tool_selector;

pub use policy_guard::PolicyGuard;
pub use responder::{LlmComposer, ReplyComposer, Responder, TemplateComposer};
pub use router::{IntentClassifier, KeywordClassifier, LlmClassifier, Router};
pub use state::{
    Intent, PolicyAlternative, PolicyDecision, RunState, TraceEntry, BLOCKED_ALTERNATIVES,
};
pub use tool_selector::{ToolSelector, MAX_PICKS};

/// Result of one pipeline run: the trace object and the reply text
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trace: Value,
    pub reply: String,
}

/// The four-node pipeline
pub struct Pipeline {
    router: Router,
    tool_selector: ToolSelector,
    policy_guard: PolicyGuard,
    responder: Responder,
}

impl Pipeline {
    /// Create a pipeline from pre-built nodes
    pub fn new(
        router: Router,
        tool_selector: ToolSelector,
        policy_guard: PolicyGuard,
        responder: Responder,
    ) -> Self {
        Self {
            router,
            tool_selector,
            policy_guard,
            responder,
        }
    }

    /// Assemble a pipeline from configuration and injected dependencies
    ///
    /// The execution strategy is fixed here, once: with a provider the
    /// Router and Responder go through the LLM, without one they use the
    /// deterministic keyword rules and templates. Nodes never re-check.
    pub async fn assemble(
        config: &AgentConfig,
        store: Arc<Storefront>,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> AgentResult<Self> {
        let tools = Arc::new(ToolSystem::with_builtin_tools(store).await?);
        let clock = Clock::from_override(config.now_override);

        let (classifier, composer): (Box<dyn IntentClassifier>, Box<dyn ReplyComposer>) =
            match provider {
                Some(provider) => {
                    let classifier = LlmClassifier::new(
                        provider.clone(),
                        config.llm.model.clone(),
                        config.llm.system_prompt.clone(),
                    );
                    let mut composer = LlmComposer::new(
                        provider,
                        config.llm.model.clone(),
                        config.llm.system_prompt.clone(),
                    )
                    .with_max_tokens(config.llm.max_tokens);
                    if let Some(temperature) = config.llm.temperature {
                        composer = composer.with_temperature(temperature);
                    }
                    (Box::new(classifier), Box::new(composer))
                }
                None => (
                    Box::new(KeywordClassifier::new()),
                    Box::new(TemplateComposer::new()),
                ),
            };

        Ok(Self::new(
            Router::new(classifier),
            ToolSelector::new(tools.clone()),
            PolicyGuard::new(tools, clock),
            Responder::new(composer),
        ))
    }

    /// Run one user message through the four nodes
    pub async fn run(&self, message: &str) -> AgentResult<RunReport> {
        metrics().record_run_started();
        let mut state = RunState::new(message);
        let run_id = state.run_id;

        self.router
            .run(&mut state)
            .instrument(stage_span!(stage = "router", run_id = %run_id))
            .await;

        self.tool_selector
            .run(&mut state)
            .instrument(stage_span!(stage = "tool_selector", run_id = %run_id))
            .await?;

        self.policy_guard
            .run(&mut state)
            .instrument(stage_span!(stage = "policy_guard", run_id = %run_id))
            .await?;

        self.responder
            .run(&mut state)
            .instrument(stage_span!(stage = "responder", run_id = %run_id))
            .await;

        metrics().record_run_completed();
        Ok(RunReport {
            trace: state.trace_report(),
            reply: state.final_reply.clone().unwrap_or_default(),
        })
    }
}
