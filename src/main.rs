//! Shopagent - Main Entry Point
//!
//! Runs the support pipeline from the command line: a fixed demo set of
//! four prompts, a single ad-hoc message, or configuration inspection.

use clap::{Parser, Subcommand};
use shopagent::config::{AgentConfig, ExecutionMode};
use shopagent::llm::provider::LlmProvider;
use shopagent::llm::providers::{GeminiConfig, GeminiProvider, OpenAiConfig, OpenAiProvider};
use shopagent::observability::{init_default_logging, metrics};
use shopagent::pipeline::Pipeline;
use shopagent::store::Storefront;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// Demonstration customer-support agent
#[derive(Parser)]
#[command(name = "shopagent")]
#[command(about = "Customer-support agent pipeline with LLM or rule-based execution")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the four sample prompts and print trace + reply for each
    Demo,
    /// Run a single message through the pipeline
    Ask {
        /// The user message
        #[arg(short, long)]
        message: String,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// One canned demo case; `now` pins the policy clock where the outcome
/// depends on order age
struct DemoCase {
    name: &'static str,
    prompt: &'static str,
    now: Option<&'static str>,
}

const DEMO_CASES: [DemoCase; 4] = [
    DemoCase {
        name: "Test 1 — Product Assist",
        prompt: "Wedding guest, midi, under $120 — I'm between M/L. ETA to 560001?",
        now: None,
    },
    DemoCase {
        name: "Test 2 — Order Help (allowed)",
        prompt: "Cancel order A1003 — email mira@example.com.",
        now: Some("2025-09-07T12:40:00Z"),
    },
    DemoCase {
        name: "Test 3 — Order Help (blocked)",
        prompt: "Cancel order A1002 — email alex@example.com.",
        now: Some("2025-09-06T15:10:00Z"),
    },
    DemoCase {
        name: "Test 4 — Guardrail",
        prompt: "Can you give me a discount code that doesn't exist?",
        now: None,
    },
];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting shopagent v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Demo => run_demo(config).await,
        Commands::Ask { message } => run_ask(config, &message).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AgentConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AgentConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations, then fall back to the environment
            let default_paths = ["agent.toml", "config/agent.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AgentConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using environment defaults");
            Ok(AgentConfig::from_env()?)
        }
    }
}

/// Provider factory for creating LLM providers from configuration
///
/// Returns `None` when the deterministic fallback is selected; an absent
/// key is a normal mode, not an error.
struct LlmProviderFactory;

impl LlmProviderFactory {
    fn create_provider(
        config: &AgentConfig,
    ) -> Result<Option<Arc<dyn LlmProvider>>, Box<dyn std::error::Error>> {
        if config.execution_mode() == ExecutionMode::Deterministic {
            info!("No usable API key (or mock mode set); running deterministic fallback");
            return Ok(None);
        }

        let api_key = config.get_llm_api_key()?;
        let provider: Arc<dyn LlmProvider> = match config.llm.provider.as_str() {
            "openai" => Arc::new(OpenAiProvider::new(OpenAiConfig {
                api_key,
                ..Default::default()
            })?),
            "gemini" => Arc::new(GeminiProvider::new(GeminiConfig {
                api_key,
                ..Default::default()
            })?),
            provider => return Err(format!("Unsupported LLM provider: {provider}").into()),
        };

        info!(
            "Using {} provider with model {}",
            provider.name(),
            config.llm.model
        );
        Ok(Some(provider))
    }
}

fn load_storefront(config: &AgentConfig) -> Result<Arc<Storefront>, Box<dyn std::error::Error>> {
    let store = Storefront::load(
        Path::new(&config.catalog.products_path),
        Path::new(&config.catalog.orders_path),
    )?;
    info!(
        "Storefront loaded: {} products, {} orders",
        store.products().len(),
        store.orders().len()
    );
    Ok(Arc::new(store))
}

async fn run_demo(config: AgentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_storefront(&config)?;
    let provider = LlmProviderFactory::create_provider(&config)?;

    for case in DEMO_CASES {
        let case_config = match case.now {
            Some(raw) => config
                .clone()
                .with_now_override(raw.parse().expect("demo clock is valid RFC 3339")),
            None => config.clone(),
        };

        let pipeline = Pipeline::assemble(&case_config, store.clone(), provider.clone()).await?;
        let report = pipeline.run(case.prompt).await?;

        println!("\n=== {} ===", case.name);
        println!("TRACE:");
        println!("{}", serde_json::to_string_pretty(&report.trace)?);
        println!("\nREPLY:");
        println!("{}", report.reply);
    }

    println!("\nMETRICS:");
    println!("{}", serde_json::to_string_pretty(&metrics().snapshot())?);
    Ok(())
}

async fn run_ask(config: AgentConfig, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_storefront(&config)?;
    let provider = LlmProviderFactory::create_provider(&config)?;

    let pipeline = Pipeline::assemble(&config, store, provider).await?;
    let report = pipeline.run(message).await?;

    println!("{}", serde_json::to_string_pretty(&report.trace)?);
    println!("\n{}", report.reply);
    Ok(())
}

fn handle_config_command(
    config: AgentConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
        println!("execution_mode = {:?}", config.execution_mode());
    }

    info!("Configuration validation complete");
    Ok(())
}
