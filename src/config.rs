//! Configuration for the support-agent pipeline
//!
//! Configuration is resolved once at startup and passed to the pipeline as
//! an explicit object; nodes and tools never read the environment
//! themselves. Two sources are supported: a TOML file (`agent.toml`) with
//! API keys indirected through named environment variables, and a pure
//! environment fallback for zero-config runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main agent configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub agent: AgentSection,
    pub llm: LlmSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    /// Frozen-clock override for policy evaluation; set from `NOW_ISO` or
    /// programmatically, never from the TOML file.
    #[serde(skip)]
    pub now_override: Option<DateTime<Utc>>,
}

/// Agent identity section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSection {
    /// Agent identifier (must match [a-zA-Z0-9._-]+)
    pub id: String,
    /// Description of what this agent does
    pub description: String,
}

/// LLM section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name ("openai" or "gemini")
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// System prompt shared by the classifier and the composer
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Optional temperature (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Optional max tokens
    pub max_tokens: Option<u32>,
    /// Force the deterministic fallback path even when a key is present
    #[serde(default)]
    pub use_mock: bool,
}

/// Storefront data file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSection {
    #[serde(default = "default_products_path")]
    pub products_path: String,
    #[serde(default = "default_orders_path")]
    pub orders_path: String,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            products_path: default_products_path(),
            orders_path: default_orders_path(),
        }
    }
}

fn default_products_path() -> String {
    "data/products.json".to_string()
}

fn default_orders_path() -> String {
    "data/orders.json".to_string()
}

fn default_system_prompt() -> String {
    "You are a storefront support agent. Follow policy strictly: \
     product assist vs order help, 60-minute cancel rule, no fake discounts. \
     Be concise."
        .to_string()
}

/// Which execution strategy the pipeline runs with
///
/// Resolved once at startup; the pipeline never re-checks keys mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Classify and compose through the configured LLM provider
    Llm,
    /// Deterministic keyword rules and reply templates
    Deterministic,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid agent ID format: {0}")]
    InvalidAgentId(String),
    #[error("Invalid timestamp in {source_var}: {message}")]
    InvalidTimestamp {
        source_var: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AgentConfig {
    /// Load configuration from a TOML file
    ///
    /// API keys stay out of the file; only the *name* of the environment
    /// variable holding the key is stored, resolved at runtime.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AgentConfig = toml::from_str(&content)?;

        validate_agent_id(&config.agent.id)?;
        validate_provider(&config.llm.provider)?;

        config.now_override = read_now_override()?;
        Ok(config)
    }

    /// Build configuration purely from the environment
    ///
    /// Provider selection mirrors key presence: `PROVIDER` wins when set,
    /// otherwise a Gemini key selects Gemini and OpenAI is the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match std::env::var("PROVIDER") {
            Ok(p) => p.to_lowercase(),
            Err(_) => {
                if env_is_set("GEMINI_API_KEY") {
                    "gemini".to_string()
                } else {
                    "openai".to_string()
                }
            }
        };
        validate_provider(&provider)?;

        let (api_key_env, model) = match provider.as_str() {
            "gemini" => (
                "GEMINI_API_KEY".to_string(),
                std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            ),
            _ => (
                "OPENAI_API_KEY".to_string(),
                std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ),
        };

        Ok(Self {
            agent: AgentSection {
                id: "storefront-support".to_string(),
                description: "Customer-support pipeline over the mock storefront".to_string(),
            },
            llm: LlmSection {
                provider,
                model,
                api_key_env,
                system_prompt: default_system_prompt(),
                temperature: Some(0.2),
                max_tokens: None,
                use_mock: env_is_set("USE_MOCK_LLM"),
            },
            catalog: CatalogSection::default(),
            now_override: read_now_override()?,
        })
    }

    /// Get the LLM API key from the configured environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.llm.api_key_env.clone()))
    }

    /// Resolve the execution mode from key presence and the mock flag
    pub fn execution_mode(&self) -> ExecutionMode {
        let has_key = std::env::var(&self.llm.api_key_env)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        resolve_execution_mode(has_key, self.llm.use_mock)
    }

    /// Pin the pipeline clock, replacing any `NOW_ISO` override
    pub fn with_now_override(mut self, now: DateTime<Utc>) -> Self {
        self.now_override = Some(now);
        self
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[agent]
id = "test-support"
description = "A test support agent"

[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
temperature = 0.2
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Mode resolution rule (pure function)
///
/// Absence of a key is not an error; it selects the deterministic branch.
pub fn resolve_execution_mode(has_key: bool, use_mock: bool) -> ExecutionMode {
    if has_key && !use_mock {
        ExecutionMode::Llm
    } else {
        ExecutionMode::Deterministic
    }
}

fn env_is_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Parse the optional `NOW_ISO` frozen-clock override (RFC 3339)
fn read_now_override() -> Result<Option<DateTime<Utc>>, ConfigError> {
    match std::env::var("NOW_ISO") {
        Ok(raw) if !raw.is_empty() => {
            let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| {
                ConfigError::InvalidTimestamp {
                    source_var: "NOW_ISO".to_string(),
                    message: e.to_string(),
                }
            })?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        _ => Ok(None),
    }
}

/// Validate agent ID format
fn validate_agent_id(agent_id: &str) -> Result<(), ConfigError> {
    let valid_chars = agent_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if agent_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidAgentId(format!(
            "Agent ID '{agent_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

fn validate_provider(provider: &str) -> Result<(), ConfigError> {
    match provider {
        "openai" | "gemini" => Ok(()),
        other => Err(ConfigError::InvalidConfig(format!(
            "Unsupported LLM provider '{other}' (expected \"openai\" or \"gemini\")"
        ))),
    }
}
