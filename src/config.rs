//! Configuration management
//!
//! Gateway, model, agent and session settings, stored as TOML in the
//! platform config directory. Secrets live in the keyring, not here.

use crate::agents::AgentTool;
use crate::llm::client::{GROQ_BASE_URL, OPENROUTER_BASE_URL};
use crate::llm::{ProviderConfig, DEFAULT_MODEL};
use crate::orchestrator::activity::DEFAULT_CAPACITY;
use crate::orchestrator::session::{DEFAULT_CREDITS, SESSION_FILE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// LLM gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Model assignments for the orchestration steps
    #[serde(default)]
    pub models: ModelsConfig,
    /// How agents are dispatched
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Which OpenAI-compatible gateway to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    #[default]
    Groq,
    OpenRouter,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub provider: GatewayProvider,
    /// Overrides the provider's base URL; required for `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

fn default_gateway_timeout() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::default(),
            base_url: None,
            timeout_secs: default_gateway_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Provider settings for the configured gateway
    pub fn provider_config(&self, api_key: impl Into<String>) -> Result<ProviderConfig> {
        let mut provider = match self.provider {
            GatewayProvider::Groq => ProviderConfig::groq(api_key),
            GatewayProvider::OpenRouter => ProviderConfig::openrouter(api_key),
            GatewayProvider::Custom => {
                let base_url = self
                    .base_url
                    .as_deref()
                    .context("gateway.base_url is required when gateway.provider = \"custom\"")?;
                return Ok(ProviderConfig::custom(base_url, api_key));
            }
        };
        if let Some(base_url) = &self.base_url {
            provider.base_url = base_url.trim_end_matches('/').to_string();
        }
        Ok(provider)
    }

    /// Base URL requests go to, or `None` for a custom gateway with no URL
    pub fn effective_base_url(&self) -> Option<&str> {
        match (&self.base_url, self.provider) {
            (Some(url), _) => Some(url.as_str()),
            (None, GatewayProvider::Groq) => Some(GROQ_BASE_URL),
            (None, GatewayProvider::OpenRouter) => Some(OPENROUTER_BASE_URL),
            (None, GatewayProvider::Custom) => None,
        }
    }
}

/// Model assignments for the orchestration steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model for intent classification
    #[serde(default = "default_model")]
    pub classifier: String,
    /// Model for task decomposition
    #[serde(default = "default_model")]
    pub decomposer: String,
    /// Model for agents run directly against the gateway
    #[serde(default = "default_model")]
    pub agent: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            classifier: default_model(),
            decomposer: default_model(),
            agent: default_model(),
        }
    }
}

impl ModelsConfig {
    /// Get model for a role name
    pub fn get(&self, role: &str) -> Option<&str> {
        match role.to_lowercase().as_str() {
            "classifier" | "classify" => Some(&self.classifier),
            "decomposer" | "decompose" => Some(&self.decomposer),
            "agent" | "agents" => Some(&self.agent),
            _ => None,
        }
    }

    /// Set model for a role name
    pub fn set(&mut self, role: &str, model: String) -> bool {
        match role.to_lowercase().as_str() {
            "classifier" | "classify" => { self.classifier = model; true }
            "decomposer" | "decompose" => { self.decomposer = model; true }
            "agent" | "agents" => { self.agent = model; true }
            _ => false,
        }
    }

    /// List all available roles
    pub fn roles() -> &'static [&'static str] {
        &["classifier", "decomposer", "agent"]
    }
}

/// Where agents run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokerMode {
    /// Hosted agent functions over HTTP
    Remote,
    /// Directly against the LLM gateway
    #[default]
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub mode: InvokerMode,
    /// Base URL of the agent functions, e.g. `https://<project>.supabase.co/functions/v1`
    #[serde(default)]
    pub functions_url: String,
    #[serde(default = "default_function")]
    pub function: String,
    /// Per-dispatch transport timeout
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled_tools")]
    pub enabled_tools: Vec<AgentTool>,
    #[serde(default)]
    pub include_reasoning: bool,
    /// Completion budget for each agent response in llm mode
    #[serde(default = "default_agent_max_tokens")]
    pub max_tokens: u32,
}

fn default_function() -> String {
    crate::agents::remote::DEFAULT_FUNCTION.to_string()
}

fn default_agent_timeout() -> u64 {
    120
}

fn default_agent_max_tokens() -> u32 {
    crate::agents::llm_agent::DEFAULT_MAX_TOKENS
}

fn default_enabled_tools() -> Vec<AgentTool> {
    AgentTool::ALL.to_vec()
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            mode: InvokerMode::default(),
            functions_url: String::new(),
            function: default_function(),
            timeout_secs: default_agent_timeout(),
            enabled_tools: default_enabled_tools(),
            include_reasoning: false,
            max_tokens: default_agent_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_credits")]
    pub initial_credits: u32,
    #[serde(default = "default_activity_capacity")]
    pub activity_capacity: usize,
}

fn default_credits() -> u32 {
    DEFAULT_CREDITS
}

fn default_activity_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_credits: default_credits(),
            activity_capacity: default_activity_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "startup-box", "startup-box")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Where the session (credits, activity, shared context) is kept
pub fn session_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(SESSION_FILE))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Gateway:");
    println!("  provider:          {:?}", config.gateway.provider);
    println!("  base url:          {}", config.gateway.effective_base_url().unwrap_or("not set"));
    println!("  timeout:           {}s", config.gateway.timeout_secs);
    println!("  api key:           {}", if crate::security::has_api_key() { "configured" } else { "not set" });

    println!("\nModels:");
    println!("  classifier:        {}", config.models.classifier);
    println!("  decomposer:        {}", config.models.decomposer);
    println!("  agent:             {}", config.models.agent);

    println!("\nAgents:");
    println!("  mode:              {:?}", config.agents.mode);
    if config.agents.mode == InvokerMode::Remote {
        println!("  functions url:     {}", config.agents.functions_url);
        println!("  function:          {}", config.agents.function);
    }
    println!("  timeout:           {}s", config.agents.timeout_secs);
    println!(
        "  tools:             {}",
        config.agents.enabled_tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
    );
    println!("  reasoning:         {}", if config.agents.include_reasoning { "on" } else { "off" });
    if config.agents.mode == InvokerMode::Llm {
        println!("  max tokens:        {}", config.agents.max_tokens);
    }

    println!("\nSession:");
    println!("  initial credits:   {}", config.session.initial_credits);
    println!("  activity entries:  {}", config.session.activity_capacity);

    println!("\nUse 'startup-box config --set-model <role> <model>' to change a model");
    println!("   Available roles: {}", ModelsConfig::roles().join(", "));

    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Set model for a specific role
pub fn set_model(role: &str, model: &str) -> Result<()> {
    let mut config = Config::load()?;

    if !config.models.set(role, model.to_string()) {
        anyhow::bail!("Unknown role '{}'. Available roles: {}", role, ModelsConfig::roles().join(", "));
    }

    config.save()?;
    println!("Model for '{}' set to: {}", role, model);
    Ok(())
}

/// Switch between remote agent functions and gateway-backed agents
pub fn set_agent_mode(mode: InvokerMode, functions_url: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = functions_url {
        config.agents.functions_url = url.trim_end_matches('/').to_string();
    }
    if mode == InvokerMode::Remote && config.agents.functions_url.is_empty() {
        anyhow::bail!("Remote mode needs a functions URL (--functions-url)");
    }
    config.agents.mode = mode;
    config.save()?;
    println!("Agent mode set to {:?}", mode);
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[agents]\nmode = \"remote\"\nfunctions_url = \"https://fn.example.com\"\nenabled_tools = [\"calculator\"]\n\n[session]\ninitial_credits = 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.agents.mode, InvokerMode::Remote);
        assert_eq!(config.agents.function, "rag-agent");
        assert_eq!(config.agents.enabled_tools, vec![AgentTool::Calculator]);
        assert_eq!(config.session.initial_credits, 5);
        assert_eq!(config.session.activity_capacity, 10);
        assert_eq!(config.models.classifier, DEFAULT_MODEL);
        assert_eq!(config.agents.max_tokens, 4000);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.models.set("decomposer", "big-model".into());
        config.gateway.provider = GatewayProvider::OpenRouter;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_models_roles() {
        let mut models = ModelsConfig::default();
        assert!(models.set("Classifier", "m1".into()));
        assert_eq!(models.get("classify"), Some("m1"));
        assert!(!models.set("vision", "m2".into()));
        assert_eq!(models.get("vision"), None);
    }

    #[test]
    fn test_provider_config() {
        let gateway = GatewayConfig::default();
        assert_eq!(gateway.provider_config("k").unwrap().base_url, GROQ_BASE_URL);

        let gateway = GatewayConfig {
            provider: GatewayProvider::OpenRouter,
            base_url: Some("http://localhost:9000/v1/".into()),
            ..GatewayConfig::default()
        };
        let provider = gateway.provider_config("k").unwrap();
        assert_eq!(provider.base_url, "http://localhost:9000/v1");
        assert!(!provider.extra_headers.is_empty());

        let custom = GatewayConfig {
            provider: GatewayProvider::Custom,
            ..GatewayConfig::default()
        };
        assert!(custom.provider_config("k").is_err());
    }

    #[test]
    fn test_effective_base_url() {
        assert_eq!(GatewayConfig::default().effective_base_url(), Some(GROQ_BASE_URL));

        let mut gateway = GatewayConfig {
            provider: GatewayProvider::Custom,
            ..GatewayConfig::default()
        };
        assert_eq!(gateway.effective_base_url(), None);

        gateway.base_url = Some("http://localhost:8080/v1".into());
        assert_eq!(gateway.effective_base_url(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_default_toml_parses() {
        let toml = default_config_toml();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
