//! Configuration management for Palaver
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Credentials are never required to be in the file: the Cerebras API key is
//! resolved from the environment, optionally seeded from a local dotfile.

use crate::error::{PalaverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provider types understood by [`crate::providers::create_provider`]
pub const PROVIDER_TYPES: &[&str] = &["cerebras", "mock"];

/// Dotfiles consulted for credentials, in priority order
const DOTENV_FILES: &[&str] = &[".env.local", ".env"];

/// Main configuration structure for Palaver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (Cerebras, mock)
    pub provider: ProviderConfig,
    /// Conversation client behavior
    #[serde(default)]
    pub client: ClientConfig,
}

/// Provider configuration
///
/// Specifies which upstream provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Cerebras configuration
    #[serde(default)]
    pub cerebras: CerebrasConfig,

    /// Offline mock provider configuration
    #[serde(default)]
    pub mock: MockConfig,
}

fn default_provider_type() -> String {
    "cerebras".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            cerebras: CerebrasConfig::default(),
            mock: MockConfig::default(),
        }
    }
}

/// Cerebras provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CerebrasConfig {
    /// API base URL; `/chat/completions` is appended
    ///
    /// Overriding this points the provider at a local mock server in tests.
    #[serde(default = "default_cerebras_api_base")]
    pub api_base: String,

    /// Default model for new sessions
    #[serde(default = "default_cerebras_model")]
    pub model: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Explicit API key; takes precedence over the environment
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_cerebras_api_base() -> String {
    "https://api.cerebras.ai/v1".to_string()
}

fn default_cerebras_model() -> String {
    "llama-4-scout-17b-16e-instruct".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_api_key_env() -> String {
    "CEREBRAS_API_KEY".to_string()
}

impl Default for CerebrasConfig {
    fn default() -> Self {
        Self {
            api_base: default_cerebras_api_base(),
            model: default_cerebras_model(),
            timeout_seconds: default_timeout_seconds(),
            api_key_env: default_api_key_env(),
            api_key: None,
        }
    }
}

impl CerebrasConfig {
    /// Resolve the API key from the config or the configured environment variable
    ///
    /// Blank values are treated as absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::config::CerebrasConfig;
    ///
    /// let config = CerebrasConfig {
    ///     api_key: Some("sk-test".to_string()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
    /// ```
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|key| key.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Mock provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Default model for new sessions
    #[serde(default = "default_mock_model")]
    pub model: String,
}

fn default_mock_model() -> String {
    "mock-gpt-4".to_string()
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: default_mock_model(),
        }
    }
}

/// Conversation client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `max_tokens` sent with each chat request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// `max_tokens` sent with summarization requests
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Estimated cost in dollars per thousand tokens
    #[serde(default = "default_cost_per_1k_tokens")]
    pub cost_per_1k_tokens: f64,

    /// Maximum size of an attached file (bytes)
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    /// Session archive database path (CLI only)
    #[serde(default)]
    pub archive_path: Option<String>,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_summary_max_tokens() -> u32 {
    256
}

fn default_cost_per_1k_tokens() -> f64 {
    0.01
}

fn default_max_attachment_bytes() -> u64 {
    1024 * 1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
            cost_per_1k_tokens: default_cost_per_1k_tokens(),
            max_attachment_bytes: default_max_attachment_bytes(),
            archive_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with dotfile, environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        load_dotenv();
        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PalaverError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::config::Config;
    ///
    /// let config = Config::from_yaml("provider:\n  type: mock\n").unwrap();
    /// assert_eq!(config.provider.provider_type, "mock");
    /// ```
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| PalaverError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("PALAVER_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("PALAVER_CEREBRAS_MODEL") {
            self.provider.cerebras.model = model;
        }

        if let Ok(api_base) = std::env::var("PALAVER_CEREBRAS_API_BASE") {
            self.provider.cerebras.api_base = api_base;
        }

        if let Ok(max_tokens) = std::env::var("PALAVER_MAX_TOKENS") {
            if let Ok(value) = max_tokens.parse() {
                self.client.max_tokens = value;
            } else {
                tracing::warn!("Invalid PALAVER_MAX_TOKENS: {}", max_tokens);
            }
        }

        if let Ok(timeout) = std::env::var("PALAVER_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.cerebras.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid PALAVER_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(cost) = std::env::var("PALAVER_COST_PER_1K_TOKENS") {
            if let Ok(value) = cost.parse() {
                self.client.cost_per_1k_tokens = value;
            } else {
                tracing::warn!("Invalid PALAVER_COST_PER_1K_TOKENS: {}", cost);
            }
        }

        if let Ok(archive) = std::env::var("PALAVER_ARCHIVE_DB") {
            self.client.archive_path = Some(archive);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(provider) = &cli.provider {
            self.provider.provider_type = provider.clone();
        }

        if let Some(archive) = &cli.archive {
            self.client.archive_path = Some(archive.clone());
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(PalaverError::Config("Provider type cannot be empty".to_string()).into());
        }

        if !PROVIDER_TYPES.contains(&self.provider.provider_type.as_str()) {
            return Err(PalaverError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                PROVIDER_TYPES.join(", ")
            ))
            .into());
        }

        if self.provider.cerebras.api_base.trim().is_empty() {
            return Err(
                PalaverError::Config("cerebras.api_base cannot be empty".to_string()).into(),
            );
        }

        if self.provider.cerebras.timeout_seconds == 0 {
            return Err(PalaverError::Config(
                "cerebras.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.client.max_tokens == 0 || self.client.summary_max_tokens == 0 {
            return Err(PalaverError::Config(
                "client.max_tokens and client.summary_max_tokens must be greater than 0"
                    .to_string(),
            )
            .into());
        }

        if !self.client.cost_per_1k_tokens.is_finite() || self.client.cost_per_1k_tokens < 0.0 {
            return Err(PalaverError::Config(
                "client.cost_per_1k_tokens must be a non-negative number".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Seed the process environment from local dotfiles
///
/// Existing variables are never overwritten; missing files are ignored.
pub fn load_dotenv() {
    for file in DOTENV_FILES {
        match dotenvy::from_filename(file) {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to load {}: {}", file, e),
        }
    }
}
