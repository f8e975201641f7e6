//! Configuration loading, validation, and management for DiabeCare.
//!
//! Loads configuration from an optional `diabecare.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "diabecare.toml";

/// The model suggested to operators when the configured one is unavailable.
pub const RECOMMENDED_MODEL: &str = "llama-3.1-8b-instant";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key. Required before the service starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier sent with every completion request
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider call timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Provider endpoint configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chat history configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    RECOMMENDED_MODEL.into()
}
fn default_request_timeout_secs() -> u64 {
    30
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("provider", &self.provider)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_provider_name() -> String {
    "groq".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// JSON file holding the recent chat history
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    /// Turns kept after every save
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("chat_memory.json")
}
fn default_max_turns() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            max_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `./diabecare.toml`), then apply
    /// process environment overrides:
    ///
    /// - `GROQ_API_KEY` / `DIABECARE_API_KEY`
    /// - `MODEL_NAME`
    /// - `MAX_MEMORY_TURNS`
    /// - `REQUEST_TIMEOUT_SECONDS`
    /// - `MEMORY_FILE`
    /// - `PROVIDER_BASE_URL`
    /// - `HOST`, `PORT`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// `./diabecare.toml`
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GROQ_API_KEY").or_else(|| get("DIABECARE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = get("MODEL_NAME") {
            self.model = model;
        }
        if let Some(raw) = get("MAX_MEMORY_TURNS") {
            self.memory.max_turns = parse_env("MAX_MEMORY_TURNS", &raw)?;
        }
        if let Some(raw) = get("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECONDS", &raw)?;
        }
        if let Some(path) = get("MEMORY_FILE") {
            self.memory.path = PathBuf::from(path);
        }
        if let Some(url) = get("PROVIDER_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(host) = get("HOST") {
            self.gateway.host = host;
        }
        if let Some(raw) = get("PORT") {
            self.gateway.port = parse_env("PORT", &raw)?;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.max_turns < 2 {
            return Err(ConfigError::ValidationError(
                "memory.max_turns must be at least 2 (one user/assistant pair)".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key, or the startup-fatal `MissingApiKey` error.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            provider: ProviderConfig::default(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: {raw:?}")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("GROQ_API_KEY is not set. Create .env with your key.")]
    MissingApiKey,
}
