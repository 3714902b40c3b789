//! Configuration loading, validation, and management for promptward.
//!
//! Loads configuration from `~/.promptward/config.toml` with environment
//! variable overrides. Validates all settings at startup, including any
//! policy and call-site overrides layered over the built-in tables.

use promptward_core::{Purpose, RequiredEmpty, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.promptward/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Per-call timeout passed through to the gateway (none = wait indefinitely)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Report store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Engine-wide defaults
    #[serde(default)]
    pub engine: EngineConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rogue-prompt scan configuration
    #[serde(default)]
    pub compliance: ComplianceConfig,

    /// Artifact sealing configuration
    #[serde(default)]
    pub seal: SealConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Per-purpose policy overrides (replace the built-in policy for that purpose)
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,

    /// Additional or replacement call sites
    #[serde(default)]
    pub call_sites: Vec<CallSiteConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("server", &self.server)
            .field("compliance", &self.compliance)
            .field("seal", &self.seal)
            .field("providers", &self.providers)
            .field("policies", &self.policies)
            .field("call_sites", &self.call_sites)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for SealConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealConfig")
            .field("key_hex", &redact(&self.key_hex))
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Known report store backends.
pub const STORE_BACKENDS: [&str; 3] = ["sqlite", "jsonl", "memory"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite", "jsonl", or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database or log file path (defaults under the config dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// The configured path, or the backend's default file under the config dir.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(p) => PathBuf::from(p),
            None if self.backend == "jsonl" => AppConfig::config_dir().join("reports.jsonl"),
            None => AppConfig::config_dir().join("reports.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default handling of required sections that generate empty
    #[serde(default)]
    pub required_empty: RequiredEmpty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Directory the rogue-prompt scan walks (defaults to the working directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_root: Option<String>,

    /// Path fragments allowed to talk to providers directly
    #[serde(default = "default_allowed_paths")]
    pub allowed_paths: Vec<String>,
}

fn default_allowed_paths() -> Vec<String> {
    vec![
        "crates/gateway/src/gateway.rs".into(),
        "crates/providers/".into(),
        "crates/security/src/scan.rs".into(),
    ]
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            scan_root: None,
            allowed_paths: default_allowed_paths(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SealConfig {
    /// Hex-encoded HMAC key shared by every process that builds or invokes
    /// artifacts. When absent, each process generates its own key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hex: Option<String>,
}

/// Replacement policy for one purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub purpose: Purpose,

    #[serde(default)]
    pub required: Vec<SectionId>,

    #[serde(default)]
    pub optional: Vec<SectionId>,

    #[serde(default)]
    pub banned: Vec<SectionId>,

    #[serde(default)]
    pub allowed_tools: Vec<String>,

    pub token_budget: usize,

    /// Overrides `engine.required_empty` for this purpose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_empty: Option<RequiredEmpty>,
}

/// A call site registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSiteConfig {
    pub id: String,

    pub purposes: Vec<Purpose>,

    #[serde(default)]
    pub owner: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.promptward/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// API key lookup order:
    /// - `PROMPTWARD_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("PROMPTWARD_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("PROMPTWARD_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("PROMPTWARD_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptward")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be one of {STORE_BACKENDS:?}, got '{}'",
                self.store.backend
            )));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0 when set".into(),
            ));
        }

        if let Some(key) = &self.seal.key_hex {
            let valid = key.len() >= 32
                && key.len() % 2 == 0
                && key.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(ConfigError::ValidationError(
                    "seal.key_hex must be an even-length hex string of at least 32 characters"
                        .into(),
                ));
            }
        }

        self.validate_policies()?;
        self.validate_call_sites()?;
        Ok(())
    }

    fn validate_policies(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for policy in &self.policies {
            if !seen.insert(policy.purpose) {
                return Err(ConfigError::ValidationError(format!(
                    "policy for '{}' is defined more than once",
                    policy.purpose
                )));
            }
            if policy.token_budget == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "policy for '{}' must have token_budget > 0",
                    policy.purpose
                )));
            }
            if let Some(section) = policy.required.iter().find(|s| policy.banned.contains(s)) {
                return Err(ConfigError::ValidationError(format!(
                    "policy for '{}' lists '{}' as both required and banned",
                    policy.purpose, section
                )));
            }
        }
        Ok(())
    }

    fn validate_call_sites(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for site in &self.call_sites {
            if site.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "call site id must not be empty".into(),
                ));
            }
            if !seen.insert(site.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "call site '{}' is defined more than once",
                    site.id
                )));
            }
            if site.purposes.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "call site '{}' must permit at least one purpose",
                    site.id
                )));
            }
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The gateway timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: None,
            store: StoreConfig::default(),
            engine: EngineConfig::default(),
            server: ServerConfig::default(),
            compliance: ComplianceConfig::default(),
            seal: SealConfig::default(),
            providers: HashMap::new(),
            policies: vec![],
            call_sites: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
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
}
