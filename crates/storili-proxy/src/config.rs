//! Proxy configuration loading from file and environment variables.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use storili_platform::{CredentialKind, PlatformConfig};
use thiserror::Error;

/// Top-level proxy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream platform settings. The API key only comes from the environment.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Which identifiers may be resolved.
    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub token: TokenConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Raw access table as written by operators; validated into an
/// [`AccessPolicy`](crate::policy::AccessPolicy) at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Public story id to platform agent id.
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,

    /// Agent ids callers may name directly.
    #[serde(default)]
    pub allowed_agents: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenConfig {
    /// Credential returned to callers.
    #[serde(default)]
    pub kind: CredentialKind,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "storili_proxy=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("ELEVENLABS_API_KEY is not set")]
    MissingApiKey,

    /// The access table contains an entry that can never resolve.
    #[error("invalid access binding: {0}")]
    InvalidBinding(String),
}

impl Config {
    pub fn require_api_key(&self) -> Result<(), ConfigError> {
        if self.platform.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `ELEVENLABS_API_KEY` sets `platform.api_key`
/// - `ELEVENLABS_BASE_URL` overrides `platform.base_url`
/// - `STORILI_HOST` overrides `server.host`
/// - `STORILI_PORT` overrides `server.port`
/// - `STORILI_BINDINGS` adds `story=agent` pairs (comma separated) to `access.bindings`
/// - `STORILI_ALLOWED_AGENTS` adds comma separated ids to `access.allowed_agents`
/// - `STORILI_LOG_LEVEL` overrides `logging.level`
/// - `STORILI_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if `STORILI_BINDINGS` is malformed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Applies the overrides documented on [`load_config`] using `lookup`.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(key) = lookup("ELEVENLABS_API_KEY") {
        config.platform.api_key = key;
    }
    if let Some(base_url) = lookup("ELEVENLABS_BASE_URL") {
        config.platform.base_url = base_url;
    }
    if let Some(host) = lookup("STORILI_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("STORILI_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(bindings) = lookup("STORILI_BINDINGS") {
        for pair in split_list(&bindings) {
            let (story, agent) = pair.split_once('=').ok_or_else(|| {
                ConfigError::InvalidBinding(format!("expected story=agent, got {pair:?}"))
            })?;
            config
                .access
                .bindings
                .insert(story.trim().to_string(), agent.trim().to_string());
        }
    }
    if let Some(agents) = lookup("STORILI_ALLOWED_AGENTS") {
        config
            .access
            .allowed_agents
            .extend(split_list(&agents).map(str::to_string));
    }
    if let Some(level) = lookup("STORILI_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("STORILI_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    Ok(())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
