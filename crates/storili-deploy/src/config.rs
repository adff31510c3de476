//! Deploy tool configuration loading from file and environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use storili_platform::PlatformConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "storili.toml";

/// Environment variable holding the platform API key.
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Top-level deploy tool configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub stories: StoriesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where deployments are recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Path to the registry document.
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

/// Where story records are read from.
#[derive(Debug, Clone, Deserialize)]
pub struct StoriesConfig {
    /// Directory holding one `<story-id>.toml` per story.
    #[serde(default = "default_stories_dir")]
    pub dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "storili_platform=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".agents.json")
}

fn default_stories_dir() -> PathBuf {
    PathBuf::from("stories")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl Default for StoriesConfig {
    fn default() -> Self {
        Self {
            dir: default_stories_dir(),
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

    /// A command needs the platform but no API key was supplied.
    #[error("ELEVENLABS_API_KEY is not set")]
    MissingApiKey,
}

impl DeployConfig {
    /// Fails unless an API key is available for platform calls.
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
/// - `ELEVENLABS_API_KEY` sets `platform.api_key` (never read from the file)
/// - `ELEVENLABS_BASE_URL` overrides `platform.base_url`
/// - `STORILI_REGISTRY_PATH` overrides `registry.path`
/// - `STORILI_STORIES_DIR` overrides `stories.dir`
/// - `STORILI_LOG_LEVEL` overrides `logging.level`
/// - `STORILI_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<DeployConfig, ConfigError> {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            DeployConfig::default()
        }
        Err(e) => return Err(ConfigError::FileRead(e)),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies the overrides documented on [`load_config`] using `lookup`.
pub fn apply_env_overrides(config: &mut DeployConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(API_KEY_ENV) {
        config.platform.api_key = key;
    }
    if let Some(base_url) = lookup("ELEVENLABS_BASE_URL") {
        config.platform.base_url = base_url;
    }
    if let Some(path) = lookup("STORILI_REGISTRY_PATH") {
        config.registry.path = PathBuf::from(path);
    }
    if let Some(dir) = lookup("STORILI_STORIES_DIR") {
        config.stories.dir = PathBuf::from(dir);
    }
    if let Some(level) = lookup("STORILI_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("STORILI_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// the command's report.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
