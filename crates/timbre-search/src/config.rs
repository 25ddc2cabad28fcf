use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resilience::RetryPolicy;

/// Environment variable consulted for the backend API key when no
/// `TIMBRE_API_KEY` or config-file value is set.
pub const FALLBACK_API_KEY_VAR: &str = "QDRANT_API_KEY";

/// Configuration for timbre.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (TIMBRE_* prefix)
/// 3. Config file (~/.config/timbre/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the vector backend.
    ///
    /// Can be set via:
    /// - CLI: --backend-url http://host:6333
    /// - ENV: TIMBRE_BACKEND_URL
    /// - Config: backend_url = "..."
    pub backend_url: String,

    /// API key for the vector backend.
    ///
    /// Can be set via:
    /// - ENV: TIMBRE_API_KEY (or QDRANT_API_KEY)
    /// - Config: api_key = "..."
    pub api_key: Option<String>,

    /// Collection holding the song vectors.
    pub collection: String,

    /// Path to the catalog CSV.
    ///
    /// Can be set via:
    /// - CLI: --catalog /path/to/metadata.csv
    /// - ENV: TIMBRE_CATALOG_PATH
    /// - Config: catalog_path = "/path/to/metadata.csv"
    /// - Default: ~/.local/share/timbre/metadata.csv
    pub catalog_path: PathBuf,

    /// Base URL of the model-inference server used for uploaded songs.
    pub model_endpoint: Option<String>,

    /// Where re-encoded playback files are kept.
    pub cache_dir: PathBuf,

    /// Number of neighbours returned when none is requested.
    pub default_limit: usize,

    pub request_timeout_secs: u64,

    /// Attempts per backend call, including the first.
    pub retry_attempts: usize,

    pub logging: LoggingConfig,
}

/// Logger settings, applied at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "music_vectors".to_string(),
            catalog_path: default_catalog_path(),
            model_endpoint: None,
            cache_dir: default_cache_dir(),
            default_limit: 10,
            request_timeout_secs: 30,
            retry_attempts: 3,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/timbre/config.toml
    /// Reads environment variables with TIMBRE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("timbre");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder.build().context("Failed to build configuration")?;

        if config.api_key.is_none() {
            config.api_key = std::env::var(FALLBACK_API_KEY_VAR).ok();
        }

        Ok(config)
    }

    /// Per-request timeout for backend, origin, and model calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.retry_attempts)
    }
}

/// Get the default catalog path.
///
/// Returns: ~/.local/share/timbre/metadata.csv (or platform equivalent)
fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("metadata.csv")
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/timbre/config.toml
/// - macOS: ~/Library/Application Support/timbre/config.toml
/// - Windows: %APPDATA%\timbre\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Timbre Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (TIMBRE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Vector backend (Qdrant) base URL
#
# Can also be set via:
# - CLI: timbre --backend-url https://your-cluster:6333 similar "..."
# - Environment: TIMBRE_BACKEND_URL=https://your-cluster:6333
backend_url = "http://localhost:6333"

# API key for the vector backend
#
# Prefer the environment over this file:
# - Environment: TIMBRE_API_KEY=your-key-here (QDRANT_API_KEY also works)
#api_key = "your-api-key-here"

# Collection holding one vector per catalog song
collection = "music_vectors"

# Song catalog (CSV with index, name, artist, genre, urls columns)
#
# Can also be set via:
# - CLI: timbre --catalog /path/to/metadata.csv songs
# - Environment: TIMBRE_CATALOG_PATH=/path/to/metadata.csv
#catalog_path = "/path/to/metadata.csv"

# Model-inference server used to embed uploaded songs
#model_endpoint = "http://localhost:8500"

# Where re-encoded playback files are cached
#cache_dir = "/path/to/cache"

# Neighbours returned when --limit is not given (1-30)
default_limit = 10

# Per-request timeout in seconds
request_timeout_secs = 30

# Attempts per backend call, including the first
retry_attempts = 3

[logging]
# trace, debug, info, warn, or error
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}

/// Write the example config to `config_path` unless a file is already there.
pub fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.catalog_path.as_os_str().is_empty());
        assert_eq!(config.collection, "music_vectors");
        assert_eq!(config.default_limit, 10);
        assert!(config.api_key.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.backend_url, "http://localhost:6333");
        assert_eq!(config.collection, "music_vectors");
        assert_eq!(config.retry_attempts, 3);
        assert!(config.api_key.is_none());
        assert!(config.logging.coloured);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("collection = \"demo\"\n").unwrap();
        assert_eq!(config.collection, "demo");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
