//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::{
    SearchConfig as EngineConfig, DEFAULT_DEBOUNCE_WINDOW, DEFAULT_JSONPATH_CACHE_CAPACITY,
    DEFAULT_RESULT_CACHE_CAPACITY, DEFAULT_TIMELINE_CAPACITY,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub websocket: WebsocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted webhook body
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Search engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_jsonpath_cache_capacity")]
    pub jsonpath_cache_capacity: usize,

    #[serde(default = "default_result_cache_capacity")]
    pub result_cache_capacity: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_timeline_capacity")]
    pub timeline_capacity: usize,
}

fn default_jsonpath_cache_capacity() -> usize {
    DEFAULT_JSONPATH_CACHE_CAPACITY
}

fn default_result_cache_capacity() -> usize {
    DEFAULT_RESULT_CACHE_CAPACITY
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64
}

fn default_timeline_capacity() -> usize {
    DEFAULT_TIMELINE_CAPACITY
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            jsonpath_cache_capacity: default_jsonpath_cache_capacity(),
            result_cache_capacity: default_result_cache_capacity(),
            debounce_ms: default_debounce_ms(),
            timeline_capacity: default_timeline_capacity(),
        }
    }
}

impl SearchConfig {
    /// Engine sizing derived from this section
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            jsonpath_cache_capacity: self.jsonpath_cache_capacity,
            result_cache_capacity: self.result_cache_capacity,
            timeline_capacity: self.timeline_capacity,
        }
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// WebSocket hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebsocketConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_max_connections() -> usize {
    1000
}

fn default_broadcast_capacity() -> usize {
    1024
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("hookscope").join("config.toml")),
            Some(PathBuf::from("/etc/hookscope/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = lookup("HOOKSCOPE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("HOOKSCOPE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Search overrides
        if let Some(ms) = lookup("HOOKSCOPE_DEBOUNCE_MS").and_then(|ms| ms.parse().ok()) {
            self.search.debounce_ms = ms;
        }

        // Logging overrides
        if let Some(level) = lookup("HOOKSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("HOOKSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Hookscope Configuration
#
# Environment variables override these settings:
# - HOOKSCOPE_HOST
# - HOOKSCOPE_PORT
# - HOOKSCOPE_DEBOUNCE_MS
# - HOOKSCOPE_LOG_LEVEL
# - HOOKSCOPE_LOG_FORMAT

[server]
# Address to listen on for webhooks and the API
host = "0.0.0.0"
port = 8080

# Largest accepted request body (bytes)
max_body_size = 10485760

[search]
# Memoized JSONPath evaluations
jsonpath_cache_capacity = 500

# Memoized filter results
result_cache_capacity = 100

# Quiet period before a live filter is evaluated (ms)
debounce_ms = 250

# Points kept on the traffic timeline
timeline_capacity = 500

[websocket]
# Maximum concurrent live clients
max_connections = 1000

# Capacity of the internal broadcast channel
broadcast_capacity = 1024

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
