//! Configuration management for the htmlshelf daemon.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/htmlshelf/config.toml`.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::files::preview::DEFAULT_MAX_PREVIEW_SIZE;
use crate::guard::DEFAULT_MAX_BODY_SIZE;

/// Default address the HTTP server binds to.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Default root directory served.
pub const DEFAULT_ROOT: &str = "/html_files";

/// Environment variable overriding `files.root`.
pub const ENV_ROOT: &str = "HTMLSHELF_ROOT";

/// Environment variable overriding `server.bind_addr`.
pub const ENV_BIND: &str = "HTMLSHELF_BIND";

/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "HTMLSHELF_LOG_LEVEL";

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("bind_addr must be a socket address like 127.0.0.1:5000, got {0}")]
    InvalidBindAddr(String),

    #[error("root must be an absolute path, got {0}")]
    RelativeRoot(PathBuf),

    #[error("max_preview_size must be greater than 0, got {0}")]
    InvalidMaxPreviewSize(u64),

    #[error("max_body_size must be greater than 0, got {0}")]
    InvalidMaxBodySize(u64),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the htmlshelf daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Served tree and its limits.
    pub files: FileConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
}

/// Served tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Root directory; every operation is confined beneath it.
    pub root: PathBuf,

    /// Largest file served by the preview endpoint, in bytes (default: 100MiB).
    pub max_preview_size: u64,

    /// Largest accepted request body, in bytes (default: 10MiB).
    pub max_body_size: u64,

    /// Reject paths whose symlinks lead outside the root.
    pub confine_symlinks: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,

    /// Optional log file; rotated daily.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            max_preview_size: DEFAULT_MAX_PREVIEW_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            confine_symlinks: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// A config value replaced from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    /// Variable name.
    pub var: &'static str,
    /// Value taken from it.
    pub value: String,
}

impl EnvOverride {
    fn new(var: &'static str, value: String) -> Self {
        Self { var, value }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("htmlshelf")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Empty values are ignored. Supported variables:
    /// - HTMLSHELF_ROOT: Override the served root directory
    /// - HTMLSHELF_BIND: Override the listen address
    /// - HTMLSHELF_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    ///
    /// Returns the overrides applied. They run before the subscriber exists
    /// (the log level itself can be overridden), so the caller logs them.
    pub fn apply_env_overrides(&mut self) -> Vec<EnvOverride> {
        let mut applied = Vec::new();

        if let Some(root) = non_empty_env(ENV_ROOT) {
            self.files.root = PathBuf::from(&root);
            applied.push(EnvOverride::new(ENV_ROOT, root));
        }

        if let Some(bind) = non_empty_env(ENV_BIND) {
            self.server.bind_addr = bind.clone();
            applied.push(EnvOverride::new(ENV_BIND, bind));
        }

        if let Some(level) = non_empty_env(ENV_LOG_LEVEL) {
            self.logging.level = level.clone();
            applied.push(EnvOverride::new(ENV_LOG_LEVEL, level));
        }

        applied
    }

    /// Validate the configuration values.
    ///
    /// The root's existence is not checked here; the server reports that
    /// when it canonicalizes the root at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if !self.files.root.is_absolute() {
            return Err(ConfigError::RelativeRoot(self.files.root.clone()));
        }

        if self.files.max_preview_size == 0 {
            return Err(ConfigError::InvalidMaxPreviewSize(self.files.max_preview_size));
        }

        if self.files.max_body_size == 0 {
            return Err(ConfigError::InvalidMaxBodySize(self.files.max_body_size));
        }

        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }

    /// The parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.server.bind_addr.clone()))
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
