//! Configuration management for mvc-dispatch.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::routing::{application_path, DispatchConfig, DEFAULT_SESSION_COOKIE};
use crate::server::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
use crate::session::DEFAULT_SESSION_TIMEOUT;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Routing and session configuration.
    pub dispatch: DispatchSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Dispatch configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    /// Static file root. Defaults to the executable's directory.
    pub app_root: Option<PathBuf>,
    /// Controller receiving paths no other controller claims.
    pub default_controller: Option<String>,
    /// Session cookie name.
    pub session_cookie: String,
    /// Idle seconds before a session expires.
    pub session_timeout_secs: u64,
    /// Seconds between expired-session sweeps.
    pub sweep_interval_secs: u64,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            app_root: None,
            default_controller: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT.as_secs(),
            sweep_interval_secs: 60,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or filter directive (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("MVC_DISPATCH_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("MVC_DISPATCH_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Some(root) = var("MVC_DISPATCH_ROOT") {
            if !root.is_empty() {
                self.dispatch.app_root = Some(PathBuf::from(root));
            }
        }

        if let Some(name) = var("MVC_DISPATCH_DEFAULT_CONTROLLER") {
            self.dispatch.default_controller = (!name.is_empty()).then_some(name);
        }

        if let Some(level) = var("MVC_DISPATCH_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref root) = args.root {
            self.dispatch.app_root = Some(root.clone());
        }

        if let Some(ref name) = args.default_controller {
            self.dispatch.default_controller = Some(name.clone());
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to the listener configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        if self.dispatch.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("sweep_interval_secs", "0".to_string()));
        }

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port)
            .with_sweep_interval(Duration::from_secs(self.dispatch.sweep_interval_secs))
            .with_max_body_bytes(self.dispatch.max_body_bytes);

        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Convert to the route manager configuration.
    pub fn to_dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
        if self.dispatch.session_cookie.is_empty() {
            return Err(ConfigError::InvalidValue("session_cookie", String::new()));
        }

        Ok(DispatchConfig {
            app_root: self
                .dispatch
                .app_root
                .clone()
                .unwrap_or_else(application_path),
            default_controller: self.dispatch.default_controller.clone(),
            session_cookie: self.dispatch.session_cookie.clone(),
            session_timeout: Duration::from_secs(self.dispatch.session_timeout_secs),
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// A setting outside its accepted range.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}
