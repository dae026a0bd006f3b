//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Amazon storefront being watched
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Hours between periodic price checks
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Currency label used in alert messages
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Outgoing mail settings
    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_base_url() -> String {
    "https://www.amazon.com.mx".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_hours() -> u64 {
    12
}

fn default_currency() -> String {
    "MXN".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            interval_hours: default_interval_hours(),
            currency: default_currency(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-price-watch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(base_url) = std::env::var("AMZ_BASE_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }

        if let Ok(server) = std::env::var("SMTP_SERVER") {
            if !server.is_empty() {
                self.smtp.server = server;
            }
        }

        if let Ok(sender) = std::env::var("MY_EMAIL") {
            if !sender.is_empty() {
                self.smtp.sender = Some(sender);
            }
        }

        if let Ok(password) = std::env::var("MY_PASSWORD") {
            if !password.is_empty() {
                self.smtp.password = Some(password);
            }
        }

        self
    }

    /// Returns the periodic check interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }
}

/// Outgoing SMTP settings for price alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Mail relay hostname
    #[serde(default = "default_smtp_server")]
    pub server: String,

    /// Submission port (STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender address, also used as the login user
    #[serde(default)]
    pub sender: Option<String>,

    /// Sender app password
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            sender: None,
            password: None,
        }
    }
}

impl SmtpConfig {
    /// Returns the sender/password pair when both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.sender.as_deref(), self.password.as_deref()) {
            (Some(sender), Some(password)) if !sender.is_empty() && !password.is_empty() => {
                Some((sender, password))
            }
            _ => None,
        }
    }

    /// True when alerts can actually be sent.
    pub fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }
}
