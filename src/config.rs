use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const DEFAULT_HOME_MESSAGE: &str = "This is the home page.";
const DEFAULT_DOWN_MESSAGE: &str = "There is usually something here, but it is down right now.";
const DEFAULT_INVALID_MESSAGE: &str = "There is nothing running here.";
const DEFAULT_ERROR_MESSAGE: &str = "Server error.";

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("subdomain '{0}' maps to port 0")]
    ZeroPort(String),
    #[error("fallback port must not be 0")]
    ZeroFallbackPort,
}

/// Global configuration for the proxy
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// The base domain the proxy serves (e.g. "example.com")
    pub host: String,

    /// Mapping from subdomain to local backend port. Use the empty string
    /// to indicate the home page port.
    #[serde(default)]
    pub subdomains: HashMap<String, u16>,

    /// If set, requests targeting a subdomain not present in the mapping
    /// are routed to this port instead of being rejected
    #[serde(default)]
    pub fallback_port: Option<u16>,

    /// Text returned by responses the proxy answers itself
    #[serde(default)]
    pub messages: Messages,

    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Plain-text bodies for the responses the proxy synthesizes
#[derive(Debug, Deserialize, Clone)]
pub struct Messages {
    /// Returned when no home page port is configured (200)
    #[serde(default = "default_home_message")]
    pub home: String,

    /// Returned for a request to an unknown subdomain (400)
    #[serde(default = "default_invalid_message")]
    pub invalid: String,

    /// Returned when the targeted backend is not accepting connections (503)
    #[serde(default = "default_down_message")]
    pub down: String,

    /// Returned for any other backend failure (500)
    #[serde(default = "default_error_message")]
    pub error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            home: default_home_message(),
            invalid: default_invalid_message(),
            down: default_down_message(),
            error: default_error_message(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Listening port (default: 80)
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_listen_port(),
        }
    }
}

fn default_home_message() -> String {
    DEFAULT_HOME_MESSAGE.to_string()
}

fn default_invalid_message() -> String {
    DEFAULT_INVALID_MESSAGE.to_string()
}

fn default_down_message() -> String {
    DEFAULT_DOWN_MESSAGE.to_string()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    80
}

impl Config {
    /// Create a configuration for the given base host with no subdomain
    /// mappings and default messages
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            subdomains: HashMap::new(),
            fallback_port: None,
            messages: Messages::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        for (subdomain, port) in &self.subdomains {
            if *port == 0 {
                return Err(ConfigError::ZeroPort(subdomain.clone()));
            }
        }

        if self.fallback_port == Some(0) {
            return Err(ConfigError::ZeroFallbackPort);
        }

        Ok(())
    }
}
