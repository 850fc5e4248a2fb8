use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Dynamic Authorization Server configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local address to bind (all interfaces by default)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// UDP port for Disconnect/CoA requests
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Shared secret with the Dynamic Authorization Client
    #[serde(default)]
    pub secret: String,

    /// The single AAA server allowed to send requests
    #[serde(default)]
    pub client_address: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,

    /// Audit log file path (JSON lines, optional)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    3799 // RFC 5176 Section 3
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            secret: String::new(),
            client_address: None,
            log_level: None,
            audit_log_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr: IpAddr = self.listen_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("Invalid listen address: {}", self.listen_address))
        })?;
        Ok(SocketAddr::new(addr, self.listen_port))
    }

    /// Parse the configured client address
    pub fn client_ip(&self) -> Result<Option<IpAddr>, ConfigError> {
        self.client_address
            .as_deref()
            .map(|address| {
                address.parse::<IpAddr>().map_err(|_| {
                    ConfigError::Invalid(format!("Invalid client address: {}", address))
                })
            })
            .transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.listen_port == 0 {
            return Err(ConfigError::Invalid("Port cannot be 0".to_string()));
        }

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Secret cannot be empty".to_string()));
        }

        if self.client_ip()?.is_none() {
            return Err(ConfigError::Invalid(
                "client_address is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        Config {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 3799,
            secret: "testing123".to_string(),
            client_address: Some("192.168.1.10".to_string()),
            log_level: Some("info".to_string()),
            audit_log_path: Some("/var/log/radius/das-audit.log".to_string()),
        }
    }
}
