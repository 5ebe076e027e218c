//! TOML configuration file parsing

use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ConfigError;

/// TOML configuration structure
#[derive(Debug, Deserialize)]
pub struct TomlConfig {
    pub docker: Option<DockerConfig>,
    pub network: Option<NetworkConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Docker configuration
#[derive(Debug, Deserialize)]
pub struct DockerConfig {
    pub host: Option<String>,
}

/// Network configuration
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    pub container_ifname: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Load configuration from TOML file
pub fn load_toml_config(path: &str) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_string(),
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
}

/// Fold file values over the base configuration.
pub fn apply_toml_config(mut base_config: AppConfig, file: TomlConfig) -> AppConfig {
    if let Some(docker) = file.docker {
        if let Some(host) = docker.host {
            base_config.docker_host = host;
        }
    }
    if let Some(network) = file.network {
        if let Some(ifname) = network.container_ifname {
            base_config.container_ifname = ifname;
        }
    }
    if let Some(logging) = file.logging {
        if let Some(level) = logging.level {
            base_config.log_level = level;
        }
    }
    base_config
}
