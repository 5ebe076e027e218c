//! Configuration management module
//!
//! Handles loading configuration from multiple sources with proper precedence:
//! CLI arguments > environment variables > TOML files > defaults

use regex::Regex;

use crate::error::ConfigError;

pub mod cli;
pub mod env;
pub mod toml;

/// Default Docker endpoint when neither flag, environment, nor file names one.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Docker daemon endpoint.
    pub docker_host: String,
    /// Logging directive handed to the tracing env filter.
    pub log_level: String,
    /// Name the overlay interface takes inside containers.
    pub container_ifname: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            docker_host: DEFAULT_DOCKER_HOST.to_string(),
            log_level: "info".to_string(),
            container_ifname: "ethov".to_string(),
        }
    }
}

/// Loads configuration with full precedence: defaults, then the TOML file
/// named on the command line, then environment variables, then CLI flags.
pub fn load(args: &cli::CliArgs) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    if let Some(path) = &args.config {
        let file = toml::load_toml_config(path)?;
        config = toml::apply_toml_config(config, file);
    }
    let config = env::apply_env_config(config);
    let config = args.apply_to_config(config);
    validate(&config)?;
    Ok(config)
}

/// Interface names must satisfy the kernel: start with a letter, stay
/// within 15 bytes, and avoid slashes and whitespace.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let ifname = Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]{0,14}$")
        .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
    if !ifname.is_match(&config.container_ifname) {
        return Err(ConfigError::InvalidInterfaceName {
            name: config.container_ifname.clone(),
        });
    }
    Ok(())
}
