//! Environment variable configuration handling

use std::env;

use crate::config::AppConfig;

/// Environment variable prefix for tool-specific overrides.
const ENV_PREFIX: &str = "DOCKER_OVERLAY_ATTACH_";

/// Apply environment variable configuration over base configuration.
///
/// `DOCKER_HOST` is honored unprefixed because that is the Docker-wide
/// convention; an empty value counts as unset, matching the Docker CLI.
/// The remaining overrides carry the tool prefix.
pub fn apply_env_config(mut base_config: AppConfig) -> AppConfig {
    if let Ok(host) = env::var("DOCKER_HOST") {
        if !host.is_empty() {
            base_config.docker_host = host;
        }
    }

    if let Ok(level) = env::var(format!("{ENV_PREFIX}LOG_LEVEL")) {
        base_config.log_level = level;
    }

    if let Ok(ifname) = env::var(format!("{ENV_PREFIX}CONTAINER_IFNAME")) {
        base_config.container_ifname = ifname;
    }

    base_config
}

#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
