//! Command-line argument parsing

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Command-line arguments structure
#[derive(Parser, Debug)]
#[command(name = "docker-overlay-attach")]
#[command(about = "Attach and detach Docker containers to an overlay network bridge")]
#[command(version)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, help = "Set the logging level")]
    pub log_level: Option<String>,

    /// Docker daemon endpoint
    #[arg(
        long,
        help = "Docker endpoint, e.g. unix:///var/run/docker.sock or tcp://host:2375"
    )]
    pub docker_host: Option<String>,

    /// Interface name created inside containers
    #[arg(long, help = "Name of the overlay interface inside containers")]
    pub container_ifname: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations. Each takes its raw argument vector; the policy flags inside
/// it belong to the operation, not to this parser.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach a running container to the overlay bridge
    Attach {
        /// [--no-multicast-route] [--keep-tx-on] [--hairpin-mode=false] <container-id> <bridge-name> <mtu> <cidr>...
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove a container's overlay addresses and interface
    Detach {
        /// <container-id> <cidr>...
        args: Vec<String>,
    },
    /// Rewrite a container's hosts file with its overlay addresses
    RewriteHosts {
        /// <hosts-path> <fqdn> <image> <cidrs> [name:address...]
        args: Vec<String>,
    },
}

impl CliArgs {
    /// Apply CLI arguments over base configuration
    pub fn apply_to_config(&self, mut base_config: AppConfig) -> AppConfig {
        if let Some(ref level) = self.log_level {
            base_config.log_level = level.clone();
        }

        if let Some(ref host) = self.docker_host {
            base_config.docker_host = host.clone();
        }

        if let Some(ref ifname) = self.container_ifname {
            base_config.container_ifname = ifname.clone();
        }

        base_config
    }
}
