use clap::Parser;
use tracing::debug;

use docker_overlay_attach::commands;
use docker_overlay_attach::config::cli::{CliArgs, Command};
use docker_overlay_attach::config::{self, AppConfig};
use docker_overlay_attach::error::AppError;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let cli = CliArgs::parse();
    let config: AppConfig = config::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .init();

    debug!(
        docker_host = %config.docker_host,
        container_ifname = %config.container_ifname,
        "configuration loaded"
    );

    match &cli.command {
        Command::Attach { args } => commands::attach::run(&config, args).await,
        Command::Detach { args } => commands::detach::run(&config, args).await,
        Command::RewriteHosts { args } => commands::rewrite_hosts::run(&config, args).await,
    }
}
