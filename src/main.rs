use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use talentscout::cli::{handle_command, Cli, Command};
use talentscout::core::{ConfigManager, LocalStore, ServiceClient};
use talentscout::PipelineClient;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("talentscout=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::load()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(path) = cli.state_path.clone() {
        config = config.with_state_path(path);
    }

    init_logging(&config.log_path)?;

    info!("Environment: {}", config.environment);
    info!("Backend: {}", config.service.api_url);
    info!("Client state: {}", config.state_path.display());

    let api = ServiceClient::new(&config.service.api_url, config.service.timeout_seconds)?;
    let client = PipelineClient::new(
        api,
        LocalStore::new(config.state_path.clone()),
        config.service.poll_interval,
    );

    handle_command(cli.command.unwrap_or(Command::Shell), client).await
}
