mod application;
mod domain;
mod infrastructure;
mod presentation;

use clap::Parser;
use tracing::{error, info};

use crate::infrastructure::{AppConfig, AppContainer};
use crate::presentation::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!("Initializing EventBot");
    let container = AppContainer::new(&config).await?;

    cli::run(cli.command(), &container, &config).await
}
