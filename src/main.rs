//! Switchyard - resource registry and fallback router
//!
//! CLI entry point.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod config;
mod loader;
mod manifest;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let config = loader::load_config()?;
    init_tracing(&config.logging);

    debug!("Starting Switchyard v{}", env!("CARGO_PKG_VERSION"));
    if cli.command.is_some() && config.registry.manifests.is_empty() && cli.manifests.is_empty() {
        warn!("No manifests configured, the registry will be empty (use --manifest or registry.manifests)");
    }

    cli::run(cli, config).await
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
