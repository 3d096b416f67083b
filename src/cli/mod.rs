//! CLI module for Switchyard
//!
//! Provides inspection commands over a registry built from manifests:
//! - `list`: registered resources, highest priority first
//! - `inspect`: registry statistics, missing dependencies and cycles
//! - `plan`: parallel levels and execution order for a task file
//! - `check`: availability of a candidate list, without executing anything
//! - `route`: route a request through candidates with the echo executor

use crate::config::AppConfig;
use crate::manifest;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use switchyard_core::{ResourceRegistry, ResourceType};

pub mod plan;
pub mod resources;
pub mod route;

/// Switchyard resource registry and router CLI
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Resource registry, dependency planning and fallback routing")]
#[command(version)]
pub struct Cli {
    /// Extra resource manifests, loaded after the configured ones
    #[arg(short, long = "manifest", global = true)]
    pub manifests: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered resources
    List {
        /// Only this resource type
        #[arg(short = 't', long = "type")]
        resource_type: Option<ResourceType>,
        /// Only this source tag
        #[arg(short, long)]
        source: Option<String>,
        /// Skip disabled resources
        #[arg(long)]
        enabled: bool,
    },
    /// Show registry statistics, missing dependencies and cycles
    Inspect,
    /// Plan a task file into parallel levels
    Plan {
        /// YAML list of tasks
        tasks: PathBuf,
    },
    /// Report which candidates the router would accept
    Check {
        /// Candidate namespaces in preference order
        #[arg(required = true)]
        candidates: Vec<String>,
    },
    /// Route a request through candidates using the echo executor
    Route {
        /// Candidate namespaces in preference order
        #[arg(required = true)]
        candidates: Vec<String>,
        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        request: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let registry = build_registry(&config, &cli.manifests)?;
    match command {
        Commands::List {
            resource_type,
            source,
            enabled,
        } => resources::list(&registry, resource_type, source, enabled),
        Commands::Inspect => resources::inspect(&registry),
        Commands::Plan { tasks } => plan::run(&registry, &tasks),
        Commands::Check { candidates } => route::check(registry, &config, &candidates).await,
        Commands::Route {
            candidates,
            request,
        } => route::route(registry, &config, &candidates, &request).await,
    }
}

fn build_registry(config: &AppConfig, extra: &[PathBuf]) -> Result<ResourceRegistry> {
    let paths: Vec<&PathBuf> = config.registry.manifests.iter().chain(extra).collect();
    manifest::load_registry(&paths, &config.registry.default_source)
}
