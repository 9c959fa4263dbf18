//! ---
//! seed_section: "06-cli"
//! seed_subsection: "binary"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Control CLI for the Deskseed pipelines."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deskseed_common::logging;
use deskseed_config::AppConfig;

mod provision;
mod reclaim;

/// Default locations inspected for the config file, in order.
const CONFIG_CANDIDATES: [&str; 2] = ["deskseed.toml", "/etc/deskseed/deskseed.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Deskseed synthetic helpdesk data control utility",
    long_about = None
)]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the config file (overrides the default candidates)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Create a run of organizations, users, and tickets")]
    Provision(provision::ProvisionArgs),
    #[command(about = "Identify and delete previously provisioned entities")]
    Reclaim(reclaim::ReclaimArgs),
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load(&[path]),
        None => AppConfig::load(&CONFIG_CANDIDATES),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Provision(args) => provision::run(&config, args).await?,
        Commands::Reclaim(args) => reclaim::run(&config, args).await?,
    }
    Ok(())
}
