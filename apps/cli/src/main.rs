//! readmepulse CLI: keeps a GitHub profile README fresh.
//!
//! Pulls a quote, GitHub stats, the contribution streak and WakaTime activity,
//! patches them into the README in place, and commits the result.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;
use readmepulse_shared::load_config;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    commands::init_tracing(&cli, &config.profile.log_file);
    commands::run(cli, config).await
}
