//! Pare CLI - Savings-plan projector
//!
//! Usage:
//!   pare analysis --months 6      Show expense analysis
//!   pare plan --target 600        Request a cut plan
//!   pare targets                  Show suggested targets
//!   pare session                  Interactive planning session

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(&cli)?;
    let service = commands::build_service(&config)?;

    match cli.command {
        Commands::Analysis { months, json } => {
            commands::cmd_analysis(&service, &config, months.unwrap_or(config.months), json).await
        }
        Commands::Plan {
            target,
            preset,
            months,
            json,
        } => {
            commands::cmd_plan(
                service,
                &config,
                months.unwrap_or(config.months),
                target.as_deref(),
                preset.as_deref(),
                json,
            )
            .await
        }
        Commands::Targets { months } => {
            commands::cmd_targets(&service, &config, months.unwrap_or(config.months)).await
        }
        Commands::QuickWins { json } => commands::cmd_quick_wins(&service, &config, json).await,
        Commands::Session { months } => {
            commands::cmd_session(service, &config, months.unwrap_or(config.months)).await
        }
        Commands::Config => commands::cmd_config(&config),
    }
}
