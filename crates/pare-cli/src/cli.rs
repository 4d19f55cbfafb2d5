//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pare - Plan expense cuts toward a monthly savings goal
#[derive(Parser)]
#[command(name = "pare")]
#[command(about = "Savings-plan projector for a personal finance backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Finance backend base URL (overrides config and PARE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: ~/.config/pare/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the built-in mock backend instead of the REST API
    #[arg(long, global = true)]
    pub mock: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the expense analysis and categories with savings potential
    Analysis {
        /// Months of history to analyze (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        months: Option<u32>,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Request a cut plan for a monthly savings target
    Plan {
        /// Monthly savings target (defaults to 15% of monthly expenses)
        #[arg(short, long, conflicts_with = "preset")]
        target: Option<String>,

        /// Target preset: economical (10%), default (15%), moderate (20%), ambitious (30%)
        #[arg(short, long)]
        preset: Option<String>,

        /// Months of history to analyze (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        months: Option<u32>,

        /// Print plan, chart series and deltas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show suggested savings targets for the current analysis
    Targets {
        /// Months of history to analyze (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        months: Option<u32>,
    },

    /// List quick wins (small changes with immediate impact)
    QuickWins {
        /// Print raw JSON instead of a list
        #[arg(long)]
        json: bool,
    },

    /// Interactive planning session reading targets from stdin
    Session {
        /// Months of history to analyze (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        months: Option<u32>,
    },

    /// Show the effective configuration
    Config,
}
