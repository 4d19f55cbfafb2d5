//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration from file, env and CLI flags
//! - `build_service` - Shared utility to construct the expense service
//! - `cmd_config` - Show the effective configuration

use anyhow::{Context, Result};
use pare_core::{BackendKind, Config, ServiceClient};

use crate::cli::Cli;

/// Load config layers, then apply command-line overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, cli.api_url.as_deref(), cli.mock);
    Ok(config)
}

/// Command-line flags win over every other layer
pub fn apply_cli_overrides(config: &mut Config, api_url: Option<&str>, mock: bool) {
    if let Some(url) = api_url {
        config.base_url = url.trim().trim_end_matches('/').to_string();
        config.backend = BackendKind::Http;
    }
    if mock {
        config.backend = BackendKind::Mock;
    }
}

pub fn build_service(config: &Config) -> Result<ServiceClient> {
    let service = ServiceClient::from_config(config).context("Failed to create HTTP client")?;
    if config.backend == BackendKind::Mock {
        tracing::info!("Using mock backend");
    }
    Ok(service)
}

pub fn cmd_config(config: &Config) -> Result<()> {
    println!();
    println!("⚙️  Pare Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    match &config.source {
        Some(path) => println!("   File:       {}", path.display()),
        None => println!("   File:       (embedded defaults)"),
    }
    println!("   Backend:    {}", config.backend.as_str());
    println!("   API URL:    {}", config.base_url);
    println!("   Timeout:    {}s", config.timeout.as_secs());
    println!("   Months:     {}", config.months);
    println!("   Pie limit:  {}", config.pie_limit);
    println!("   Currency:   {}", config.currency);
    Ok(())
}
