//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tgapp_api::ApiConfig;
use tgapp_core::Role;

#[derive(Parser)]
#[command(name = "tgapp")]
#[command(about = "Mini-App session CLI: resolve, register, whoami", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Account service base URL (overrides API_BASE_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Also write logs to this file (overrides LOG_FILE).
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the session for the identity in TG_* env vars and print the outcome.
    Resolve,
    /// Resolve, and if the identity has no account yet, register it.
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Print the identity claim the host environment exposes.
    Whoami,
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    s.parse().map_err(|e: tgapp_core::CoreError| e.to_string())
}

/// Load ApiConfig from environment. If `api_url` is provided it overrides API_BASE_URL.
pub fn load_api_config(api_url: Option<String>) -> Result<ApiConfig> {
    let mut config = ApiConfig::from_env()?;
    if let Some(url) = api_url {
        config.base_url = url;
    }
    config.validate()?;
    Ok(config)
}
