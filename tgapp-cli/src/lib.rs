//! # tgapp-cli
//!
//! CLI foundation: argument parsing, config loading, and an environment-backed host identity.

pub mod cli;
pub mod host;

pub use cli::{load_api_config, Cli, Commands};
pub use host::EnvIdentityProvider;
