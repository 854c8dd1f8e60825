//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration from a file or the environment
//! - Abort the process with a clear diagnostic when that fails
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal, nothing is defaulted
//! - Runs before logging is configured, so diagnostics go to stderr

use std::path::Path;

use crate::config::loader::{load_config, load_from_env};
use crate::config::{ConfigError, GatewayConfig};
use crate::routing::RouteTable;

/// Load configuration from `path`, or from the environment preset without one.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => load_from_env(),
    }
}

/// Load configuration or exit with status 1.
pub fn load_or_exit(path: Option<&Path>) -> GatewayConfig {
    let config = match load(path) {
        Ok(config) => config,
        Err(e) => exit_with("configuration error", &e),
    };

    // Compile once up front so route table problems are also startup failures.
    if let Err(e) = RouteTable::from_config(&config) {
        exit_with("route table error", &e);
    }

    config
}

fn exit_with(context: &str, error: &dyn std::error::Error) -> ! {
    eprintln!("{context}: {error}");
    std::process::exit(1);
}
