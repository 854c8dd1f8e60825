//! Strangler Fig Gateway
//!
//! A single ingress that migrates traffic from a legacy monolith to new
//! services one path prefix at a time.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 STRANGLER GATEWAY                 │
//!                         │                                                   │
//!     Client Request      │  ┌─────────┐    ┌────────────┐    ┌───────────┐   │
//!     ────────────────────┼─▶│  http   │───▶│ RouteTable │───▶│  Split    │   │
//!                         │  │ server  │    │  (lookup)  │    │  Decider  │   │
//!                         │  └─────────┘    └────────────┘    └─────┬─────┘   │
//!                         │                                         │         │
//!                         │                                         ▼         │      Monolith
//!     Client Response     │  ┌─────────┐                     ┌───────────┐    │ ───▶ Movies-Service
//!     ◀───────────────────┼──│ relay   │◀────────────────────│ Request   │────┼───▶ Events-Service
//!                         │  │ (stream)│                     │ Forwarder │    │
//!                         │  └─────────┘                     └───────────┘    │
//!                         │                                                   │
//!                         │  config · observability · lifecycle               │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use strangler_gateway::lifecycle::{signals, startup};
use strangler_gateway::observability::{logging, metrics};
use strangler_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "strangler-gateway")]
#[command(about = "Strangler fig HTTP gateway", long_about = None)]
struct Cli {
    /// TOML configuration file. Without it the gateway is configured from
    /// MONOLITH_URL, MOVIES_SERVICE_URL, EVENTS_SERVICE_URL, GRADUAL_MIGRATION
    /// and MOVIES_MIGRATION_PERCENT.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Exits the process on any configuration error.
    let config = startup::load_or_exit(cli.config.as_deref());

    logging::init_logging(&config.observability);

    tracing::info!("strangler-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origins = config.origins.len(),
        routes = config.routes.len(),
        migration_enabled = config.migration.enabled,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );
    for origin in &config.origins {
        tracing::info!(origin = %origin.name, label = %origin.label(), url = %origin.url, "Origin");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_handler(shutdown);

    let server = GatewayServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
