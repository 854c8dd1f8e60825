//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml                     MONOLITH_URL, MOVIES_SERVICE_URL, ...
//!     → loader.rs (parse)              → loader.rs (environment preset)
//!                  ↘                  ↙
//!                   validation.rs (semantic checks)
//!                   → GatewayConfig (validated, immutable)
//!                   → compiled into RouteTable at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - Missing origin URLs are fatal, never defaulted
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::MigrationConfig;
pub use schema::ObservabilityConfig;
pub use schema::OriginConfig;
pub use schema::RouteConfig;
pub use schema::TimeoutConfig;
