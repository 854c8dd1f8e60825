//! Strangler fig HTTP gateway.
//!
//! Routes each request to the legacy monolith or a migrated service by path,
//! optionally splitting a feature's traffic by percentage, and proxies it
//! transparently.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
