//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → [routing layer picks rule and origin]
//!     → forward.rs (build upstream request, send via pooled client)
//!     → headers.rs (copy rules in both directions)
//!     → response.rs (error mapping)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, RequestForwarder};
pub use request::X_REQUEST_ID;
pub use server::GatewayServer;
