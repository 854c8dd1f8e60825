//! Gateway-generated responses.
//!
//! # Responsibilities
//! - Fixed texts for the health and root endpoints
//! - Map routing and forwarding errors to HTTP status codes
//!
//! # Design Decisions
//! - Upstream network failures are 504 Gateway Timeout and name the origin
//! - Errors never escape the handler; every failure becomes a response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::forward::ForwardError;
use crate::routing::RoutingError;

/// Body of `GET /health`.
pub const HEALTH_TEXT: &str = "Strangler Fig Proxy is healthy";

/// Body of `GET /` when no route claims the root path.
pub const ROOT_TEXT: &str = "Proxy Service is running and waiting for traffic on /api/* routes.";

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        match self {
            RoutingError::NotFound { .. } => (StatusCode::NOT_FOUND, "No matching route found").into_response(),
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = match self {
            ForwardError::InvalidTarget { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::Unreachable { .. } | ForwardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = format!("Proxy error reaching {}: {}", self.service(), self.detail());
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_routing_error_is_404() {
        let response = RoutingError::NotFound { path: "/x".into() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_forward_errors() {
        let timeout = ForwardError::Timeout {
            service: "Events-Service".into(),
            after: Duration::from_secs(1),
        };
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let invalid = ForwardError::InvalidTarget {
            service: "Monolith".into(),
            reason: "bad".into(),
        };
        assert_eq!(invalid.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
