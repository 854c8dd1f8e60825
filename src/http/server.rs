//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health, root and proxy handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch requests to the route table and forwarder
//! - Observability (metrics, request IDs)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::forward::RequestForwarder;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{HEALTH_TEXT, ROOT_TEXT};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{RouteTable, RouteTableError, RoutingError, SplitDecider};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub splitter: SplitDecider,
    pub forwarder: RequestForwarder,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Compile the route table and build the router.
    pub fn new(config: GatewayConfig) -> Result<Self, RouteTableError> {
        let routes = Arc::new(RouteTable::from_config(&config)?);

        tracing::info!(
            rules = routes.rules().len(),
            default_origin = ?config.default_origin,
            migration_enabled = config.migration.enabled,
            "Route table compiled"
        );
        for rule in routes.rules().iter().chain(routes.fallback()) {
            tracing::info!(
                rule = %rule.name,
                pattern = %rule.matcher.pattern(),
                primary = %rule.primary.label,
                secondary = ?rule.migration.as_ref().map(|m| m.origin.label.as_str()),
                percent = ?rule.migration.as_ref().map(|m| m.percent),
                "Route"
            );
        }

        let state = AppState {
            routes,
            splitter: SplitDecider::new(config.migration.enabled),
            forwarder: RequestForwarder::new(&config.timeouts),
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The configured router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn health_handler() -> &'static str {
    HEALTH_TEXT
}

/// Main proxy handler.
/// Resolves the route, applies the split and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let path = uri.path();

    let decision = match state.routes.resolve(&method, path, &state.splitter) {
        Ok(decision) => decision,
        Err(RoutingError::NotFound { .. }) if path == "/" && (method == Method::GET || method == Method::HEAD) => {
            return (StatusCode::OK, ROOT_TEXT).into_response();
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return e.into_response();
        }
    };

    let service = decision.service_label().to_string();
    if let Some(split) = decision.split {
        metrics::record_split(decision.rule, split.as_str());
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        service = %service,
        rule = %decision.rule,
        percent = ?decision.percent,
        "Routing request"
    );

    match state.forwarder.forward(request, &decision).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                service = %service,
                status = %response.status(),
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), response.status().as_u16(), &service, start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                service = %service,
                error = %e.detail(),
                "Proxy error"
            );
            metrics::record_upstream_error(&service, e.kind());
            let response = e.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), &service, start_time);
            response
        }
    }
}
