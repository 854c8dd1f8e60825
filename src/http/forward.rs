//! Request forwarding to origins.
//!
//! # Responsibilities
//! - Build the upstream URL from the routing decision
//! - Reissue the inbound request (method, headers, streamed body) against the origin
//! - Relay status, headers and streamed body back to the client
//! - Translate network failures into `ForwardError`
//!
//! # Design Decisions
//! - One pooled client shared by every request
//! - Bodies are never buffered in either direction
//! - The timeout covers the wait for response headers, not the body stream
//! - Dropping the returned future (client gone) aborts the upstream call

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::http::headers::{append_debug_headers, content_length, copy_request_headers, copy_response_headers};
use crate::routing::{Origin, PathRewrite, RoutingDecision};

/// Failure reaching an origin.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The upstream URL could not be built.
    #[error("invalid target url for {service}: {reason}")]
    InvalidTarget { service: String, reason: String },

    /// Connection refused, DNS failure, reset, or a malformed response.
    #[error("{service} unreachable: {source}")]
    Unreachable {
        service: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// No response headers within the deadline.
    #[error("{service} did not respond within {after:?}")]
    Timeout { service: String, after: Duration },
}

impl ForwardError {
    /// Label of the origin that failed.
    pub fn service(&self) -> &str {
        match self {
            ForwardError::InvalidTarget { service, .. }
            | ForwardError::Unreachable { service, .. }
            | ForwardError::Timeout { service, .. } => service,
        }
    }

    /// Short kind for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidTarget { .. } => "invalid_target",
            ForwardError::Unreachable { .. } => "unreachable",
            ForwardError::Timeout { .. } => "timeout",
        }
    }

    /// Human-readable detail including the full source chain.
    pub fn detail(&self) -> String {
        match self {
            ForwardError::InvalidTarget { reason, .. } => reason.clone(),
            ForwardError::Unreachable { source, .. } => error_chain(source),
            ForwardError::Timeout { after, .. } => format!("no response within {after:?}"),
        }
    }
}

fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Build the upstream URI: origin base + effective path + original query.
pub fn target_uri(origin: &Origin, rewrite: PathRewrite, original: &Uri, subpath: &str) -> Result<Uri, String> {
    let path = match rewrite {
        PathRewrite::Preserve => original.path().to_string(),
        PathRewrite::StripPrefix if subpath.is_empty() => String::new(),
        PathRewrite::StripPrefix => format!("/{subpath}"),
    };

    let mut target = if path.is_empty() {
        // Origin root, keeping any base path the origin was configured with.
        origin.url.as_str().to_string()
    } else {
        format!("{}{}", origin.base(), path)
    };

    if let Some(query) = original.query() {
        target.push('?');
        target.push_str(query);
    }

    target.parse::<Uri>().map_err(|e| e.to_string())
}

/// Forwards requests to origins over a shared connection pool.
#[derive(Clone)]
pub struct RequestForwarder {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl RequestForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(connector);

        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Forward `inbound` to the origin chosen in `decision` and return the
    /// streamed upstream response.
    pub async fn forward(
        &self,
        inbound: Request<Body>,
        decision: &RoutingDecision<'_>,
    ) -> Result<Response<Body>, ForwardError> {
        let service = decision.service_label();
        let (parts, body) = inbound.into_parts();

        let target = target_uri(decision.origin, decision.rewrite, &parts.uri, &decision.subpath).map_err(
            |reason| ForwardError::InvalidTarget {
                service: service.to_string(),
                reason,
            },
        )?;

        let with_body = content_length(&parts.headers).is_some_and(|len| len > 0);
        let mut headers = copy_request_headers(&parts.headers, with_body);
        append_debug_headers(&mut headers, service, parts.uri.path());

        let mut request = Request::new(if with_body { body } else { Body::empty() });
        *request.method_mut() = parts.method;
        *request.uri_mut() = target;
        *request.headers_mut() = headers;

        tracing::debug!(
            service = %service,
            target = %request.uri(),
            method = %request.method(),
            with_body,
            "Forwarding request"
        );

        let deadline = decision.origin.timeout.unwrap_or(self.upstream_timeout);
        let response = match tokio::time::timeout(deadline, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(ForwardError::Unreachable {
                    service: service.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ForwardError::Timeout {
                    service: service.to_string(),
                    after: deadline,
                })
            }
        };

        let (upstream, body) = response.into_parts();
        let mut relayed = Response::new(Body::new(body));
        *relayed.status_mut() = upstream.status;
        copy_response_headers(&upstream.headers, relayed.headers_mut());

        Ok(relayed)
    }
}
