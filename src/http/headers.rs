//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Copy inbound request headers onto the upstream request
//! - Strip hop-by-hop headers
//! - Attach the debug headers (`X-Strangler-Route`, `X-Original-Path`)
//! - Copy upstream response headers, dropping stale framing headers
//!
//! # Design Decisions
//! - Copying is best effort: a header that cannot be attached is skipped, never fatal
//! - Content-metadata headers only travel with a body
//! - Debug headers are appended, so client-supplied values survive
//! - The client's `Host` is forwarded as sent; the upstream client only fills it in when absent

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Service label of the chosen origin.
pub const X_STRANGLER_ROUTE: HeaderName = HeaderName::from_static("x-strangler-route");
/// Path of the inbound request, before any rewrite.
pub const X_ORIGINAL_PATH: HeaderName = HeaderName::from_static("x-original-path");

/// Connection-level headers that describe one hop only.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection" | "keep-alive" | "proxy-connection" | "te" | "trailer" | "upgrade" | "transfer-encoding"
    )
}

/// Headers describing a message body rather than the request itself.
pub fn is_content_header(name: &HeaderName) -> bool {
    let name = name.as_str();
    name.starts_with("content-") || name == "expires" || name == "last-modified"
}

/// Declared request body length, if any.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Build the upstream header map from the inbound one.
///
/// `with_body` says whether a body will be attached; without one,
/// content-metadata headers have nowhere to go and are skipped.
pub fn copy_request_headers(inbound: &HeaderMap, with_body: bool) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len() + 2);

    for (name, value) in inbound {
        if is_hop_by_hop(name) {
            continue;
        }
        if is_content_header(name) && !with_body {
            tracing::debug!(header = %name, "Skipping content header on body-less request");
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    outbound
}

/// Append the debug headers. Values that cannot be encoded are skipped.
pub fn append_debug_headers(headers: &mut HeaderMap, service_label: &str, original_path: &str) {
    for (name, value) in [(X_STRANGLER_ROUTE, service_label), (X_ORIGINAL_PATH, original_path)] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.append(name, value);
            }
            Err(e) => {
                tracing::debug!(header = %name, error = %e, "Skipping debug header");
            }
        }
    }
}

/// Copy upstream response headers onto the client response.
///
/// Additive: a name already present on `outbound` is left alone.
/// `Transfer-Encoding` and `Content-Length` are dropped so the server
/// re-frames the streamed body itself.
pub fn copy_response_headers(upstream: &HeaderMap, outbound: &mut HeaderMap) {
    for name in upstream.keys() {
        if name == header::TRANSFER_ENCODING || name == header::CONTENT_LENGTH {
            continue;
        }
        if outbound.contains_key(name) {
            continue;
        }
        for value in upstream.get_all(name) {
            outbound.append(name.clone(), value.clone());
        }
    }
}
