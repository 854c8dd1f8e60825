//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use strangler_gateway::{GatewayConfig, GatewayServer, Shutdown};

/// Start an origin that reflects every request as JSON.
///
/// The reply carries the method, path and query as received, every request
/// header, and the body. It also sets `x-origin: <name>` and a
/// `set-cookie` header so relaying can be checked.
pub async fn start_echo_origin(name: &'static str) -> SocketAddr {
    let app = Router::new().fallback(echo).with_state(name);
    serve(app).await
}

async fn echo(State(name): State<&'static str>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    let mut headers = serde_json::Map::new();
    for (key, value) in &parts.headers {
        let entry = headers.entry(key.as_str()).or_insert_with(|| json!([]));
        if let Some(values) = entry.as_array_mut() {
            values.push(json!(value.to_str().unwrap_or_default()));
        }
    }

    let payload = json!({
        "origin": name,
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&bytes),
    });

    (
        [("x-origin", name), ("set-cookie", "session=abc; Path=/")],
        axum::Json(payload),
    )
        .into_response()
}

/// Start an origin answering `200 <name>` and counting its hits.
pub async fn start_counting_origin(name: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            name
        }
    });
    (serve(app).await, hits)
}

/// Start an origin that waits `delay` before answering.
pub async fn start_slow_origin(delay: Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        Response::new(Body::from("late"))
    });
    serve(app).await
}

/// Flags observed by a hanging origin.
#[derive(Clone, Default)]
pub struct InFlight {
    /// Set when the handler starts.
    pub started: Arc<AtomicBool>,
    /// Set when the handler future is dropped before finishing.
    pub cancelled: Arc<AtomicBool>,
}

struct CancelGuard(Arc<AtomicBool>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Start an origin whose handler sleeps for `delay`, recording whether it
/// was abandoned mid-flight.
pub async fn start_hanging_origin(delay: Duration) -> (SocketAddr, InFlight) {
    let flags = InFlight::default();
    let handler_flags = flags.clone();
    let app = Router::new().fallback(move || {
        let flags = handler_flags.clone();
        async move {
            flags.started.store(true, Ordering::SeqCst);
            let guard = CancelGuard(flags.cancelled.clone());
            tokio::time::sleep(delay).await;
            std::mem::forget(guard);
            "finished"
        }
    });
    (serve(app).await, flags)
}

/// Poll `flag` until it is set or `within` elapses.
pub async fn wait_for(flag: &AtomicBool, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    flag.load(Ordering::SeqCst)
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let server = GatewayServer::new(config).expect("route table should compile");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// A client without pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn origin_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}
