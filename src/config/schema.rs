//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the strangler gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origins the gateway can forward to.
    pub origins: Vec<OriginConfig>,

    /// Route definitions mapping path patterns to origins.
    pub routes: Vec<RouteConfig>,

    /// Origin receiving any non-root request no route matched.
    pub default_origin: Option<String>,

    /// Global gradual-migration switch.
    pub migration: MigrationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Upstream origin definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin identifier, referenced by routes.
    pub name: String,

    /// Human-readable service label for debug headers and logs.
    /// Defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,

    /// Absolute base URL (e.g., "http://monolith:8080").
    pub url: String,

    /// Deadline for receiving response headers, overriding
    /// `timeouts.upstream_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl OriginConfig {
    pub fn new(name: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
            url: url.into(),
            timeout_secs: None,
        }
    }

    /// The label to use for this origin.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Route configuration for a single feature.
///
/// Compiles into an exact-path rule followed by a wildcard rule, both
/// sharing the same origins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Literal path (e.g., "/api/movies"). With `segments`, the parent path
    /// the segment hangs off (e.g., "/api").
    pub path: String,

    /// Alternatives for a single segment after `path`.
    #[serde(default)]
    pub segments: Vec<String>,

    /// Emit a rule for the bare path.
    #[serde(default = "default_true")]
    pub exact: bool,

    /// Emit a rule capturing everything below the path.
    #[serde(default = "default_true")]
    pub wildcard: bool,

    /// Origin receiving traffic by default.
    pub primary: String,

    /// Migration target for a share of the traffic.
    #[serde(default)]
    pub secondary: Option<String>,

    /// Share of matched traffic (0-100) sent to `secondary`.
    #[serde(default)]
    pub migration_percent: Option<u8>,

    /// Forward only the captured subpath instead of the full path.
    #[serde(default)]
    pub strip_prefix: bool,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

impl RouteConfig {
    /// A route sending everything under `path` to `primary`.
    pub fn new(name: impl Into<String>, path: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            segments: Vec::new(),
            exact: true,
            wildcard: true,
            primary: primary.into(),
            secondary: None,
            migration_percent: None,
            strip_prefix: false,
            priority: 0,
        }
    }

    pub fn with_migration(mut self, secondary: impl Into<String>, percent: u8) -> Self {
        self.secondary = Some(secondary.into());
        self.migration_percent = Some(percent);
        self
    }

    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn strip_prefix(mut self) -> Self {
        self.strip_prefix = true;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Gradual migration settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MigrationConfig {
    /// When false, split routes always use their primary origin.
    pub enabled: bool,
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for an origin to return response headers, in seconds.
    pub upstream_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
