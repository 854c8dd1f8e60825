//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes and their origins
//! - Look up the matching route for a request path
//! - Resolve the concrete origin, applying the traffic split
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Priority is explicit: higher `priority` first, ties keep declaration order
//! - Within a feature the exact rule precedes the wildcard rule
//! - The default-origin catch-all is always evaluated last and never claims `/`
//! - Explicit NotFound rather than silent default

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, OriginConfig, RouteConfig};
use crate::config::validation::check_origin_url;
use crate::routing::matcher::{
    CatchAllMatcher, ExactMatcher, Matcher, SegmentSetMatcher, WildcardMatcher,
};
use crate::routing::split::{Split, SplitDecider};

/// An upstream HTTP service.
#[derive(Debug, Clone)]
pub struct Origin {
    /// Config key, e.g. `monolith`.
    pub name: String,
    /// Service label, e.g. `Movies-Service`.
    pub label: String,
    /// Base URL as configured.
    pub url: Url,
    /// Deadline for response headers, overriding the gateway default.
    pub timeout: Option<Duration>,
}

impl Origin {
    pub fn from_config(config: &OriginConfig) -> Result<Self, RouteTableError> {
        let url = check_origin_url(&config.url).map_err(|reason| RouteTableError::InvalidOriginUrl {
            origin: config.name.clone(),
            reason,
        })?;

        Ok(Self {
            name: config.name.clone(),
            label: config.label().to_string(),
            url,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

/// How the upstream path is derived from the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRewrite {
    /// Forward the full original path.
    Preserve,
    /// Forward only `/subpath`, or the origin root when it is empty.
    StripPrefix,
}

/// Secondary origin of a partially-migrated route.
#[derive(Debug, Clone)]
pub struct Migration {
    pub origin: Arc<Origin>,
    /// Share of matched traffic (0-100) sent to `origin`.
    pub percent: u8,
}

/// A compiled routing rule.
#[derive(Debug)]
pub struct RouteRule {
    pub name: String,
    pub matcher: Box<dyn Matcher>,
    pub primary: Arc<Origin>,
    pub migration: Option<Migration>,
    pub rewrite: PathRewrite,
}

/// A rule together with what it captured from the path.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub rule: &'a RouteRule,
    pub subpath: String,
}

/// The resolved target for one request.
#[derive(Debug, Clone)]
pub struct RoutingDecision<'a> {
    pub rule: &'a str,
    pub origin: &'a Origin,
    /// `None` for rules without a secondary origin.
    pub split: Option<Split>,
    /// Configured share for split rules, for logging.
    pub percent: Option<u8>,
    pub subpath: String,
    pub rewrite: PathRewrite,
}

impl RoutingDecision<'_> {
    /// Label for debug headers and logs. Never used for behavior.
    pub fn service_label(&self) -> &str {
        &self.origin.label
    }
}

/// Per-request routing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route matches '{path}'")]
    NotFound { path: String },
}

/// Failure compiling the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route '{route}' references unknown origin '{origin}'")]
    UnknownOrigin { route: String, origin: String },

    #[error("origin '{origin}' has an invalid url: {reason}")]
    InvalidOriginUrl { origin: String, reason: String },

    #[error("route '{0}' has a secondary origin without a migration percent")]
    MissingPercent(String),

    #[error("route '{route}' migration percent {percent} exceeds 100")]
    PercentOutOfRange { route: String, percent: u8 },
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    fallback: Option<RouteRule>,
}

impl RouteTable {
    /// Build a table from rules already in priority order.
    pub fn new(rules: Vec<RouteRule>, fallback: Option<Arc<Origin>>) -> Self {
        let fallback = fallback.map(|origin| RouteRule {
            name: "default".to_string(),
            matcher: Box::new(CatchAllMatcher),
            primary: origin,
            migration: None,
            rewrite: PathRewrite::Preserve,
        });
        Self { rules, fallback }
    }

    /// Compile the configured origins and routes.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        let mut origins = HashMap::new();
        for origin in &config.origins {
            origins.insert(origin.name.as_str(), Arc::new(Origin::from_config(origin)?));
        }

        let lookup = |route: &str, name: &str| {
            origins
                .get(name)
                .cloned()
                .ok_or_else(|| RouteTableError::UnknownOrigin {
                    route: route.to_string(),
                    origin: name.to_string(),
                })
        };

        // Stable sort keeps declaration order among equal priorities.
        let mut routes: Vec<&RouteConfig> = config.routes.iter().collect();
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut rules = Vec::with_capacity(routes.len() * 2);
        for route in routes {
            let primary = lookup(route.name.as_str(), route.primary.as_str())?;
            let migration = match (&route.secondary, route.migration_percent) {
                (Some(_), Some(percent)) if percent > 100 => {
                    return Err(RouteTableError::PercentOutOfRange {
                        route: route.name.clone(),
                        percent,
                    })
                }
                (Some(secondary), Some(percent)) => Some(Migration {
                    origin: lookup(route.name.as_str(), secondary.as_str())?,
                    percent,
                }),
                (Some(_), None) => return Err(RouteTableError::MissingPercent(route.name.clone())),
                (None, _) => None,
            };
            let rewrite = if route.strip_prefix {
                PathRewrite::StripPrefix
            } else {
                PathRewrite::Preserve
            };

            for (suffix, matcher) in compile_matchers(route) {
                rules.push(RouteRule {
                    name: format!("{}:{}", route.name, suffix),
                    matcher,
                    primary: primary.clone(),
                    migration: migration.clone(),
                    rewrite,
                });
            }
        }

        let fallback = match &config.default_origin {
            Some(name) => Some(lookup("default", name.as_str())?),
            None => None,
        };

        Ok(Self::new(rules, fallback))
    }

    /// Rules in evaluation order, excluding the catch-all.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn fallback(&self) -> Option<&RouteRule> {
        self.fallback.as_ref()
    }

    /// Find the first rule matching `path`. The method is accepted as-is and
    /// never influences the outcome.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RoutingError> {
        for rule in self.rules.iter().chain(self.fallback.as_ref()) {
            if let Some(capture) = rule.matcher.capture(path) {
                tracing::trace!(method = %method, path = %path, rule = %rule.name, "Route matched");
                return Ok(RouteMatch {
                    rule,
                    subpath: capture.subpath,
                });
            }
        }

        Err(RoutingError::NotFound {
            path: path.to_string(),
        })
    }

    /// Look up the route and pick its origin for this request.
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        splitter: &SplitDecider,
    ) -> Result<RoutingDecision<'_>, RoutingError> {
        let RouteMatch { rule, subpath } = self.lookup(method, path)?;

        let (origin, split, percent) = match &rule.migration {
            None => (rule.primary.as_ref(), None, None),
            Some(migration) => {
                let split = splitter.choose(migration.percent);
                let origin = match split {
                    Split::Primary => rule.primary.as_ref(),
                    Split::Secondary => migration.origin.as_ref(),
                };
                (origin, Some(split), Some(migration.percent))
            }
        };

        Ok(RoutingDecision {
            rule: &rule.name,
            origin,
            split,
            percent,
            subpath,
            rewrite: rule.rewrite,
        })
    }
}

/// Exact rule first, then the wildcard rule, for one feature.
fn compile_matchers(route: &RouteConfig) -> Vec<(&'static str, Box<dyn Matcher>)> {
    let mut matchers: Vec<(&'static str, Box<dyn Matcher>)> = Vec::with_capacity(2);

    if route.segments.is_empty() {
        if route.exact {
            matchers.push(("exact", Box::new(ExactMatcher::new(&route.path))));
        }
        if route.wildcard {
            matchers.push(("wildcard", Box::new(WildcardMatcher::new(&route.path))));
        }
    } else {
        if route.exact {
            matchers.push((
                "exact",
                Box::new(SegmentSetMatcher::new(&route.path, route.segments.clone(), false)),
            ));
        }
        if route.wildcard {
            matchers.push((
                "wildcard",
                Box::new(SegmentSetMatcher::new(&route.path, route.segments.clone(), true)),
            ));
        }
    }

    matchers
}
