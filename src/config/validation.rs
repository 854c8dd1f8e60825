//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing origins)
//! - Validate value ranges (percentages, timeouts, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, OriginConfig, RouteConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener bind address '{0}' is not a valid socket address")]
    BindAddress(String),

    #[error("origin name must not be empty")]
    EmptyOriginName,

    #[error("origin '{0}' is defined more than once")]
    DuplicateOrigin(String),

    #[error("origin '{0}' has no url")]
    MissingOriginUrl(String),

    #[error("origin '{origin}' has invalid url '{url}': {reason}")]
    InvalidOriginUrl {
        origin: String,
        url: String,
        reason: String,
    },

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{route}' has invalid path '{path}': {reason}")]
    InvalidPath {
        route: String,
        path: String,
        reason: &'static str,
    },

    #[error("route '{route}' has invalid segment '{segment}'")]
    InvalidSegment { route: String, segment: String },

    #[error("route '{0}' disables both exact and wildcard matching")]
    NoMatchMode(String),

    #[error("route '{route}' references unknown origin '{origin}'")]
    UnknownOrigin { route: String, origin: String },

    #[error("route '{0}' has a secondary origin but no migration_percent")]
    MissingPercent(String),

    #[error("route '{0}' has a migration_percent but no secondary origin")]
    MissingSecondary(String),

    #[error("route '{route}' migration_percent {percent} exceeds 100")]
    PercentOutOfRange { route: String, percent: u8 },

    #[error("default_origin references unknown origin '{0}'")]
    UnknownDefaultOrigin(String),

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let mut origin_names = HashSet::new();
    for origin in &config.origins {
        validate_origin(origin, &mut errors);
        if !origin.name.is_empty() && !origin_names.insert(origin.name.as_str()) {
            errors.push(ValidationError::DuplicateOrigin(origin.name.clone()));
        }
    }

    let mut route_names = HashSet::new();
    for route in &config.routes {
        if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        validate_route(route, &origin_names, &mut errors);
    }

    if let Some(default_origin) = &config.default_origin {
        if !origin_names.contains(default_origin.as_str()) {
            errors.push(ValidationError::UnknownDefaultOrigin(default_origin.clone()));
        }
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name.to_string()));
        }
    }
    for origin in &config.origins {
        if origin.timeout_secs == Some(0) {
            errors.push(ValidationError::ZeroTimeout(format!("origins.{}.timeout_secs", origin.name)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_origin(origin: &OriginConfig, errors: &mut Vec<ValidationError>) {
    if origin.name.is_empty() {
        errors.push(ValidationError::EmptyOriginName);
    }
    if origin.url.trim().is_empty() {
        errors.push(ValidationError::MissingOriginUrl(origin.name.clone()));
        return;
    }
    if let Err(reason) = check_origin_url(&origin.url) {
        errors.push(ValidationError::InvalidOriginUrl {
            origin: origin.name.clone(),
            url: origin.url.clone(),
            reason,
        });
    }
}

/// Origins must be absolute `http` URLs with a host.
pub(crate) fn check_origin_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("base url must not carry a query or fragment".to_string());
    }
    Ok(url)
}

fn validate_route(route: &RouteConfig, origins: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    if let Some(reason) = path_problem(&route.path) {
        errors.push(ValidationError::InvalidPath {
            route: route.name.clone(),
            path: route.path.clone(),
            reason,
        });
    }

    for segment in &route.segments {
        if segment.is_empty() || segment.contains('/') {
            errors.push(ValidationError::InvalidSegment {
                route: route.name.clone(),
                segment: segment.clone(),
            });
        }
    }

    if !route.exact && !route.wildcard {
        errors.push(ValidationError::NoMatchMode(route.name.clone()));
    }

    let referenced = std::iter::once(&route.primary).chain(route.secondary.as_ref());
    for origin in referenced {
        if !origins.contains(origin.as_str()) {
            errors.push(ValidationError::UnknownOrigin {
                route: route.name.clone(),
                origin: origin.clone(),
            });
        }
    }

    match (&route.secondary, route.migration_percent) {
        (Some(_), None) => errors.push(ValidationError::MissingPercent(route.name.clone())),
        (None, Some(_)) => errors.push(ValidationError::MissingSecondary(route.name.clone())),
        (Some(_), Some(percent)) if percent > 100 => {
            errors.push(ValidationError::PercentOutOfRange {
                route: route.name.clone(),
                percent,
            })
        }
        _ => {}
    }
}

fn path_problem(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        Some("must start with '/'")
    } else if path == "/" {
        Some("the root path is reserved; use default_origin for a catch-all")
    } else if path.ends_with('/') {
        Some("must not end with '/'")
    } else if path.contains(['?', '#']) {
        Some("must not contain a query or fragment")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OriginConfig;

    fn base_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.origins.push(OriginConfig::new("monolith", "Monolith", "http://127.0.0.1:8080"));
        config.origins.push(OriginConfig::new("movies", "Movies-Service", "http://127.0.0.1:8081"));
        config
    }

    #[test]
    fn test_valid_config() {
        let mut config = base_config();
        config
            .routes
            .push(RouteConfig::new("movies", "/api/movies", "monolith").with_migration("movies", 50));
        config.default_origin = Some("monolith".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = base_config();
        config.listener.bind_address = "not-an-address".into();
        config.origins.push(OriginConfig::new("events", "Events-Service", ""));
        let mut route = RouteConfig::new("broken", "api/x/", "nowhere");
        route.secondary = Some("movies".into());
        config.routes.push(route);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::MissingOriginUrl("events".into())));
        assert!(errors.contains(&ValidationError::MissingPercent("broken".into())));
        assert!(errors.contains(&ValidationError::UnknownOrigin {
            route: "broken".into(),
            origin: "nowhere".into(),
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPath { route, .. } if route == "broken")));
    }

    #[test]
    fn test_percent_range_and_secondary_pairing() {
        let mut config = base_config();
        config
            .routes
            .push(RouteConfig::new("over", "/api/over", "monolith").with_migration("movies", 101));
        let mut lonely = RouteConfig::new("lonely", "/api/lonely", "monolith");
        lonely.migration_percent = Some(10);
        config.routes.push(lonely);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::PercentOutOfRange {
            route: "over".into(),
            percent: 101
        }));
        assert!(errors.contains(&ValidationError::MissingSecondary("lonely".into())));
    }

    #[test]
    fn test_origin_url_rules() {
        assert!(check_origin_url("http://monolith:8080").is_ok());
        assert!(check_origin_url("http://monolith:8080/v1").is_ok());
        assert!(check_origin_url("https://monolith").is_err());
        assert!(check_origin_url("monolith:8080").is_err());
        assert!(check_origin_url("http://monolith?x=1").is_err());
    }

    #[test]
    fn test_root_route_and_duplicates_rejected() {
        let mut config = base_config();
        config.origins.push(OriginConfig::new("monolith", "Again", "http://127.0.0.1:9999"));
        config.routes.push(RouteConfig::new("root", "/", "monolith"));
        config.routes.push(RouteConfig::new("root", "/api", "monolith"));
        config.default_origin = Some("ghost".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateOrigin("monolith".into())));
        assert!(errors.contains(&ValidationError::DuplicateRoute("root".into())));
        assert!(errors.contains(&ValidationError::UnknownDefaultOrigin("ghost".into())));
    }
}
