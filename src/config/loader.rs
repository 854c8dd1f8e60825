//! Configuration loading from disk or the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, OriginConfig, RouteConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the monolith base URL.
pub const MONOLITH_URL: &str = "MONOLITH_URL";
/// Environment variable holding the movies service base URL.
pub const MOVIES_SERVICE_URL: &str = "MOVIES_SERVICE_URL";
/// Environment variable holding the events service base URL.
pub const EVENTS_SERVICE_URL: &str = "EVENTS_SERVICE_URL";
/// `true` enables the movies traffic split.
pub const GRADUAL_MIGRATION: &str = "GRADUAL_MIGRATION";
/// Share of movies traffic sent to the movies service.
pub const MOVIES_MIGRATION_PERCENT: &str = "MOVIES_MIGRATION_PERCENT";
/// Listener port.
pub const PORT: &str = "PORT";

/// Segments still served by the monolith in the environment preset.
pub const MONOLITH_SEGMENTS: [&str; 3] = ["users", "payments", "subscriptions"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("required environment variables not set: {}", .0.join(", "))]
    MissingVariable(Vec<&'static str>),

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidVariable { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the monolith / movies / events preset from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    from_env_source(|name| std::env::var(name).ok())
}

/// Build the environment preset from an arbitrary variable lookup.
pub fn from_env_source<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let required = [MONOLITH_URL, MOVIES_SERVICE_URL, EVENTS_SERVICE_URL];
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|&name| lookup(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingVariable(missing));
    }

    let mut config = GatewayConfig::default();
    config.origins = vec![
        OriginConfig::new("monolith", "Monolith", lookup(MONOLITH_URL).unwrap_or_default()),
        OriginConfig::new("movies", "Movies-Service", lookup(MOVIES_SERVICE_URL).unwrap_or_default()),
        OriginConfig::new("events", "Events-Service", lookup(EVENTS_SERVICE_URL).unwrap_or_default()),
    ];

    config.migration.enabled = lookup(GRADUAL_MIGRATION)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let percent = match lookup(MOVIES_MIGRATION_PERCENT) {
        Some(raw) => raw.trim().parse::<u8>().map_err(|_| ConfigError::InvalidVariable {
            name: MOVIES_MIGRATION_PERCENT,
            value: raw.clone(),
        })?,
        None => 0,
    };

    if let Some(raw) = lookup(PORT) {
        let port = raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidVariable {
            name: PORT,
            value: raw.clone(),
        })?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    config.routes = vec![
        RouteConfig::new("movies", "/api/movies", "monolith")
            .with_migration("movies", percent)
            .with_priority(300),
        RouteConfig::new("events", "/api/events", "events").with_priority(200),
        RouteConfig::new("monolith", "/api", "monolith")
            .with_segments(MONOLITH_SEGMENTS)
            .with_priority(100),
    ];

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const URLS: [(&str, &str); 3] = [
        (MONOLITH_URL, "http://monolith:8080"),
        (MOVIES_SERVICE_URL, "http://movies:8081"),
        (EVENTS_SERVICE_URL, "http://events:8082"),
    ];

    #[test]
    fn test_env_preset() {
        let mut pairs = URLS.to_vec();
        pairs.push((GRADUAL_MIGRATION, "true"));
        pairs.push((MOVIES_MIGRATION_PERCENT, "30"));
        let config = from_env_source(env(&pairs)).unwrap();

        assert!(config.migration.enabled);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.origins.len(), 3);
        assert_eq!(config.origins[1].label(), "Movies-Service");

        let movies = &config.routes[0];
        assert_eq!(movies.path, "/api/movies");
        assert_eq!(movies.secondary.as_deref(), Some("movies"));
        assert_eq!(movies.migration_percent, Some(30));
        assert!(config.routes[0].priority > config.routes[1].priority);
        assert!(config.routes[1].priority > config.routes[2].priority);
        assert_eq!(config.routes[2].segments, MONOLITH_SEGMENTS);
        assert!(config.default_origin.is_none());
    }

    #[test]
    fn test_env_defaults() {
        let config = from_env_source(env(&URLS)).unwrap();
        assert!(!config.migration.enabled);
        assert_eq!(config.routes[0].migration_percent, Some(0));
    }

    #[test]
    fn test_missing_urls_fail_fast() {
        let err = from_env_source(env(&[(MONOLITH_URL, "http://monolith:8080"), (EVENTS_SERVICE_URL, "  ")]))
            .unwrap_err();
        match err {
            ConfigError::MissingVariable(names) => {
                assert_eq!(names, vec![MOVIES_SERVICE_URL, EVENTS_SERVICE_URL]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_percent_and_port() {
        let mut pairs = URLS.to_vec();
        pairs.push((MOVIES_MIGRATION_PERCENT, "half"));
        assert!(matches!(
            from_env_source(env(&pairs)),
            Err(ConfigError::InvalidVariable { name: MOVIES_MIGRATION_PERCENT, .. })
        ));

        let mut pairs = URLS.to_vec();
        pairs.push((MOVIES_MIGRATION_PERCENT, "150"));
        assert!(matches!(from_env_source(env(&pairs)), Err(ConfigError::Validation(_))));

        let mut pairs = URLS.to_vec();
        pairs.push((PORT, "9000"));
        let config = from_env_source(env(&pairs)).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_parse_example_file() {
        let config = parse_config(include_str!("../../gateway.example.toml")).unwrap();
        assert_eq!(config.default_origin.as_deref(), Some("monolith"));
        assert!(config.migration.enabled);
        assert_eq!(config.origins.len(), 3);
        assert_eq!(config.origins[0].timeout_secs, Some(10));
        let movies = config.routes.iter().find(|r| r.name == "movies").unwrap();
        assert!(movies.exact && movies.wildcard);
        assert_eq!(movies.migration_percent, Some(25));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let toml = r#"
            [[origins]]
            name = "monolith"
            url = "ftp://monolith"

            [[routes]]
            name = "all"
            path = "/api"
            primary = "monolith"
        "#;
        assert!(matches!(parse_config(toml), Err(ConfigError::Validation(_))));
        assert!(matches!(parse_config("routes = 3"), Err(ConfigError::Parse(_))));
    }
}
