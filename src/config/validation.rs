//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream authorities and buffer limits
//! - Reject target charsets the proxy cannot produce
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Unknown source charsets are valid (identity pass-through)

use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::charset::is_utf8_label;
use crate::config::schema::ProxyConfig;
use crate::filter::content_type::with_charset;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route name must not be empty")]
    EmptyRouteName,

    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),

    #[error("route '{route}': upstream '{upstream}' must be host:port")]
    InvalidUpstream { route: String, upstream: String },

    #[error("route '{0}': max_body_bytes must be greater than zero")]
    ZeroBodyLimit(String),

    #[error("route '{0}': charset.from must not be empty")]
    EmptySourceCharset(String),

    #[error("route '{route}': unsupported target charset '{to}', only utf-8 is available")]
    UnsupportedTargetCharset { route: String, to: String },

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for route in &config.routes {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName);
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        let upstream_ok = Authority::from_str(&route.upstream)
            .map(|a| a.port_u16().is_some())
            .unwrap_or(false);
        if !upstream_ok {
            errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                upstream: route.upstream.clone(),
            });
        }

        if route.max_body_bytes == 0 {
            errors.push(ValidationError::ZeroBodyLimit(route.name.clone()));
        }

        let charset = &route.rewrite.charset;
        if charset.from.trim().is_empty() {
            errors.push(ValidationError::EmptySourceCharset(route.name.clone()));
        }
        if !is_utf8_label(&charset.to) || with_charset(b"", &charset.to).is_err() {
            errors.push(ValidationError::UnsupportedTargetCharset {
                route: route.name.clone(),
                to: charset.to.clone(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CharsetConfig, RewriteConfig, RouteConfig};

    fn route(name: &str, upstream: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            host: None,
            path_prefix: Some("/".into()),
            upstream: upstream.into(),
            priority: 0,
            max_body_bytes: 1024,
            rewrite: RewriteConfig::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn unknown_source_charset_is_accepted() {
        let mut config = ProxyConfig::default();
        let mut r = route("r1", "127.0.0.1:3000");
        r.rewrite.charset.from = "shift-jis".into();
        config.routes.push(r);

        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.routes.push(route("dup", "127.0.0.1:3000"));

        let mut second = route("dup", "localhost");
        second.max_body_bytes = 0;
        second.rewrite.charset = CharsetConfig {
            from: " ".into(),
            to: "ISO-8859-1".into(),
        };
        config.routes.push(second);

        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateRoute("dup".into()),
                ValidationError::InvalidUpstream {
                    route: "dup".into(),
                    upstream: "localhost".into(),
                },
                ValidationError::ZeroBodyLimit("dup".into()),
                ValidationError::EmptySourceCharset("dup".into()),
                ValidationError::UnsupportedTargetCharset {
                    route: "dup".into(),
                    to: "ISO-8859-1".into(),
                },
                ValidationError::InvalidMetricsAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn target_label_is_case_insensitive() {
        let mut config = ProxyConfig::default();
        let mut r = route("r1", "backend.internal:80");
        r.rewrite.charset.to = "UTF-8".into();
        config.routes.push(r);

        assert_eq!(validate_config(&config), Ok(()));
    }
}
