//! Route matching conditions.
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port
//! - Path matching is case-sensitive
//! - A route with no conditions matches everything

use axum::http::header::HOST;
use axum::http::Request;

use crate::config::RouteConfig;

/// The parts of a request routing looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestTarget<'a> {
    /// From the `Host` header, falling back to the URI authority.
    pub host: Option<&'a str>,
    pub path: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn of<B>(req: &'a Request<B>) -> Self {
        let host = req
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host());
        Self {
            host,
            path: req.uri().path(),
        }
    }
}

/// A condition a request must satisfy for a route to apply.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    fn matches(&self, target: &RequestTarget<'_>) -> bool;
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if let Some(end) = host.rfind(']') {
        return &host[..=end];
    }
    host.split(':').next().unwrap_or(host)
}

/// Matches the request host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_ascii_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        target
            .host
            .map(|h| strip_port(h).eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        target.path.starts_with(&self.prefix)
    }
}

/// All inner conditions must hold. Empty matches everything.
#[derive(Debug, Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Conditions declared on a route.
    pub fn for_route(route: &RouteConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &route.host {
            matchers.push(Box::new(HostMatcher::new(host.as_str())));
        }
        if let Some(prefix) = &route.path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.as_str())));
        }
        Self::new(matchers)
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matchers.iter().all(|m| m.matches(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn hits(matcher: &dyn Matcher, host: &str, uri: &str) -> bool {
        let req = Request::builder()
            .uri(uri)
            .header("Host", host)
            .body(Body::empty())
            .unwrap();
        matcher.matches(&RequestTarget::of(&req))
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("Example.com");

        assert!(hits(&matcher, "example.com", "/"));
        assert!(hits(&matcher, "EXAMPLE.COM", "/"));
        assert!(hits(&matcher, "example.com:8080", "/"));
        assert!(!hits(&matcher, "other.com", "/"));
    }

    #[test]
    fn test_host_from_uri_authority() {
        let matcher = HostMatcher::new("example.com");
        let req = Request::builder()
            .uri("http://example.com/a")
            .body(Body::empty())
            .unwrap();
        assert!(matcher.matches(&RequestTarget::of(&req)));
    }

    #[test]
    fn test_ipv6_host() {
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port("localhost:80"), "localhost");
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(hits(&matcher, "example.com", "/api/v1"));
        assert!(!hits(&matcher, "example.com", "/API/v1"));
        assert!(!hits(&matcher, "example.com", "/images"));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(HostMatcher::new("cms.example.com")),
            Box::new(PathPrefixMatcher::new("/pages")),
        ]);

        assert!(hits(&matcher, "cms.example.com", "/pages/1"));
        assert!(!hits(&matcher, "cms.example.com", "/other"));
        assert!(!hits(&matcher, "www.example.com", "/pages/1"));

        assert!(hits(&AndMatcher::default(), "anything", "/"));
    }
}
