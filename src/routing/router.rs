//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - Explicit `None` on no match rather than a silent default

use axum::http::Request;

use crate::routing::matcher::{Matcher, RequestTarget};

/// A compiled route and whatever it dispatches to.
#[derive(Debug)]
pub struct Route<T> {
    pub name: String,
    pub priority: u32,
    pub matcher: Box<dyn Matcher>,
    pub target: T,
}

/// Routes ordered by descending priority.
#[derive(Debug)]
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
}

impl<T> RouteTable<T> {
    pub fn new(mut routes: Vec<Route<T>>) -> Self {
        // Stable sort: equal priorities keep configuration order.
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// First route whose conditions hold for `req`.
    pub fn match_request<B>(&self, req: &Request<B>) -> Option<&Route<T>> {
        let target = RequestTarget::of(req);
        self.routes.iter().find(|r| r.matcher.matches(&target))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
