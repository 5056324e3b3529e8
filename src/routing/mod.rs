//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → matcher.rs (host / path prefix conditions)
//!     → router.rs (sort by priority, freeze)
//!
//! Incoming Request (host, path)
//!     → router.rs (first matching route wins)
//!     → route target (upstream wrapped in its charset filter)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: ties in priority keep configuration order

pub mod matcher;
pub mod router;

pub use matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher, RequestTarget};
pub use router::{Route, RouteTable};
