//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → routing (pick route by host / path)
//!     → filter::CharsetService (buffer + transcode)
//!     → upstream.rs (forward to the route's upstream)
//!     → single rewritten response to client
//! ```

pub mod request;
pub mod server;
pub mod upstream;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, RouteService};
pub use upstream::UpstreamService;
