//! Charset-rewriting reverse proxy library.
//!
//! Each configured route forwards to an upstream and passes the response
//! through a [`filter::CharsetLayer`], which buffers the body, transcodes it
//! from the route's source charset to UTF-8 and declares the charset on
//! `Content-Type`.

pub mod charset;
pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use charset::{convert, CodecTable, DecodeError, SourceDecoder};
pub use config::schema::ProxyConfig;
pub use filter::{CapturedResponse, CharsetLayer, CharsetService, RewriteError, TranscodeFilter};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
