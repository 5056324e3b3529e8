//! Response transcoding filter.
//!
//! # Data Flow
//! ```text
//! request
//!     → wrapped service runs to completion
//!     → capture.rs (status + every body frame buffered, nothing sent)
//!     → content_type.rs (append charset unless already declared)
//!     → charset::CodecTable::convert (from → UTF-8)
//!     → single response with recorded status and converted body
//!
//! On any failure after the handler ran:
//!     → error.rs (plain-text 500, captured body dropped)
//! ```
//!
//! # Design Decisions
//! - Buffer then write once: the client never sees unconverted bytes
//! - One `TranscodeFilter` per route, shared through `Arc` by all requests
//! - Per-request state lives in the request's own future, no locking
//! - A dropped request future aborts before anything is written

pub mod capture;
pub mod content_type;
pub mod error;
pub mod layer;

pub use capture::CapturedResponse;
pub use error::RewriteError;
pub use layer::{CharsetLayer, CharsetService, TranscodeFilter, DEFAULT_MAX_BODY_BYTES};
