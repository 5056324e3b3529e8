//! Charset conversion subsystem.
//!
//! # Data Flow
//! ```text
//! buffered body bytes + (from, to)
//!     → table.rs (exact-name lookup of `from`)
//!     → codec.rs (strict decode into UTF-8 text)
//!     → UTF-8 bytes handed back to the filter
//!
//! unknown `from`:
//!     → identity pass-through, bytes returned untouched
//! ```
//!
//! # Design Decisions
//! - One `SourceDecoder` per legacy encoding; adding an encoding is a
//!   `register` call, never an edit to the dispatch
//! - The standard table is built once per process and shared read-only
//! - Unrecognized source names are a success path, not an error
//! - UTF-8 is the only target encoding

pub mod codec;
pub mod table;

pub use codec::{DecodeError, Latin1, LegacyEncoding, SourceDecoder, Windows1252};
pub use table::{convert, is_utf8_label, CodecTable};
