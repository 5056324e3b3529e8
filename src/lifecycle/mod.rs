//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight requests finish → exit
//! ```
//!
//! # Design Decisions
//! - In-flight requests are drained, never cut mid-write
//! - A request cancelled by its client is dropped before the final write

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
