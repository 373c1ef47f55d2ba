//! arena core: transport-agnostic protocol model, error codes, and the crate error type.
//!
//! This crate defines the envelope every client message travels in, the
//! closed set of payload variants, and the stable message-kind names used as
//! routing and hook keys. It carries no transport or runtime dependencies so
//! the gateway, extension runtimes, and tooling can all share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input is
//! surfaced as `ArenaError` or a serde error, never a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

#[macro_use]
mod macros;

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ArenaError, ErrorCode, Result};
pub use protocol::{Envelope, Payload, PayloadKind};
