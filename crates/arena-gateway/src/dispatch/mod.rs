//! Dispatch module exports.
//!
//! Re-exports the dispatch table and handler trait so downstream consumers can
//! depend on this module directly.

pub mod table;

pub use table::{DispatchTable, DispatchTableBuilder, Handler, Route};
