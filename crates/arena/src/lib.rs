//! Top-level facade crate for arena.
//!
//! Re-exports the protocol model and the gateway pipeline so users can depend on a single crate.

pub mod core {
    pub use arena_core::*;
}

pub mod gateway {
    pub use arena_gateway::*;
}
