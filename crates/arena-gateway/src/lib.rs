//! arena gateway library entry.
//!
//! This crate wires the session contract, shared realtime collaborators,
//! extension runtimes, dispatch table, and request pipeline into a gateway
//! stack. It is consumed by the binary (`main.rs`), by embedders that bring
//! their own domain handlers, and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod hooks;
pub mod pipeline;
pub mod realtime;
pub mod router;
pub mod services;
pub mod session;
pub mod social;
pub mod transport;
