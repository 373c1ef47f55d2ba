//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the envelope codec, and the WebSocket
//! implementation of the session contract.

pub mod codec;
pub mod session;
pub mod ws;
