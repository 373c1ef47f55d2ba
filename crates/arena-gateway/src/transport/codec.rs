//! Envelope codec for text frames.

use arena_core::error::{ArenaError, Result};
use arena_core::Envelope;

pub fn decode_envelope(text: &str) -> Result<Envelope> {
    serde_json::from_str(text).map_err(|e| ArenaError::BadInput(format!("invalid envelope json: {e}")))
}

pub fn encode_envelope(envelope: &Envelope) -> Result<String> {
    serde_json::to_string(envelope).map_err(|e| ArenaError::Internal(format!("json encode failed: {e}")))
}

/// Decode an inbound text frame, or build the uncorrelated reply for one that
/// cannot be decoded. The frame itself is dropped.
pub fn decode_frame(text: &str) -> std::result::Result<Envelope, Envelope> {
    decode_envelope(text).map_err(|e| Envelope::error("", e.error_code(), e.to_string()))
}
