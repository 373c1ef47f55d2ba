//! Protocol model: the envelope, its payload variants, and message kinds.
//!
//! Every type here round-trips losslessly through `serde_json::Value`:
//! - every field is always emitted, even when it holds its default;
//! - enumerations are encoded as their numeric values;
//! - unknown fields, unknown variants, and unknown enum values are rejected.
//!
//! That discipline is what lets extension code rewrite an envelope without
//! knowing its concrete Rust type.

pub mod envelope;
pub mod payload;
pub mod types;

pub use envelope::{Envelope, ErrorPayload};
pub use payload::{Payload, PayloadKind};
pub use types::{
    AuthProvider, ScoreOp, StorageReadPermission, StorageWritePermission, TopicId, TopicType,
    UserPresence,
};
