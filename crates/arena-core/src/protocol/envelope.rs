//! The request/response envelope and error constructors.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

use super::payload::{Payload, PayloadKind};

/// Tagged-union message exchanged with a client.
///
/// `collation_id` is chosen by the sender and echoed on every response to the
/// same request; an empty id means no correlation is expected. An envelope
/// with no payload is malformed when inbound, and a plain acknowledgement
/// when outbound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    #[serde(default)]
    pub collation_id: String,
    #[serde(default)]
    pub payload: Option<Payload>,
}

/// Error carried back to the client through the same channel as any other response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl Envelope {
    pub fn new(collation_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            collation_id: collation_id.into(),
            payload: Some(payload),
        }
    }

    /// Payload-less success acknowledgement.
    pub fn ack(collation_id: impl Into<String>) -> Self {
        Self {
            collation_id: collation_id.into(),
            payload: None,
        }
    }

    pub fn error(collation_id: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            collation_id,
            Payload::Error(ErrorPayload {
                code,
                message: message.into(),
            }),
        )
    }

    pub fn runtime_exception(collation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(collation_id, ErrorCode::RuntimeException, message)
    }

    pub fn bad_input(collation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(collation_id, ErrorCode::BadInput, message)
    }

    /// Message kind of the active variant, if any.
    pub fn kind(&self) -> Option<PayloadKind> {
        self.payload.as_ref().map(Payload::kind)
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match &self.payload {
            Some(Payload::Error(e)) => Some(e),
            _ => None,
        }
    }
}
