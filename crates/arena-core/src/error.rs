//! Shared error type and client-facing error codes across arena crates.

use thiserror::Error;

numeric_enum! {
    /// Client-facing error codes (stable wire values).
    ///
    /// The first five are produced by the pipeline itself; the rest belong to
    /// domain handlers and travel through the same correlated error envelope.
    pub enum ErrorCode {
        #[default]
        RuntimeException = 0 => "RUNTIME_EXCEPTION",
        UnrecognizedPayload = 1 => "UNRECOGNIZED_PAYLOAD",
        MissingPayload = 2 => "MISSING_PAYLOAD",
        BadInput = 3 => "BAD_INPUT",
        AuthError = 4 => "AUTH_ERROR",
        UserNotFound = 5 => "USER_NOT_FOUND",
        UserRegisterInuse = 6 => "USER_REGISTER_INUSE",
        UserLinkInuse = 7 => "USER_LINK_INUSE",
        UserLinkProviderUnavailable = 8 => "USER_LINK_PROVIDER_UNAVAILABLE",
        UserUnlinkDisallowed = 9 => "USER_UNLINK_DISALLOWED",
        UserHandleInuse = 10 => "USER_HANDLE_INUSE",
        GroupNameInuse = 11 => "GROUP_NAME_INUSE",
        GroupLastAdmin = 12 => "GROUP_LAST_ADMIN",
        StorageRejected = 13 => "STORAGE_REJECTED",
        MatchNotFound = 14 => "MATCH_NOT_FOUND",
        RuntimeFunctionNotFound = 15 => "RUNTIME_FUNCTION_NOT_FOUND",
        RuntimeFunctionException = 16 => "RUNTIME_FUNCTION_EXCEPTION",
    }
}

/// An integer that does not name any variant of a numeric enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownEnumValue {
    pub kind: &'static str,
    pub value: i32,
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("runtime: {0}")]
    Runtime(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ArenaError {
    /// Map internal error to a stable client-facing code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ArenaError::BadInput(_) => ErrorCode::BadInput,
            ArenaError::AuthFailed => ErrorCode::AuthError,
            ArenaError::UnsupportedVersion => ErrorCode::BadInput,
            ArenaError::ProviderUnavailable(_) => ErrorCode::UserLinkProviderUnavailable,
            ArenaError::Runtime(_) => ErrorCode::RuntimeException,
            ArenaError::Internal(_) => ErrorCode::RuntimeException,
        }
    }
}
