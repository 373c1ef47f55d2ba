//! Session contract and the process-wide session registry.
//!
//! Sessions are created by the transport after authentication. The pipeline
//! only needs to send to them, close them, and read their identity.

mod registry;

use std::sync::Arc;

use arena_core::protocol::UserPresence;
use arena_core::Envelope;

pub use registry::SessionRegistry;

/// A live, authenticated client connection.
pub trait Session: Send + Sync {
    /// Per-connection identifier (registry key).
    fn id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn handle(&self) -> &str;

    /// Best-effort, fire-and-forget delivery. Sends on one session keep their order.
    fn send(&self, envelope: Envelope);

    /// Terminate the connection. Idempotent.
    fn close(&self);

    fn presence(&self) -> UserPresence {
        UserPresence {
            user_id: self.user_id().to_string(),
            session_id: self.id().to_string(),
            handle: self.handle().to_string(),
        }
    }
}

/// Shared handle to a session.
pub type SessionRef = Arc<dyn Session>;
