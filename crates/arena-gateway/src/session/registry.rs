use dashmap::DashMap;

use arena_core::protocol::UserPresence;
use arena_core::Envelope;

use super::{Session, SessionRef};

/// Session registry: `session_id -> Session`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionRef>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: SessionRef) {
        self.sessions.insert(session.id().to_string(), session);
    }

    pub fn remove(&self, session: &dyn Session) -> Option<SessionRef> {
        self.sessions.remove(session.id()).map(|(_, s)| s)
    }

    pub fn get(&self, session_id: &str) -> Option<SessionRef> {
        self.sessions.get(session_id).map(|r| r.value().clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Deliver `envelope` to every listed presence that is still connected,
    /// skipping `except` (usually the sender's session id).
    pub fn send_to<'a>(
        &self,
        presences: impl IntoIterator<Item = &'a UserPresence>,
        envelope: &Envelope,
        except: Option<&str>,
    ) {
        for p in presences {
            if except == Some(p.session_id.as_str()) {
                continue;
            }
            if let Some(session) = self.get(&p.session_id) {
                session.send(envelope.clone());
            }
        }
    }
}
