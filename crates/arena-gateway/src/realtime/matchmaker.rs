use std::collections::HashMap;
use std::sync::Mutex;

use arena_core::protocol::UserPresence;

/// One waiting matchmaking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakerEntry {
    pub ticket: String,
    pub presence: UserPresence,
}

/// Result of adding a session to the matchmaker.
#[derive(Debug, Clone)]
pub struct MatchmakeOutcome {
    /// Ticket issued to the caller.
    pub ticket: String,
    /// Set when the caller completed a pool; includes the caller's own entry.
    pub matched: Option<Vec<MatchmakerEntry>>,
}

/// Matchmaking collaborator. Implementations are internally synchronised.
pub trait Matchmaker: Send + Sync {
    fn add(&self, presence: UserPresence, required_count: usize) -> MatchmakeOutcome;
    /// Returns false when the session holds no such ticket.
    fn remove(&self, session_id: &str, ticket: &str) -> bool;
    fn remove_all(&self, session_id: &str);
}

/// Pools waiting sessions by required count and matches them first come, first served.
#[derive(Default)]
pub struct InMemoryMatchmaker {
    pools: Mutex<HashMap<usize, Vec<MatchmakerEntry>>>,
}

impl InMemoryMatchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waiting(&self) -> usize {
        let pools = self.pools.lock().unwrap_or_else(|p| p.into_inner());
        pools.values().map(Vec::len).sum()
    }
}

impl Matchmaker for InMemoryMatchmaker {
    fn add(&self, presence: UserPresence, required_count: usize) -> MatchmakeOutcome {
        let mut pools = self.pools.lock().unwrap_or_else(|p| p.into_inner());
        let pool = pools.entry(required_count).or_default();

        // A session already waiting in this pool keeps its ticket.
        if let Some(existing) = pool
            .iter()
            .find(|e| e.presence.session_id == presence.session_id)
        {
            return MatchmakeOutcome {
                ticket: existing.ticket.clone(),
                matched: None,
            };
        }

        let ticket = uuid::Uuid::new_v4().to_string();
        pool.push(MatchmakerEntry {
            ticket: ticket.clone(),
            presence,
        });

        let matched = if pool.len() >= required_count {
            Some(pool.drain(..required_count).collect())
        } else {
            None
        };

        MatchmakeOutcome { ticket, matched }
    }

    fn remove(&self, session_id: &str, ticket: &str) -> bool {
        let mut pools = self.pools.lock().unwrap_or_else(|p| p.into_inner());
        for pool in pools.values_mut() {
            let before = pool.len();
            pool.retain(|e| !(e.ticket == ticket && e.presence.session_id == session_id));
            if pool.len() != before {
                return true;
            }
        }
        false
    }

    fn remove_all(&self, session_id: &str) {
        let mut pools = self.pools.lock().unwrap_or_else(|p| p.into_inner());
        for pool in pools.values_mut() {
            pool.retain(|e| e.presence.session_id != session_id);
        }
    }
}
