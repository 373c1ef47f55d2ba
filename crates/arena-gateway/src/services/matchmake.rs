use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use arena_core::protocol::payload::{MatchmakeAdd, MatchmakeMatched, MatchmakeRemove, MatchmakeTicket};
use arena_core::{Envelope, Payload, PayloadKind};

use crate::dispatch::Handler;
use crate::realtime::Matchmaker;
use crate::session::{SessionRef, SessionRegistry};

pub struct MatchmakeService {
    registry: Arc<SessionRegistry>,
    matchmaker: Arc<dyn Matchmaker>,
}

impl MatchmakeService {
    pub fn new(registry: Arc<SessionRegistry>, matchmaker: Arc<dyn Matchmaker>) -> Self {
        Self {
            registry,
            matchmaker,
        }
    }

    fn add(&self, session: &SessionRef, cid: String, req: MatchmakeAdd) {
        if req.required_count < 2 {
            session.send(Envelope::bad_input(cid, "Required count must be at least 2"));
            return;
        }
        let Ok(required) = usize::try_from(req.required_count) else {
            session.send(Envelope::bad_input(cid, "Required count is too large"));
            return;
        };

        let outcome = self.matchmaker.add(session.presence(), required);
        session.send(Envelope::new(
            cid,
            Payload::MatchmakeTicket(MatchmakeTicket {
                ticket: outcome.ticket,
            }),
        ));

        let Some(matched) = outcome.matched else { return; };
        let token = uuid::Uuid::new_v4().to_string();
        let presences: Vec<_> = matched.iter().map(|e| e.presence.clone()).collect();
        debug!(%token, count = matched.len(), "matchmaking pool matched");

        for entry in matched {
            let Some(target) = self.registry.get(&entry.presence.session_id) else { continue; };
            target.send(Envelope::new(
                "",
                Payload::MatchmakeMatched(MatchmakeMatched {
                    ticket: entry.ticket,
                    token: token.clone(),
                    presences: presences.clone(),
                    self_presence: entry.presence,
                }),
            ));
        }
    }

    fn remove(&self, session: &SessionRef, cid: String, req: MatchmakeRemove) {
        if req.ticket.is_empty() {
            session.send(Envelope::bad_input(cid, "Ticket must be set"));
            return;
        }
        if self.matchmaker.remove(session.id(), &req.ticket) {
            session.send(Envelope::ack(cid));
        } else {
            session.send(Envelope::bad_input(cid, "Matchmake ticket not found"));
        }
    }
}

#[async_trait]
impl Handler for MatchmakeService {
    fn kinds(&self) -> &'static [PayloadKind] {
        &[PayloadKind::MatchmakeAdd, PayloadKind::MatchmakeRemove]
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        let cid = envelope.collation_id;
        match envelope.payload {
            Some(Payload::MatchmakeAdd(req)) => self.add(&session, cid, req),
            Some(Payload::MatchmakeRemove(req)) => self.remove(&session, cid, req),
            _ => {}
        }
    }
}
