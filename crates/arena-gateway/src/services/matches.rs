use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use arena_core::protocol::payload::{Match, MatchData, MatchDataSend, MatchJoin, MatchLeave, MatchPresence};
use arena_core::{Envelope, ErrorCode, Payload, PayloadKind};

use crate::dispatch::Handler;
use crate::realtime::Tracker;
use crate::session::{SessionRef, SessionRegistry};

fn stream_key(match_id: &str) -> String {
    format!("match:{match_id}")
}

/// Client-relayed realtime matches.
///
/// A match exists while it has at least one presence. Data is relayed as is
/// and never echoed back to the sender.
pub struct MatchService {
    registry: Arc<SessionRegistry>,
    tracker: Arc<Tracker>,
}

impl MatchService {
    pub fn new(registry: Arc<SessionRegistry>, tracker: Arc<Tracker>) -> Self {
        Self { registry, tracker }
    }

    fn create(&self, session: &SessionRef, cid: String) {
        let match_id = uuid::Uuid::new_v4().to_string();
        let me = session.presence();
        self.tracker.track(&stream_key(&match_id), me.clone());

        session.send(Envelope::new(
            cid,
            Payload::Match(Match {
                match_id,
                presences: vec![me.clone()],
                self_presence: me,
            }),
        ));
    }

    fn join(&self, session: &SessionRef, cid: String, req: MatchJoin) {
        if req.match_id.is_empty() {
            session.send(Envelope::bad_input(cid, "Match ID must be set"));
            return;
        }
        let stream = stream_key(&req.match_id);
        if self.tracker.count(&stream) == 0 {
            session.send(Envelope::error(cid, ErrorCode::MatchNotFound, "Match not found"));
            return;
        }

        let me = session.presence();
        if self.tracker.track(&stream, me.clone()) {
            let notice = Envelope::new(
                "",
                Payload::MatchPresence(MatchPresence {
                    match_id: req.match_id.clone(),
                    joins: vec![me.clone()],
                    leaves: vec![],
                }),
            );
            self.registry
                .send_to(&self.tracker.presences(&stream), &notice, Some(session.id()));
        }

        session.send(Envelope::new(
            cid,
            Payload::Match(Match {
                match_id: req.match_id,
                presences: self.tracker.presences(&stream),
                self_presence: me,
            }),
        ));
    }

    fn leave(&self, session: &SessionRef, cid: String, req: MatchLeave) {
        let stream = stream_key(&req.match_id);
        let Some(me) = self.tracker.untrack(&stream, session.id()) else {
            session.send(Envelope::error(cid, ErrorCode::MatchNotFound, "Match not found"));
            return;
        };

        let notice = Envelope::new(
            "",
            Payload::MatchPresence(MatchPresence {
                match_id: req.match_id,
                joins: vec![],
                leaves: vec![me],
            }),
        );
        self.registry
            .send_to(&self.tracker.presences(&stream), &notice, None);
        session.send(Envelope::ack(cid));
    }

    fn data_send(&self, session: &SessionRef, req: MatchDataSend) {
        let stream = stream_key(&req.match_id);
        if !self.tracker.is_tracked(&stream, session.id()) {
            debug!(match_id = %req.match_id, "dropping match data from non-member");
            return;
        }

        let targets: Vec<_> = self
            .tracker
            .presences(&stream)
            .into_iter()
            .filter(|p| {
                req.presences.is_empty()
                    || req.presences.iter().any(|t| t.session_id == p.session_id)
            })
            .collect();

        let data = Envelope::new(
            "",
            Payload::MatchData(MatchData {
                match_id: req.match_id,
                presence: session.presence(),
                op_code: req.op_code,
                data: req.data,
            }),
        );
        self.registry.send_to(&targets, &data, Some(session.id()));
    }
}

#[async_trait]
impl Handler for MatchService {
    fn kinds(&self) -> &'static [PayloadKind] {
        &[
            PayloadKind::MatchCreate,
            PayloadKind::MatchJoin,
            PayloadKind::MatchLeave,
            PayloadKind::MatchDataSend,
        ]
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        let cid = envelope.collation_id;
        match envelope.payload {
            Some(Payload::MatchCreate(_)) => self.create(&session, cid),
            Some(Payload::MatchJoin(req)) => self.join(&session, cid, req),
            Some(Payload::MatchLeave(req)) => self.leave(&session, cid, req),
            Some(Payload::MatchDataSend(req)) => self.data_send(&session, req),
            _ => {}
        }
    }
}
