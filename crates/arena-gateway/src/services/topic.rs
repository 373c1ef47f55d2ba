use std::sync::Arc;

use async_trait::async_trait;

use arena_core::protocol::payload::{
    TopicInfo, TopicJoin, TopicLeave, TopicMessage, TopicMessageAck, TopicMessageSend,
    TopicPresence, Topics,
};
use arena_core::protocol::{TopicId, TopicType};
use arena_core::{Envelope, Payload, PayloadKind};

use crate::dispatch::Handler;
use crate::realtime::Tracker;
use crate::session::{SessionRef, SessionRegistry};

/// Realtime chat topics: rooms, groups, and direct messages.
///
/// Membership is tracker presence. Messages fan out to the other members and
/// the sender receives an ack.
pub struct TopicService {
    registry: Arc<SessionRegistry>,
    tracker: Arc<Tracker>,
}

impl TopicService {
    pub fn new(registry: Arc<SessionRegistry>, tracker: Arc<Tracker>) -> Self {
        Self { registry, tracker }
    }

    fn join(&self, session: &SessionRef, cid: String, req: TopicJoin) {
        if req.target.is_empty() {
            session.send(Envelope::bad_input(cid, "Topic target must be set"));
            return;
        }

        let topic = match req.kind {
            TopicType::DirectMessage => {
                if req.target == session.user_id() {
                    session.send(Envelope::bad_input(cid, "Cannot open a direct message topic with self"));
                    return;
                }
                TopicId::direct(session.user_id(), &req.target)
            }
            TopicType::Room => TopicId::room(req.target),
            TopicType::Group => TopicId::group(req.target),
        };

        let stream = topic.stream_key();
        let me = session.presence();
        if self.tracker.track(&stream, me.clone()) {
            let notice = Envelope::new(
                "",
                Payload::TopicPresence(TopicPresence {
                    topic: topic.clone(),
                    joins: vec![me.clone()],
                    leaves: vec![],
                }),
            );
            self.registry
                .send_to(&self.tracker.presences(&stream), &notice, Some(session.id()));
        }

        session.send(Envelope::new(
            cid,
            Payload::Topics(Topics {
                topics: vec![TopicInfo {
                    presences: self.tracker.presences(&stream),
                    topic,
                    self_presence: me,
                }],
            }),
        ));
    }

    fn leave(&self, session: &SessionRef, cid: String, req: TopicLeave) {
        let stream = req.topic.stream_key();
        if let Some(me) = self.tracker.untrack(&stream, session.id()) {
            let notice = Envelope::new(
                "",
                Payload::TopicPresence(TopicPresence {
                    topic: req.topic,
                    joins: vec![],
                    leaves: vec![me],
                }),
            );
            self.registry
                .send_to(&self.tracker.presences(&stream), &notice, None);
        }
        session.send(Envelope::ack(cid));
    }

    fn message_send(&self, session: &SessionRef, cid: String, req: TopicMessageSend) {
        let stream = req.topic.stream_key();
        if !self.tracker.is_tracked(&stream, session.id()) {
            session.send(Envelope::bad_input(cid, "Must join topic before sending messages"));
            return;
        }
        if serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&req.data).is_err() {
            session.send(Envelope::bad_input(cid, "Message data must be a JSON object"));
            return;
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        let created_at = super::now_millis();
        let message = Envelope::new(
            "",
            Payload::TopicMessage(TopicMessage {
                topic: req.topic,
                user_id: session.user_id().to_string(),
                handle: session.handle().to_string(),
                message_id: message_id.clone(),
                created_at,
                data: req.data,
            }),
        );
        self.registry
            .send_to(&self.tracker.presences(&stream), &message, Some(session.id()));

        session.send(Envelope::new(
            cid,
            Payload::TopicMessageAck(TopicMessageAck {
                message_id,
                created_at,
                handle: session.handle().to_string(),
            }),
        ));
    }
}

#[async_trait]
impl Handler for TopicService {
    fn kinds(&self) -> &'static [PayloadKind] {
        &[
            PayloadKind::TopicJoin,
            PayloadKind::TopicLeave,
            PayloadKind::TopicMessageSend,
        ]
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        let cid = envelope.collation_id;
        match envelope.payload {
            Some(Payload::TopicJoin(req)) => self.join(&session, cid, req),
            Some(Payload::TopicLeave(req)) => self.leave(&session, cid, req),
            Some(Payload::TopicMessageSend(req)) => self.message_send(&session, cid, req),
            _ => {}
        }
    }
}
