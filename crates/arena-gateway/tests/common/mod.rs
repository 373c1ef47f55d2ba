//! Test doubles shared by gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use arena_core::{Envelope, ErrorCode, PayloadKind};
use arena_gateway::dispatch::Handler;
use arena_gateway::session::{Session, SessionRef};

/// Session that records everything sent to it.
pub struct RecordingSession {
    id: String,
    user_id: String,
    sent: Mutex<Vec<Envelope>>,
    closes: AtomicUsize,
}

impl RecordingSession {
    pub fn new(id: &str, user_id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            sent: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// The only envelope sent, which must be an error; returns (collation_id, code, message).
    pub fn single_error(&self) -> (String, ErrorCode, String) {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one envelope, got {sent:?}");
        let err = sent[0].as_error().expect("expected an error envelope");
        (sent[0].collation_id.clone(), err.code, err.message.clone())
    }
}

impl Session for RecordingSession {
    fn id(&self) -> &str {
        &self.id
    }
    fn user_id(&self) -> &str {
        &self.user_id
    }
    fn handle(&self) -> &str {
        &self.user_id
    }
    fn send(&self, envelope: Envelope) {
        self.sent.lock().unwrap().push(envelope);
    }
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn as_ref(s: &Arc<RecordingSession>) -> SessionRef {
    s.clone()
}

/// Ordered log of pipeline stages across hooks and handlers.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }
    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Handler that records envelopes it receives and acks them.
pub struct RecordingHandler {
    kinds: &'static [PayloadKind],
    pub received: Mutex<Vec<Envelope>>,
    log: EventLog,
    delay_ms: u64,
}

impl RecordingHandler {
    pub fn new(kinds: &'static [PayloadKind], log: EventLog) -> Arc<Self> {
        Self::with_delay(kinds, log, 0)
    }

    pub fn with_delay(kinds: &'static [PayloadKind], log: EventLog, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            kinds,
            received: Mutex::new(Vec::new()),
            log,
            delay_ms,
        })
    }

    pub fn received(&self) -> Vec<Envelope> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    fn kinds(&self) -> &'static [PayloadKind] {
        self.kinds
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        self.log.push(format!("dispatch:{}", envelope.collation_id));
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.received.lock().unwrap().push(envelope.clone());
        session.send(Envelope::ack(envelope.collation_id));
    }
}
