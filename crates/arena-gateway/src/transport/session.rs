use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::Message;
use tokio::sync::{mpsc, Notify};
use tracing::warn;

use arena_core::Envelope;

use crate::session::Session;

use super::codec::encode_envelope;

/// Session backed by a WebSocket connection's outbound queue.
pub struct WsSession {
    id: String,
    user_id: String,
    handle: String,
    tx: mpsc::Sender<Message>,
    closed: AtomicBool,
    close_notify: Notify,
}

impl WsSession {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        handle: impl Into<String>,
        tx: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            handle: handle.into(),
            tx,
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once `close` has been called. Single waiter: the connection loop.
    pub async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        self.close_notify.notified().await;
    }
}

impl Session for WsSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    fn send(&self, envelope: Envelope) {
        if self.is_closed() {
            return;
        }
        match encode_envelope(&envelope) {
            Ok(text) => {
                // lossy on a full queue: the connection is too slow to keep up
                if self.tx.try_send(Message::Text(text)).is_err() {
                    warn!(session = %self.id, "outbound queue full or closed, dropping envelope");
                }
            }
            Err(e) => warn!(session = %self.id, error = %e, "envelope encode failed"),
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.close_notify.notify_one();
        }
    }
}
