use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use arena_core::error::{ArenaError, Result};
use arena_core::Envelope;

use crate::session::SessionRef;

use super::Pipeline;

/// One task per session draining its inbound envelopes in arrival order.
///
/// A request's full before/dispatch/after chain completes before the next
/// one starts. Dropping the worker closes the queue; already queued
/// envelopes are still processed.
pub struct SessionWorker {
    tx: mpsc::Sender<Envelope>,
    task: JoinHandle<()>,
}

impl SessionWorker {
    pub fn spawn(pipeline: Arc<Pipeline>, session: SessionRef, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(capacity.max(1));
        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                pipeline.process_request(&session, envelope).await;
            }
        });
        Self { tx, task }
    }

    /// Queue an envelope, waiting while the queue is full.
    pub async fn submit(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| ArenaError::Internal("session worker stopped".into()))
    }

    /// Stop accepting envelopes and wait for the queued ones to finish.
    pub async fn shutdown(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "session worker ended abnormally");
        }
    }
}
