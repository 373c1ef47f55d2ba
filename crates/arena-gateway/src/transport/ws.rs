//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Resolve the connect token to an identity
//! - Register the session and start its worker
//! - Decode text frames into envelopes and queue them on the worker
//! - Lifecycle: ping, idle timeout, close requested by the pipeline
//! - Cleanup of registry, tracker, and matchmaker on exit

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

use arena_core::error::Result;
use arena_core::Envelope;

use crate::app_state::AppState;
use crate::pipeline::SessionWorker;
use crate::session::{Session, SessionRef};

use super::codec::decode_frame;
use super::session::WsSession;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, q, socket).await {
            debug!(error = %e, "session ended with error");
        }
    })
}

async fn run_session(app: AppState, q: WsQuery, socket: WebSocket) -> Result<()> {
    let identity = app.resolve_token(&q.token)?;
    let gw = &app.cfg().gateway;
    let pipeline = app.pipeline();
    let collab = pipeline.collaborators().clone();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.outbound_queue);
    let session = Arc::new(WsSession::new(
        uuid::Uuid::new_v4().to_string(),
        identity.user_id,
        identity.handle,
        out_tx,
    ));
    let session_ref: SessionRef = session.clone();

    let span = tracing::info_span!("session", session = %session.id(), user = %session.user_id());
    async move {
        collab.registry.insert(Arc::clone(&session_ref));
        let worker = SessionWorker::spawn(Arc::clone(&pipeline), Arc::clone(&session_ref), gw.inbound_queue);
        info!("session opened");

        let (mut ws_tx, mut ws_rx) = socket.split();

        let ping_every = Duration::from_millis(gw.ping_interval_ms);
        let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
        let mut ping_tick = tokio::time::interval(ping_every);
        ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut idle_tick = tokio::time::interval(Duration::from_millis(250));
        let mut last_activity = Instant::now();

        loop {
            tokio::select! {
                // outbound writer
                maybe_out = out_rx.recv() => {
                    let Some(m) = maybe_out else { break; };
                    if ws_tx.send(m).await.is_err() {
                        break;
                    }
                }

                // inbound reader
                incoming = ws_rx.next() => {
                    let Some(Ok(msg)) = incoming else { break; };
                    last_activity = Instant::now();

                    match msg {
                        Message::Text(s) => match decode_frame(&s) {
                            Ok(envelope) => {
                                if worker.submit(envelope).await.is_err() {
                                    break;
                                }
                            }
                            Err(reply) => session.send(reply),
                        },
                        Message::Binary(_) => {
                            session.send(Envelope::bad_input("", "binary frames are not supported"));
                        }
                        Message::Ping(payload) => {
                            if ws_tx.send(Message::Pong(payload)).await.is_err() {
                                break;
                            }
                        }
                        Message::Pong(_) => {}
                        Message::Close(_) => break,
                    }
                }

                // closed by the pipeline (logout)
                _ = session.closed() => {
                    while let Ok(m) = out_rx.try_recv() {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    if let Err(e) = ws_tx.send(Message::Close(None)).await {
                        debug!(error = %e, "close frame write failed");
                    }
                    break;
                }

                _ = ping_tick.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }

                _ = idle_tick.tick() => {
                    if last_activity.elapsed() >= idle_timeout {
                        debug!("idle timeout");
                        break;
                    }
                }
            }
        }

        // Queued envelopes still run; their sends are dropped once closed.
        drop(worker);
        session.close();
        collab.registry.remove(session_ref.as_ref());
        collab.tracker.untrack_all(session.id());
        collab.matchmaker.remove_all(session.id());
        info!("session closed");
    }
    .instrument(span)
    .await;

    Ok(())
}
