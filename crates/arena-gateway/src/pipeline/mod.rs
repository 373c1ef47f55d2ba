//! Request pipeline: before-hook, dispatch, after-hook.
//!
//! Per request:
//! 1. no payload: answer `MISSING_PAYLOAD`; no hooks run
//! 2. before-hook error: answer `RUNTIME_FUNCTION_EXCEPTION` on the original
//!    collation id; no dispatch, no after-hook
//! 3. dispatch: `Logout` removes and closes the session, then carries on;
//!    an unrouted kind answers `UNRECOGNIZED_PAYLOAD` and stops (no after-hook)
//! 4. after-hook: errors are logged only
//!
//! The pipeline holds no per-request state and never locks its
//! collaborators, so it is shared across all session workers.

mod worker;

use std::sync::Arc;

use tracing::{debug, error, warn, Instrument};

use arena_core::{Envelope, ErrorCode, PayloadKind};

use crate::dispatch::{DispatchTable, Route};
use crate::hooks::{HookAdapter, Runtime};
use crate::realtime::{InMemoryMatchmaker, Matchmaker, Tracker};
use crate::session::{SessionRef, SessionRegistry};
use crate::social::{SocialClient, UnconfiguredSocial};

pub use worker::SessionWorker;

/// Process-wide shared dependencies, passed in explicitly so tests can swap any of them.
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<SessionRegistry>,
    pub tracker: Arc<Tracker>,
    pub matchmaker: Arc<dyn Matchmaker>,
    pub social: Arc<dyn SocialClient>,
    pub runtime: Arc<dyn Runtime>,
}

impl Collaborators {
    /// Fresh registry and tracker, in-memory matchmaker, no social provider.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            tracker: Arc::new(Tracker::new()),
            matchmaker: Arc::new(InMemoryMatchmaker::new()),
            social: Arc::new(UnconfiguredSocial),
            runtime,
        }
    }

    pub fn with_social(mut self, social: Arc<dyn SocialClient>) -> Self {
        self.social = social;
        self
    }
}

pub struct Pipeline {
    collab: Collaborators,
    hooks: HookAdapter,
    table: DispatchTable,
}

impl Pipeline {
    pub fn new(collab: Collaborators, table: DispatchTable) -> Self {
        let hooks = HookAdapter::new(Arc::clone(&collab.runtime));
        Self {
            collab,
            hooks,
            table,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Single entry point for a decoded inbound envelope.
    ///
    /// All outcomes are observable only through `session.send` and logs.
    pub async fn process_request(&self, session: &SessionRef, envelope: Envelope) {
        let Some(kind) = envelope.kind() else {
            warn!(session = %session.id(), collation_id = %envelope.collation_id, "request without payload");
            session.send(Envelope::error(
                envelope.collation_id,
                ErrorCode::MissingPayload,
                "No payload found",
            ));
            return;
        };

        let span = tracing::debug_span!(
            "request",
            kind = kind.as_str(),
            session = %session.id(),
            user = %session.user_id(),
        );
        self.run(session, kind, envelope).instrument(span).await
    }

    async fn run(&self, session: &SessionRef, kind: PayloadKind, original: Envelope) {
        debug!(kind = kind.as_str(), "received message");

        let original_collation_id = original.collation_id.clone();
        let envelope = match self.hooks.run_before(kind, original, session.as_ref()).await {
            Ok(env) => env,
            Err(e) => {
                error!(kind = kind.as_str(), session = %session.id(), error = %e, "runtime before function caused an error");
                session.send(Envelope::error(
                    original_collation_id,
                    ErrorCode::RuntimeFunctionException,
                    format!("Runtime before function caused an error: {e}"),
                ));
                return;
            }
        };

        match self.table.route(kind) {
            Route::Logout => {
                self.collab.registry.remove(session.as_ref());
                session.close();
                debug!(session = %session.id(), "session logged out");
            }
            Route::Handler(handler) => {
                handler.handle(Arc::clone(session), envelope.clone()).await;
            }
            Route::Unrecognized => {
                warn!(kind = kind.as_str(), session = %session.id(), "unrecognized payload");
                session.send(Envelope::error(
                    envelope.collation_id,
                    ErrorCode::UnrecognizedPayload,
                    "Unrecognized payload",
                ));
                return;
            }
        }

        if let Err(e) = self.hooks.run_after(kind, &envelope, session.as_ref()).await {
            warn!(kind = kind.as_str(), session = %session.id(), error = %e, "runtime after function caused an error");
        }
    }
}
