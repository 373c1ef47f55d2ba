use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use arena_core::error::{ArenaError, Result};
use arena_core::{Envelope, PayloadKind};

use crate::session::SessionRef;

/// Domain logic for one or more message kinds.
///
/// Handlers produce every client-visible result by calling `session.send`.
/// They run inside the request's tracing span, so plain `tracing` macros
/// carry the kind and session.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Kinds this handler serves when registered with [`DispatchTableBuilder::register`].
    fn kinds(&self) -> &'static [PayloadKind];

    async fn handle(&self, session: SessionRef, envelope: Envelope);
}

/// Result of a table lookup.
#[derive(Clone)]
pub enum Route {
    /// Reserved kind the pipeline handles itself.
    Logout,
    Handler(Arc<dyn Handler>),
    Unrecognized,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Logout => f.write_str("Logout"),
            Route::Handler(_) => f.write_str("Handler(..)"),
            Route::Unrecognized => f.write_str("Unrecognized"),
        }
    }
}

/// Message kind -> handler. Built once; read-only afterwards.
pub struct DispatchTable {
    routes: HashMap<PayloadKind, Arc<dyn Handler>>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    /// Table with no handlers: only `Logout` is recognised.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn route(&self, kind: PayloadKind) -> Route {
        if kind == PayloadKind::Logout {
            return Route::Logout;
        }
        match self.routes.get(&kind) {
            Some(h) => Route::Handler(Arc::clone(h)),
            None => Route::Unrecognized,
        }
    }

    pub fn routed_kinds(&self) -> Vec<PayloadKind> {
        let mut kinds: Vec<PayloadKind> = self.routes.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Request kinds with no handler (never includes `Logout`).
    pub fn unrouted(&self) -> Vec<PayloadKind> {
        PayloadKind::REQUESTS
            .iter()
            .copied()
            .filter(|k| *k != PayloadKind::Logout && !self.routes.contains_key(k))
            .collect()
    }
}

#[derive(Default)]
pub struct DispatchTableBuilder {
    routes: HashMap<PayloadKind, Arc<dyn Handler>>,
}

impl DispatchTableBuilder {
    /// Route a single kind.
    ///
    /// Fails for `Logout`, for response-only kinds, and for a kind that is
    /// already routed.
    pub fn route(mut self, kind: PayloadKind, handler: Arc<dyn Handler>) -> Result<Self> {
        if kind == PayloadKind::Logout {
            return Err(ArenaError::BadInput("Logout is handled by the pipeline".into()));
        }
        if !kind.is_request() {
            return Err(ArenaError::BadInput(format!(
                "{kind} is a response kind and cannot be routed"
            )));
        }
        if self.routes.contains_key(&kind) {
            return Err(ArenaError::BadInput(format!("{kind} is already routed")));
        }
        self.routes.insert(kind, handler);
        Ok(self)
    }

    /// Route every kind the handler declares.
    pub fn register(self, handler: Arc<dyn Handler>) -> Result<Self> {
        handler
            .kinds()
            .iter()
            .try_fold(self, |b, kind| b.route(*kind, Arc::clone(&handler)))
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            routes: self.routes,
        }
    }
}
