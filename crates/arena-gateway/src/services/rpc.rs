use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use arena_core::protocol::payload::Rpc;
use arena_core::{Envelope, ErrorCode, Payload, PayloadKind};

use crate::dispatch::Handler;
use crate::hooks::{HookContext, Runtime, RuntimeError};
use crate::session::SessionRef;

/// Calls custom functions registered in the extension runtime.
pub struct RpcService {
    runtime: Arc<dyn Runtime>,
}

impl RpcService {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl Handler for RpcService {
    fn kinds(&self) -> &'static [PayloadKind] {
        &[PayloadKind::Rpc]
    }

    async fn handle(&self, session: SessionRef, envelope: Envelope) {
        let Some(Payload::Rpc(req)) = envelope.payload else { return; };
        let cid = envelope.collation_id;

        if req.id.is_empty() {
            session.send(Envelope::bad_input(cid, "RPC ID must be set"));
            return;
        }

        if !self.runtime.rpc_registered(&req.id) {
            session.send(Envelope::error(
                cid,
                ErrorCode::RuntimeFunctionNotFound,
                "RPC function not found",
            ));
            return;
        }

        let ctx = HookContext::from_session(session.as_ref());
        match self.runtime.invoke_rpc(&req.id, &ctx, req.payload).await {
            Ok(payload) => {
                session.send(Envelope::new(cid, Payload::Rpc(Rpc { id: req.id, payload })));
            }
            Err(RuntimeError::NotFound(_)) => {
                session.send(Envelope::error(
                    cid,
                    ErrorCode::RuntimeFunctionNotFound,
                    "RPC function not found",
                ));
            }
            Err(e) => {
                error!(id = %req.id, error = %e, "rpc function caused an error");
                session.send(Envelope::error(
                    cid,
                    ErrorCode::RuntimeFunctionException,
                    format!("Error running RPC function: {e}"),
                ));
            }
        }
    }
}
