use std::sync::Arc;

use thiserror::Error;

use arena_core::{Envelope, PayloadKind};

use crate::session::Session;

use super::runtime::{HookContext, HookStage, Runtime, RuntimeError};

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode hook result: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("hook returned {actual} for a {expected} message")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Bridges envelopes through the extension runtime by message-kind name.
#[derive(Clone)]
pub struct HookAdapter {
    runtime: Arc<dyn Runtime>,
}

impl HookAdapter {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }

    /// Run the before-hook for `kind`.
    ///
    /// Without a registered hook the envelope is returned untouched and
    /// nothing is serialised. A hook result must decode strictly and carry the
    /// same kind.
    pub async fn run_before(
        &self,
        kind: PayloadKind,
        envelope: Envelope,
        session: &dyn Session,
    ) -> Result<Envelope, HookError> {
        if !self.runtime.hook_registered(HookStage::Before, kind.as_str()) {
            return Ok(envelope);
        }

        let form = serde_json::to_value(&envelope).map_err(HookError::Encode)?;
        let ctx = HookContext::from_session(session);
        let out = self
            .runtime
            .invoke_hook(HookStage::Before, kind.as_str(), &ctx, form)
            .await?;

        let replaced: Envelope = serde_json::from_value(out).map_err(HookError::Decode)?;
        match replaced.kind() {
            Some(k) if k == kind => Ok(replaced),
            other => Err(HookError::KindMismatch {
                expected: kind.as_str(),
                actual: other.map(PayloadKind::as_str).unwrap_or("no payload"),
            }),
        }
    }

    /// Run the after-hook for `kind`. Its result is discarded.
    pub async fn run_after(
        &self,
        kind: PayloadKind,
        envelope: &Envelope,
        session: &dyn Session,
    ) -> Result<(), HookError> {
        if !self.runtime.hook_registered(HookStage::After, kind.as_str()) {
            return Ok(());
        }

        let form = serde_json::to_value(envelope).map_err(HookError::Encode)?;
        let ctx = HookContext::from_session(session);
        self.runtime
            .invoke_hook(HookStage::After, kind.as_str(), &ctx, form)
            .await?;
        Ok(())
    }
}
