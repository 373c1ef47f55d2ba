use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::session::Session;

/// When a hook runs relative to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    Before,
    After,
}

impl HookStage {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStage::Before => "before",
            HookStage::After => "after",
        }
    }
}

/// Caller identity handed to extension code alongside the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookContext {
    pub session_id: String,
    pub user_id: String,
    pub handle: String,
}

impl HookContext {
    pub fn from_session(session: &dyn Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            user_id: session.user_id().to_string(),
            handle: session.handle().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("function not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Extension engine capability.
///
/// Hooks are keyed by `(stage, message-kind name)`, rpc functions by id.
/// Implementations must tolerate concurrent calls from many sessions.
#[async_trait]
pub trait Runtime: Send + Sync {
    fn hook_registered(&self, stage: HookStage, kind: &str) -> bool;

    /// Run a hook over the structured form of an envelope and return the
    /// (possibly identical) structured form.
    async fn invoke_hook(
        &self,
        stage: HookStage,
        kind: &str,
        ctx: &HookContext,
        envelope: Value,
    ) -> Result<Value, RuntimeError>;

    fn rpc_registered(&self, id: &str) -> bool;

    async fn invoke_rpc(
        &self,
        id: &str,
        ctx: &HookContext,
        payload: String,
    ) -> Result<String, RuntimeError>;
}
