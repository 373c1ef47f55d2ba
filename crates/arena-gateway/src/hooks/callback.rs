use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::Value;

use arena_core::PayloadKind;

use super::runtime::{HookContext, HookStage, Runtime, RuntimeError};

type HookFn =
    Arc<dyn Fn(HookContext, Value) -> BoxFuture<'static, Result<Value, RuntimeError>> + Send + Sync>;
type RpcFn =
    Arc<dyn Fn(HookContext, String) -> BoxFuture<'static, Result<String, RuntimeError>> + Send + Sync>;

/// In-process runtime backed by registered async closures.
///
/// An empty `CallbackRuntime` has no hooks and no functions, which makes the
/// hook layer a pass-through.
#[derive(Default)]
pub struct CallbackRuntime {
    hooks: DashMap<(HookStage, &'static str), HookFn>,
    rpc: DashMap<String, RpcFn>,
}

impl CallbackRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_hook<F, Fut>(&self, stage: HookStage, kind: PayloadKind, f: F)
    where
        F: Fn(HookContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RuntimeError>> + Send + 'static,
    {
        let f: HookFn = Arc::new(move |ctx, v| Box::pin(f(ctx, v)));
        self.hooks.insert((stage, kind.as_str()), f);
    }

    pub fn register_before<F, Fut>(&self, kind: PayloadKind, f: F)
    where
        F: Fn(HookContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RuntimeError>> + Send + 'static,
    {
        self.register_hook(HookStage::Before, kind, f);
    }

    pub fn register_after<F, Fut>(&self, kind: PayloadKind, f: F)
    where
        F: Fn(HookContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RuntimeError>> + Send + 'static,
    {
        self.register_hook(HookStage::After, kind, f);
    }

    pub fn register_rpc<F, Fut>(&self, id: impl Into<String>, f: F)
    where
        F: Fn(HookContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, RuntimeError>> + Send + 'static,
    {
        let f: RpcFn = Arc::new(move |ctx, p| Box::pin(f(ctx, p)));
        self.rpc.insert(id.into(), f);
    }
}

#[async_trait]
impl Runtime for CallbackRuntime {
    fn hook_registered(&self, stage: HookStage, kind: &str) -> bool {
        PayloadKind::from_name(kind)
            .map(|k| self.hooks.contains_key(&(stage, k.as_str())))
            .unwrap_or(false)
    }

    async fn invoke_hook(
        &self,
        stage: HookStage,
        kind: &str,
        ctx: &HookContext,
        envelope: Value,
    ) -> Result<Value, RuntimeError> {
        let f = PayloadKind::from_name(kind)
            .and_then(|k| self.hooks.get(&(stage, k.as_str())).map(|e| e.value().clone()))
            .ok_or_else(|| RuntimeError::NotFound(format!("{} {kind}", stage.as_str())))?;
        // The map guard is released before awaiting.
        f(ctx.clone(), envelope).await
    }

    fn rpc_registered(&self, id: &str) -> bool {
        self.rpc.contains_key(id)
    }

    async fn invoke_rpc(
        &self,
        id: &str,
        ctx: &HookContext,
        payload: String,
    ) -> Result<String, RuntimeError> {
        let f = self
            .rpc
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        f(ctx.clone(), payload).await
    }
}
