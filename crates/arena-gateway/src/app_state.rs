//! Shared application state for the arena gateway.
//!
//! Builds the extension runtime, collaborators, dispatch table, and pipeline
//! from config. Startup problems are returned as errors, never panics.

use std::sync::Arc;

use arena_core::error::{ArenaError, Result};

use crate::config::GatewayConfig;
use crate::dispatch::DispatchTable;
use crate::hooks::ShellRuntime;
use crate::pipeline::{Collaborators, Pipeline};
use crate::services;

/// Authenticated caller resolved from a connect token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub handle: String,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    pipeline: Arc<Pipeline>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Gateway with the configured subprocess runtime and the built-in services.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let runtime = Arc::new(ShellRuntime::from_config(&cfg.runtime));
        let collab = Collaborators::new(runtime);
        let table = services::register_builtin(DispatchTable::builder(), &collab)?.build();
        Self::with_pipeline(cfg, Pipeline::new(collab, table))
    }

    /// Gateway around an embedder-built pipeline.
    pub fn with_pipeline(cfg: GatewayConfig, pipeline: Pipeline) -> Result<Self> {
        // dispatch table completeness check
        let unrouted: Vec<&str> = pipeline
            .table()
            .unrouted()
            .into_iter()
            .map(|k| k.as_str())
            .collect();
        if !unrouted.is_empty() {
            if cfg.pipeline.strict_routes {
                return Err(ArenaError::BadInput(format!(
                    "request kinds without a handler: {}",
                    unrouted.join(", ")
                )));
            }
            tracing::warn!(kinds = %unrouted.join(","), "request kinds without a handler will answer UNRECOGNIZED_PAYLOAD");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    /// Development token scheme: `dev` or `dev:<handle>`.
    pub fn resolve_token(&self, token: &str) -> Result<Identity> {
        match token.split_once(':') {
            None if token == "dev" => Ok(Identity {
                user_id: "user:dev".to_string(),
                handle: "dev".to_string(),
            }),
            Some(("dev", handle)) if !handle.is_empty() => Ok(Identity {
                user_id: format!("user:{handle}"),
                handle: handle.to_string(),
            }),
            _ => Err(ArenaError::AuthFailed),
        }
    }
}
