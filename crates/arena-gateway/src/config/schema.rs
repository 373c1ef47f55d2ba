use std::collections::HashSet;

use serde::Deserialize;

use arena_core::error::{ArenaError, Result};
use arena_core::PayloadKind;

use crate::hooks::HookStage;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub runtime: RuntimeSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ArenaError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.runtime.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-session outbound frame queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Per-session inbound envelope queue feeding the session worker.
    #[serde(default = "default_inbound_queue")]
    pub inbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
            inbound_queue: default_inbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ArenaError::BadInput(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(ArenaError::BadInput(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(ArenaError::BadInput(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if self.outbound_queue == 0 || self.inbound_queue == 0 {
            return Err(ArenaError::BadInput(
                "gateway queues must hold at least one message".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:7350".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    1024
}
fn default_inbound_queue() -> usize {
    64
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Refuse to boot while any request kind has no handler.
    #[serde(default)]
    pub strict_routes: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(default = "default_hook_timeout_ms")]
    pub hook_timeout_ms: u64,

    #[serde(default)]
    pub hooks: Vec<HookConfig>,

    #[serde(default)]
    pub rpc: Vec<RpcConfig>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            hook_timeout_ms: default_hook_timeout_ms(),
            hooks: Vec::new(),
            rpc: Vec::new(),
        }
    }
}

impl RuntimeSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.hook_timeout_ms) {
            return Err(ArenaError::BadInput(
                "runtime.hook_timeout_ms must be between 10 and 60000".into(),
            ));
        }

        let mut seen = HashSet::new();
        for h in &self.hooks {
            match PayloadKind::from_name(&h.kind) {
                Some(kind) if kind.is_request() => {}
                _ => {
                    return Err(ArenaError::BadInput(format!(
                        "runtime.hooks: unknown request kind: {}",
                        h.kind
                    )))
                }
            }
            if h.command.is_empty() {
                return Err(ArenaError::BadInput(format!(
                    "runtime.hooks: {} {} has an empty command",
                    h.stage.as_str(),
                    h.kind
                )));
            }
            if !seen.insert((h.stage, h.kind.as_str())) {
                return Err(ArenaError::BadInput(format!(
                    "runtime.hooks: duplicate {} hook for {}",
                    h.stage.as_str(),
                    h.kind
                )));
            }
        }

        let mut ids = HashSet::new();
        for r in &self.rpc {
            if r.id.is_empty() || r.command.is_empty() {
                return Err(ArenaError::BadInput(
                    "runtime.rpc: id and command must be set".into(),
                ));
            }
            if !ids.insert(r.id.as_str()) {
                return Err(ArenaError::BadInput(format!(
                    "runtime.rpc: duplicate id: {}",
                    r.id
                )));
            }
        }
        Ok(())
    }
}

fn default_hook_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookConfig {
    pub stage: HookStage,
    /// Message-kind name, e.g. `GroupCreate`.
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcConfig {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}
