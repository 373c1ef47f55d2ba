//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use arena_core::error::{ArenaError, Result};

pub use schema::{
    GatewayConfig, GatewaySection, HookConfig, PipelineSection, RpcConfig, RuntimeSection,
};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ArenaError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| ArenaError::BadInput(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
