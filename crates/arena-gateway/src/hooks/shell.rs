//! Subprocess runtime that executes configured commands.
//!
//! Each invocation spawns the command and writes one JSON request to stdin:
//!
//! - hooks: `{"stage", "kind", "context", "envelope"}`; stdout is the
//!   replacement envelope as JSON, empty stdout keeps the envelope as is.
//! - rpc: `{"id", "context", "payload"}`; stdout is the response payload.
//!
//! A non-zero exit is a failure carrying stderr. Every call is bounded by the
//! configured timeout and the child is killed when it is abandoned.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use arena_core::PayloadKind;

use crate::config::schema::RuntimeSection;

use super::runtime::{HookContext, HookStage, Runtime, RuntimeError};

/// Program plus arguments, spawned without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct ShellRuntime {
    hooks: HashMap<(HookStage, &'static str), ShellCommand>,
    rpc: HashMap<String, ShellCommand>,
    timeout: Duration,
}

impl ShellRuntime {
    pub fn new(timeout: Duration) -> Self {
        Self {
            hooks: HashMap::new(),
            rpc: HashMap::new(),
            timeout,
        }
    }

    /// Build from validated config. Entries naming an unknown kind are skipped.
    pub fn from_config(cfg: &RuntimeSection) -> Self {
        let mut rt = Self::new(Duration::from_millis(cfg.hook_timeout_ms));
        for h in &cfg.hooks {
            if let Some(kind) = PayloadKind::from_name(&h.kind) {
                rt = rt.with_hook(h.stage, kind, ShellCommand::new(&h.command, &h.args));
            }
        }
        for r in &cfg.rpc {
            rt = rt.with_rpc(&r.id, ShellCommand::new(&r.command, &r.args));
        }
        rt
    }

    pub fn with_hook(mut self, stage: HookStage, kind: PayloadKind, cmd: ShellCommand) -> Self {
        self.hooks.insert((stage, kind.as_str()), cmd);
        self
    }

    pub fn with_rpc(mut self, id: impl Into<String>, cmd: ShellCommand) -> Self {
        self.rpc.insert(id.into(), cmd);
        self
    }

    fn hook_command(&self, stage: HookStage, kind: &str) -> Option<&ShellCommand> {
        let kind = PayloadKind::from_name(kind)?;
        self.hooks.get(&(stage, kind.as_str()))
    }

    async fn run(&self, cmd: &ShellCommand, input: Vec<u8>) -> Result<Vec<u8>, RuntimeError> {
        let mut child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::Failed(format!("spawn {}: {e}", cmd.program)))?;

        // The timeout covers feeding stdin as well as the wait.
        let stdin = child.stdin.take();
        let program = cmd.program.as_str();
        let feed = async move {
            let Some(mut stdin) = stdin else { return; };
            // Commands that ignore stdin may close it early.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(%program, error = %e, "hook stdin write failed");
            }
        };
        let call = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RuntimeError::Timeout(self.timeout))?
            .map_err(|e| RuntimeError::Failed(format!("wait {}: {e}", cmd.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", cmd.program, output.status)
            } else {
                stderr
            };
            return Err(RuntimeError::Failed(reason));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Runtime for ShellRuntime {
    fn hook_registered(&self, stage: HookStage, kind: &str) -> bool {
        self.hook_command(stage, kind).is_some()
    }

    async fn invoke_hook(
        &self,
        stage: HookStage,
        kind: &str,
        ctx: &HookContext,
        envelope: Value,
    ) -> Result<Value, RuntimeError> {
        let cmd = self
            .hook_command(stage, kind)
            .ok_or_else(|| RuntimeError::NotFound(format!("{} {kind}", stage.as_str())))?;

        let request = json!({
            "stage": stage,
            "kind": kind,
            "context": ctx,
            "envelope": &envelope,
        });
        let stdout = self.run(cmd, request.to_string().into_bytes()).await?;

        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(envelope);
        }
        serde_json::from_slice(&stdout)
            .map_err(|e| RuntimeError::Failed(format!("invalid hook output: {e}")))
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
        let cmd = self
            .rpc
            .get(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;

        let request = json!({ "id": id, "context": ctx, "payload": payload });
        let stdout = self.run(cmd, request.to_string().into_bytes()).await?;

        let out = String::from_utf8(stdout)
            .map_err(|e| RuntimeError::Failed(format!("rpc output is not utf-8: {e}")))?;
        Ok(out.trim_end_matches('\n').to_string())
    }
}
