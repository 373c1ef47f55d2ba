//! Subprocess runtime driven through `sh -c`.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use arena_core::protocol::payload::{GroupCreate, NewGroup};
use arena_core::{Envelope, Payload, PayloadKind};
use arena_gateway::config;
use arena_gateway::hooks::{
    HookAdapter, HookContext, HookError, HookStage, Runtime, RuntimeError, ShellCommand,
    ShellRuntime,
};

use common::RecordingSession;

fn sh(script: &str) -> ShellCommand {
    ShellCommand::new("sh", ["-c", script])
}

fn ctx() -> HookContext {
    HookContext {
        session_id: "s1".into(),
        user_id: "u1".into(),
        handle: "alice".into(),
    }
}

fn group_create(name: &str) -> Envelope {
    Envelope::new(
        "c1",
        Payload::GroupCreate(GroupCreate {
            groups: vec![NewGroup {
                name: name.into(),
                ..Default::default()
            }],
        }),
    )
}

fn before(script: &str) -> ShellRuntime {
    ShellRuntime::new(Duration::from_secs(5)).with_hook(
        HookStage::Before,
        PayloadKind::GroupCreate,
        sh(script),
    )
}

#[tokio::test]
async fn empty_output_keeps_envelope() {
    let adapter = HookAdapter::new(Arc::new(before("cat > /dev/null")));
    let session = RecordingSession::new("s1", "u1");

    let out = adapter
        .run_before(PayloadKind::GroupCreate, group_create("a"), &*session)
        .await
        .unwrap();
    assert_eq!(out, group_create("a"));
}

#[tokio::test]
async fn output_replaces_envelope() {
    let script = r#"cat > /dev/null; echo '{"collation_id":"c1","payload":{"group_create":{"groups":[{"name":"renamed"}]}}}'"#;
    let adapter = HookAdapter::new(Arc::new(before(script)));
    let session = RecordingSession::new("s1", "u1");

    let out = adapter
        .run_before(PayloadKind::GroupCreate, group_create("a"), &*session)
        .await
        .unwrap();
    assert_eq!(out, group_create("renamed"));
}

#[tokio::test]
async fn hook_receives_stage_kind_context_and_envelope() {
    let rt = before("cat");
    let envelope = serde_json::to_value(group_create("a")).unwrap();

    // `cat` echoes the request, which is not an envelope, so read it raw.
    let out = rt
        .invoke_hook(HookStage::Before, "GroupCreate", &ctx(), envelope.clone())
        .await
        .unwrap();
    assert_eq!(
        out,
        json!({
            "stage": "before",
            "kind": "GroupCreate",
            "context": {"session_id": "s1", "user_id": "u1", "handle": "alice"},
            "envelope": envelope,
        })
    );
}

#[tokio::test]
async fn failing_command_reports_stderr() {
    let rt = before("cat > /dev/null; echo 'name is taken' >&2; exit 3");
    let err = rt
        .invoke_hook(HookStage::Before, "GroupCreate", &ctx(), Value::Null)
        .await
        .unwrap_err();
    match err {
        RuntimeError::Failed(msg) => assert_eq!(msg, "name is taken"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn garbage_output_is_a_decode_failure() {
    let adapter = HookAdapter::new(Arc::new(before("cat > /dev/null; echo 'not json'")));
    let session = RecordingSession::new("s1", "u1");

    let err = adapter
        .run_before(PayloadKind::GroupCreate, group_create("a"), &*session)
        .await
        .unwrap_err();
    assert!(matches!(err, HookError::Runtime(RuntimeError::Failed(_))), "{err:?}");
}

#[tokio::test]
async fn slow_command_times_out() {
    let rt = ShellRuntime::new(Duration::from_millis(50)).with_hook(
        HookStage::After,
        PayloadKind::GroupCreate,
        sh("sleep 5"),
    );
    let err = rt
        .invoke_hook(HookStage::After, "GroupCreate", &ctx(), Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn timeout_covers_a_child_that_never_reads_stdin() {
    let rt = Arc::new(ShellRuntime::new(Duration::from_millis(200)).with_hook(
        HookStage::Before,
        PayloadKind::GroupCreate,
        sh("sleep 4"),
    ));
    let adapter = HookAdapter::new(rt);
    let session = RecordingSession::new("s1", "u1");
    // Far larger than a pipe buffer, so the stdin write cannot complete.
    let big = group_create(&"x".repeat(512 * 1024));

    let started = Instant::now();
    let err = adapter
        .run_before(PayloadKind::GroupCreate, big, &*session)
        .await
        .unwrap_err();
    assert!(
        matches!(err, HookError::Runtime(RuntimeError::Timeout(_))),
        "{err:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn rpc_payload_is_stdout() {
    let rt = ShellRuntime::new(Duration::from_secs(5)).with_rpc("echo", sh("cat"));
    assert!(rt.rpc_registered("echo"));
    assert!(!rt.rpc_registered("other"));

    let out = rt.invoke_rpc("echo", &ctx(), "hello".into()).await.unwrap();
    let request: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(request["id"], "echo");
    assert_eq!(request["payload"], "hello");
    assert_eq!(request["context"]["user_id"], "u1");

    let rt = ShellRuntime::new(Duration::from_secs(5))
        .with_rpc("greet", sh("cat > /dev/null; echo hi"));
    assert_eq!(rt.invoke_rpc("greet", &ctx(), String::new()).await.unwrap(), "hi");
}

#[tokio::test]
async fn unknown_rpc_is_not_found() {
    let rt = ShellRuntime::new(Duration::from_secs(5));
    let err = rt.invoke_rpc("nope", &ctx(), String::new()).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotFound(_)));
}

#[test]
fn built_from_config() {
    let cfg = config::load_from_str(
        r#"
version: 1
runtime:
  hooks:
    - { stage: after, kind: MatchCreate, command: "sh", args: ["-c", "true"] }
  rpc:
    - { id: reward, command: "./reward" }
"#,
    )
    .unwrap();
    let rt = ShellRuntime::from_config(&cfg.runtime);
    assert!(rt.hook_registered(HookStage::After, "MatchCreate"));
    assert!(!rt.hook_registered(HookStage::Before, "MatchCreate"));
    assert!(rt.rpc_registered("reward"));
}
