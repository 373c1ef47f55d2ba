//! Request pipeline control-flow tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::Ready;
use serde_json::{json, Value};

use arena_core::protocol::payload::{GroupCreate, GroupJoin, Logout, MatchData, SelfFetch};
use arena_core::{Envelope, ErrorCode, Payload, PayloadKind};
use arena_gateway::dispatch::DispatchTable;
use arena_gateway::hooks::{CallbackRuntime, HookContext, RuntimeError};
use arena_gateway::pipeline::{Collaborators, Pipeline};

use common::{as_ref, EventLog, RecordingHandler, RecordingSession};

const ROUTED: &[PayloadKind] = &[PayloadKind::SelfFetch, PayloadKind::GroupJoin];

fn build(runtime: &Arc<CallbackRuntime>, handler: &Arc<RecordingHandler>) -> Pipeline {
    let collab = Collaborators::new(runtime.clone());
    let table = DispatchTable::builder()
        .register(handler.clone())
        .unwrap()
        .build();
    Pipeline::new(collab, table)
}

fn counting_hook(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(HookContext, Value) -> Ready<Result<Value, RuntimeError>> + Send + Sync + 'static {
    let counter = counter.clone();
    move |_ctx, v| {
        counter.fetch_add(1, Ordering::SeqCst);
        futures_util::future::ready(Ok(v))
    }
}

fn self_fetch(cid: &str) -> Envelope {
    Envelope::new(cid, Payload::SelfFetch(SelfFetch {}))
}

#[tokio::test]
async fn missing_payload_is_answered_without_hooks() {
    let runtime = Arc::new(CallbackRuntime::new());
    let calls = Arc::new(AtomicUsize::new(0));
    for kind in PayloadKind::ALL {
        runtime.register_before(*kind, counting_hook(&calls));
        runtime.register_after(*kind, counting_hook(&calls));
    }
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), Envelope::ack("c-1"))
        .await;

    let (cid, code, message) = session.single_error();
    assert_eq!(cid, "c-1");
    assert_eq!(code, ErrorCode::MissingPayload);
    assert_eq!(message, "No payload found");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn unrecognized_kind_skips_after_hook() {
    let runtime = Arc::new(CallbackRuntime::new());
    let after_calls = Arc::new(AtomicUsize::new(0));
    runtime.register_after(PayloadKind::GroupCreate, counting_hook(&after_calls));
    runtime.register_after(PayloadKind::MatchData, counting_hook(&after_calls));
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(
            &as_ref(&session),
            Envelope::new("c-2", Payload::GroupCreate(GroupCreate::default())),
        )
        .await;
    let (cid, code, message) = session.single_error();
    assert_eq!(cid, "c-2");
    assert_eq!(code, ErrorCode::UnrecognizedPayload);
    assert_eq!(message, "Unrecognized payload");

    // Response-only kinds sent by a client are never routed either.
    session.take();
    pipeline
        .process_request(
            &as_ref(&session),
            Envelope::new("c-3", Payload::MatchData(MatchData::default())),
        )
        .await;
    assert_eq!(session.single_error().1, ErrorCode::UnrecognizedPayload);

    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn failing_before_hook_vetoes_dispatch() {
    let runtime = Arc::new(CallbackRuntime::new());
    let after_calls = Arc::new(AtomicUsize::new(0));
    runtime.register_before(PayloadKind::SelfFetch, |_ctx, _v| async {
        Err(RuntimeError::Failed("nope".into()))
    });
    runtime.register_after(PayloadKind::SelfFetch, counting_hook(&after_calls));
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), self_fetch("c-4"))
        .await;

    let (cid, code, message) = session.single_error();
    assert_eq!(cid, "c-4");
    assert_eq!(code, ErrorCode::RuntimeFunctionException);
    assert!(message.contains("nope"), "{message}");
    assert!(handler.received().is_empty());
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn before_hook_rewrite_reaches_handler_and_after_hook() {
    let runtime = Arc::new(CallbackRuntime::new());
    runtime.register_before(PayloadKind::GroupJoin, |_ctx, mut v: Value| async move {
        v["payload"]["group_join"]["group_id"] = json!("rewritten");
        v["collation_id"] = json!("c-new");
        Ok(v)
    });
    let seen_after = Arc::new(std::sync::Mutex::new(None));
    {
        let seen_after = seen_after.clone();
        runtime.register_after(PayloadKind::GroupJoin, move |_ctx, v| {
            *seen_after.lock().unwrap() = Some(v.clone());
            async move { Ok(v) }
        });
    }
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(
            &as_ref(&session),
            Envelope::new(
                "c-5",
                Payload::GroupJoin(GroupJoin {
                    group_id: "original".into(),
                }),
            ),
        )
        .await;

    let received = handler.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].collation_id, "c-new");
    assert_eq!(
        received[0].payload,
        Some(Payload::GroupJoin(GroupJoin {
            group_id: "rewritten".into()
        }))
    );

    let after = seen_after.lock().unwrap().clone().expect("after hook ran");
    assert_eq!(after["payload"]["group_join"]["group_id"], json!("rewritten"));
}

#[tokio::test]
async fn hook_result_with_another_kind_is_rejected() {
    let runtime = Arc::new(CallbackRuntime::new());
    runtime.register_before(PayloadKind::SelfFetch, |_ctx, _v| async {
        Ok(json!({ "collation_id": "c-other", "payload": { "logout": {} } }))
    });
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), self_fetch("c-6"))
        .await;

    let (cid, code, _) = session.single_error();
    assert_eq!(cid, "c-6");
    assert_eq!(code, ErrorCode::RuntimeFunctionException);
    assert_eq!(session.closes(), 0);
    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn hook_result_with_unknown_fields_is_rejected() {
    let runtime = Arc::new(CallbackRuntime::new());
    runtime.register_before(PayloadKind::SelfFetch, |_ctx, mut v: Value| async move {
        v["payload"]["self_fetch"]["injected"] = json!(true);
        Ok(v)
    });
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), self_fetch("c-7"))
        .await;

    assert_eq!(session.single_error().1, ErrorCode::RuntimeFunctionException);
    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn logout_closes_session_and_still_runs_after_hook() {
    let runtime = Arc::new(CallbackRuntime::new());
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let collab = Collaborators::new(runtime.clone());
    let registry = collab.registry.clone();
    let table = DispatchTable::builder()
        .register(handler.clone())
        .unwrap()
        .build();
    let pipeline = Pipeline::new(collab, table);

    let session = RecordingSession::new("s1", "u1");
    registry.insert(as_ref(&session));

    let after_calls = Arc::new(AtomicUsize::new(0));
    let registered_during_after = Arc::new(std::sync::Mutex::new(None));
    {
        let after_calls = after_calls.clone();
        let registered_during_after = registered_during_after.clone();
        let registry = registry.clone();
        runtime.register_after(PayloadKind::Logout, move |_ctx, v| {
            after_calls.fetch_add(1, Ordering::SeqCst);
            *registered_during_after.lock().unwrap() = Some(registry.contains("s1"));
            async move { Ok(v) }
        });
    }

    pipeline
        .process_request(&as_ref(&session), Envelope::new("c-8", Payload::Logout(Logout {})))
        .await;

    assert!(!registry.contains("s1"));
    assert_eq!(session.closes(), 1);
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*registered_during_after.lock().unwrap(), Some(false));
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn unregistered_hooks_are_transparent() {
    let bare_runtime = Arc::new(CallbackRuntime::new());
    let bare_handler = RecordingHandler::new(ROUTED, EventLog::default());
    let bare = build(&bare_runtime, &bare_handler);

    // hooks exist, but for other kinds
    let hooked_runtime = Arc::new(CallbackRuntime::new());
    hooked_runtime.register_before(PayloadKind::GroupJoin, |_ctx, _v| async {
        Err(RuntimeError::Failed("must not run".into()))
    });
    hooked_runtime.register_after(PayloadKind::GroupJoin, |_ctx, _v| async {
        Err(RuntimeError::Failed("must not run".into()))
    });
    let hooked_handler = RecordingHandler::new(ROUTED, EventLog::default());
    let hooked = build(&hooked_runtime, &hooked_handler);

    let a = RecordingSession::new("s1", "u1");
    let b = RecordingSession::new("s1", "u1");
    bare.process_request(&as_ref(&a), self_fetch("c-9")).await;
    hooked.process_request(&as_ref(&b), self_fetch("c-9")).await;

    assert_eq!(a.sent(), vec![Envelope::ack("c-9")]);
    assert_eq!(a.sent(), b.sent());
    assert_eq!(bare_handler.received(), hooked_handler.received());
    assert_eq!(bare_handler.received(), vec![self_fetch("c-9")]);
}

#[tokio::test]
async fn after_hook_failure_does_not_reach_client() {
    let runtime = Arc::new(CallbackRuntime::new());
    runtime.register_after(PayloadKind::SelfFetch, |_ctx, _v| async {
        Err(RuntimeError::Failed("audit store down".into()))
    });
    let handler = RecordingHandler::new(ROUTED, EventLog::default());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), self_fetch("c-10"))
        .await;

    assert_eq!(session.sent(), vec![Envelope::ack("c-10")]);
    assert_eq!(handler.received().len(), 1);
}

#[tokio::test]
async fn stages_run_in_order_with_caller_context() {
    let log = EventLog::default();
    let runtime = Arc::new(CallbackRuntime::new());
    {
        let log = log.clone();
        runtime.register_before(PayloadKind::SelfFetch, move |ctx, v| {
            log.push(format!("before:{}:{}", ctx.session_id, ctx.user_id));
            async move { Ok(v) }
        });
    }
    {
        let log = log.clone();
        runtime.register_after(PayloadKind::SelfFetch, move |_ctx, v| {
            log.push("after");
            async move { Ok(v) }
        });
    }
    let handler = RecordingHandler::new(ROUTED, log.clone());
    let pipeline = build(&runtime, &handler);
    let session = RecordingSession::new("s1", "u1");

    pipeline
        .process_request(&as_ref(&session), self_fetch("c-11"))
        .await;

    assert_eq!(log.events(), vec!["before:s1:u1", "dispatch:c-11", "after"]);
}
