//! Built-in domain handlers.
//!
//! These cover the request kinds that need nothing beyond the in-process
//! collaborators. Storage, social graph, groups, and leaderboards need a
//! persistence layer and are routed by embedders.

mod link;
mod matches;
mod matchmake;
mod rpc;
mod topic;

use std::sync::Arc;

use arena_core::Result;

use crate::dispatch::DispatchTableBuilder;
use crate::pipeline::Collaborators;

pub use link::LinkService;
pub use matches::MatchService;
pub use matchmake::MatchmakeService;
pub use rpc::RpcService;
pub use topic::TopicService;

/// Register every built-in service on top of `builder`.
pub fn register_builtin(
    builder: DispatchTableBuilder,
    collab: &Collaborators,
) -> Result<DispatchTableBuilder> {
    builder
        .register(Arc::new(RpcService::new(Arc::clone(&collab.runtime))))?
        .register(Arc::new(TopicService::new(
            Arc::clone(&collab.registry),
            Arc::clone(&collab.tracker),
        )))?
        .register(Arc::new(MatchService::new(
            Arc::clone(&collab.registry),
            Arc::clone(&collab.tracker),
        )))?
        .register(Arc::new(MatchmakeService::new(
            Arc::clone(&collab.registry),
            Arc::clone(&collab.matchmaker),
        )))?
        .register(Arc::new(LinkService::new(Arc::clone(&collab.social))))
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
