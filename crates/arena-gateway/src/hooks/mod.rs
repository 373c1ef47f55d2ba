//! Extension hooks around dispatch.
//!
//! The pipeline never talks to extension code directly. It goes through the
//! [`HookAdapter`], which marshals envelopes to a structured JSON form and
//! calls a [`Runtime`] by message-kind name. Any engine (in-process closures,
//! a subprocess, a remote call) can sit behind `Runtime`.

mod adapter;
mod callback;
mod runtime;
mod shell;

pub use adapter::{HookAdapter, HookError};
pub use callback::CallbackRuntime;
pub use runtime::{HookContext, HookStage, Runtime, RuntimeError};
pub use shell::{ShellCommand, ShellRuntime};
