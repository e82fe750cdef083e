//! Single-completion bridge for callback-based C functions.
//!
//! ## Architecture
//!
//! - `context`: the heap capsule carried through foreign code as `*mut c_void`
//! - `ledger`: counts context transitions so leaks and double frees show up
//! - `trampoline`: the capture-free `extern "C"` callback
//! - `dispatch`: moves a result onto the target execution context
//! - `executor`: worker pool and event loop execution contexts
//! - `bridge`: the public `call` surface
//!
//! ## Call Flow
//!
//! caller -> `Bridge::call` -> context leaked into a raw handle -> foreign
//! function on the worker pool -> trampoline reclaims the handle -> completion
//! enqueued on the event loop

pub mod bridge;
pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod ffi;
pub mod ledger;
mod trampoline;

pub use bridge::Bridge;
pub use codec::{Codec, JsonCodec};
pub use config::BridgeConfig;
pub use context::{live_contexts, Completion, ContextId};
pub use error::{Error, Result};
pub use executor::{current_label, EventLoop, EventLoopHandle, Executor, Job, WorkerPool};
pub use ffi::{ForeignFn, Response, ResponseCallback};
pub use ledger::{Ledger, LedgerSnapshot};
