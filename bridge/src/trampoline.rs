//! The C callback handed to foreign code.
//!
//! A C function pointer cannot capture anything, so everything the callback
//! needs travels through its `context` argument. The background job marks the
//! thread while the foreign function runs; the trampoline checks that mark
//! before touching either pointer, because the response buffer is only valid
//! until the trampoline returns.

use std::cell::Cell;
use std::ffi::{c_char, c_void};

use tracing::{debug, error};

use crate::context::{Context, ContextId};
use crate::dispatch;
use crate::ffi::Response;

thread_local! {
    static FOREIGN_CALL: Cell<Option<ContextId>> = const { Cell::new(None) };
}

/// Marks the current thread as running the foreign call for one context.
pub(crate) struct ForeignCallScope {
    previous: Option<ContextId>,
}

impl ForeignCallScope {
    pub(crate) fn enter(id: ContextId) -> Self {
        let previous = FOREIGN_CALL.with(|call| call.replace(Some(id)));
        Self { previous }
    }
}

impl Drop for ForeignCallScope {
    fn drop(&mut self) {
        FOREIGN_CALL.with(|call| call.set(self.previous));
    }
}

fn current_foreign_call() -> Option<ContextId> {
    FOREIGN_CALL.with(Cell::get)
}

/// # Safety
///
/// - `context` must be a pointer produced by `RawHandle::into_raw` that has
///   not been passed to this function before
/// - `response` must be null or a null-terminated buffer valid for the
///   duration of this call
pub(crate) unsafe extern "C" fn trampoline(response: *const c_char, context: *mut c_void) {
    let scope = current_foreign_call();
    debug_assert!(
        scope.is_some(),
        "callback invoked outside of a foreign call on the background context"
    );

    debug_assert!(!context.is_null(), "callback invoked with a null context handle");
    let Some(mut context) = (unsafe { Context::from_raw(context) }) else {
        error!("callback invoked with a null context handle");
        return;
    };
    debug_assert_eq!(
        scope,
        Some(context.id()),
        "context handle does not belong to the running foreign call"
    );

    let id = context.id();
    let Some(completion) = context.take_completion() else {
        debug!(context = %id, "no completion to deliver");
        return;
    };

    // Copy before returning: the foreign side may free the buffer afterwards.
    let response = unsafe { Response::copy_from(response) };
    debug!(
        context = %id,
        has_response = response.is_some(),
        target_context = context.target().label(),
        "foreign call completed"
    );

    // Errors are logged by the dispatch layer; nothing else can observe them here.
    let _ = dispatch::redeliver(response, context.target(), completion);
    // Destroyed only once the completion is queued on the target.
    drop(context);
}
