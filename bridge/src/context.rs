//! The capsule that travels through foreign code and back.
//!
//! A [`Context`] owns the completion for one call. Handing it to foreign code
//! leaks it on purpose ([`Context::into_handle`] then [`RawHandle::into_raw`]);
//! the only way back is a single [`Context::from_raw`], which restores
//! exclusive ownership so the capsule is freed once the completion has been
//! queued on its target.

use std::ffi::c_void;
use std::fmt;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::executor::Executor;
use crate::ffi::Response;
use crate::ledger::{Ledger, Transition};

/// Caller logic run once with the response, or `None` if the foreign side
/// failed.
pub type Completion = Box<dyn FnOnce(Option<Response>) + Send + 'static>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static LIVE_CONTEXTS: AtomicUsize = AtomicUsize::new(0);

/// Number of contexts allocated and not yet destroyed, process wide.
pub fn live_contexts() -> usize {
    LIVE_CONTEXTS.load(Ordering::SeqCst)
}

/// Process-unique identifier of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

pub struct Context {
    id: ContextId,
    completion: Option<Completion>,
    target: Arc<dyn Executor>,
    ledger: Arc<Ledger>,
}

impl Context {
    pub fn new(
        completion: Option<Completion>,
        target: Arc<dyn Executor>,
        ledger: Arc<Ledger>,
    ) -> Self {
        let id = ContextId::next();
        ledger.record(Transition::Created);
        LIVE_CONTEXTS.fetch_add(1, Ordering::SeqCst);
        Self {
            id,
            completion,
            target,
            ledger,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Give up Rust ownership. The context stays allocated until the handle
    /// is reclaimed.
    pub fn into_handle(self) -> RawHandle {
        debug!(context = %self.id, "retaining context");
        self.ledger.record(Transition::Transferred);
        RawHandle {
            ptr: NonNull::from(Box::leak(Box::new(self))),
        }
    }

    /// Reclaim a handle that never left Rust.
    pub fn from_handle(handle: RawHandle) -> Self {
        let ptr = handle.ptr;
        mem::forget(handle);
        // SAFETY: the handle was consumed, so this is the only reclaim.
        unsafe { Self::reclaim(ptr) }
    }

    /// Reclaim a pointer previously produced by [`RawHandle::into_raw`].
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`RawHandle::into_raw`] and must not have been
    /// reclaimed before. Reclaiming twice is a double free.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        let ptr = NonNull::new(ptr.cast::<Context>())?;
        Some(unsafe { Self::reclaim(ptr) })
    }

    unsafe fn reclaim(ptr: NonNull<Context>) -> Self {
        let context = *unsafe { Box::from_raw(ptr.as_ptr()) };
        context.ledger.record(Transition::Reclaimed);
        debug!(context = %context.id, "releasing context");
        context
    }

    /// Take the completion out for delivery. Can succeed only once.
    pub(crate) fn take_completion(&mut self) -> Option<Completion> {
        self.completion.take()
    }

    /// Where the completion is delivered.
    pub(crate) fn target(&self) -> &dyn Executor {
        self.target.as_ref()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.ledger.record(Transition::Destroyed);
        LIVE_CONTEXTS.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("has_completion", &self.completion.is_some())
            .field("target", &self.target.label())
            .finish()
    }
}

/// Move-only token for a leaked context.
///
/// Converting it with [`RawHandle::into_raw`] hands ownership to foreign code.
/// Dropping it instead means the context never crossed the boundary, and it
/// is reclaimed on the spot.
pub struct RawHandle {
    ptr: NonNull<Context>,
}

// SAFETY: the handle is the unique owner of a `Context`, which is `Send`.
unsafe impl Send for RawHandle {}

impl RawHandle {
    pub fn id(&self) -> ContextId {
        // SAFETY: the context stays allocated while the handle is alive.
        unsafe { self.ptr.as_ref() }.id
    }

    pub fn into_raw(self) -> *mut c_void {
        let ptr = self.ptr.as_ptr().cast::<c_void>();
        mem::forget(self);
        ptr
    }
}

impl Drop for RawHandle {
    fn drop(&mut self) {
        // SAFETY: `into_raw` forgets the handle, so reaching drop means the
        // pointer never left Rust.
        let context = unsafe { Context::reclaim(self.ptr) };
        warn!(context = %context.id, "context never crossed the boundary");
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawHandle").field(&self.ptr).finish()
    }
}
