use std::sync::Arc;

use tracing::debug;

use crate::codec::Codec;
use crate::context::{Completion, Context, ContextId};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::ffi::{ForeignFn, Request, Response};
use crate::ledger::Ledger;
use crate::trampoline::{trampoline, ForeignCallScope};

/// Drives one foreign function from Rust.
///
/// Every call runs the foreign function on the background context and
/// delivers its single response on the target context.
pub struct Bridge {
    foreign: ForeignFn,
    background: Arc<dyn Executor>,
    target: Arc<dyn Executor>,
    ledger: Arc<Ledger>,
}

impl Bridge {
    pub fn new(
        foreign: ForeignFn,
        background: Arc<dyn Executor>,
        target: Arc<dyn Executor>,
    ) -> Self {
        Self {
            foreign,
            background,
            target,
            ledger: Arc::new(Ledger::new()),
        }
    }

    /// Issue `request` and return immediately.
    ///
    /// `completion`, if any, runs exactly once on the target context once the
    /// foreign side answers. A request that cannot be passed as a C string is
    /// rejected here, before any context exists.
    pub fn call(
        &self,
        request: impl Into<Vec<u8>>,
        completion: Option<Completion>,
    ) -> Result<ContextId> {
        let request = Request::new(request)?;

        let context = Context::new(
            completion,
            Arc::clone(&self.target),
            Arc::clone(&self.ledger),
        );
        let id = context.id();
        let handle = context.into_handle();
        let foreign = self.foreign;

        self.background.execute(Box::new(move || {
            let _scope = ForeignCallScope::enter(id);
            // SAFETY: `request` outlives the call and the handle is handed
            // over exactly once; the trampoline is its only consumer.
            unsafe { foreign(request.as_ptr(), trampoline, handle.into_raw()) };
        }))?;

        debug!(
            context = %id,
            background = self.background.label(),
            "foreign call scheduled"
        );
        Ok(id)
    }

    /// Typed variant of [`Bridge::call`].
    ///
    /// Encoding errors are returned synchronously. The completion receives
    /// [`Error::MissingResponse`] when the foreign side answered null and
    /// [`Error::Decode`] when the answer does not decode; decoding runs on the
    /// target context.
    pub fn call_with<C, F>(
        &self,
        codec: &C,
        request: &C::Request,
        completion: F,
    ) -> Result<ContextId>
    where
        C: Codec + Clone + Send + 'static,
        F: FnOnce(Result<C::Response>) + Send + 'static,
    {
        let payload = codec.encode(request)?;
        let codec = codec.clone();
        self.call(
            payload,
            Some(Box::new(move |response: Option<Response>| {
                let result = match response {
                    Some(response) => codec.decode(response.as_bytes()),
                    None => Err(Error::MissingResponse),
                };
                completion(result)
            })),
        )
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Label of the context foreign calls run on.
    pub fn background(&self) -> &str {
        self.background.label()
    }

    /// Label of the context completions run on.
    pub fn target(&self) -> &str {
        self.target.label()
    }
}
