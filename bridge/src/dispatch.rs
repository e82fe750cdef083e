use tracing::{trace, warn};

use crate::error::Result;
use crate::executor::Executor;

/// Enqueue `handler(value)` onto `target` and return without waiting for it.
///
/// If `target` no longer accepts work the handler is dropped unrun; it is
/// never invoked on the caller's thread instead.
pub fn redeliver<T, F>(value: T, target: &dyn Executor, handler: F) -> Result<()>
where
    T: Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    trace!(target_context = target.label(), "redelivering");
    target
        .execute(Box::new(move || handler(value)))
        .inspect_err(|err| warn!(target_context = target.label(), %err, "redelivery dropped"))
}
