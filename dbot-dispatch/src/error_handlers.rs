//! Registry of error callbacks, invoked in registration order when a handler fails.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::CallbackContext;
use crate::event::Event;
use crate::handlers::HandlerResult;

type ErrorFn = dyn Fn(Option<Event>, CallbackContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// An error callback. Receives the failing event (if any) and a context whose `error` is set.
/// Identity is the inner `Arc`: clones are the same callback.
#[derive(Clone)]
pub struct ErrorCallback(Arc<ErrorFn>);

impl ErrorCallback {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<Event>, CallbackContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(
            move |event: Option<Event>, ctx: CallbackContext| -> BoxFuture<'static, HandlerResult> {
                Box::pin(f(event, ctx))
            },
        ))
    }

    pub(crate) fn call(&self, event: Option<Event>, context: CallbackContext) -> BoxFuture<'static, HandlerResult> {
        (self.0)(event, context)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ErrorCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCallback({:p})", Arc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RegisteredErrorHandler {
    pub(crate) callback: ErrorCallback,
    pub(crate) block: bool,
}

/// Ordered `(callback, block)` pairs; a callback appears at most once.
#[derive(Debug, Default)]
pub(crate) struct ErrorHandlers(Vec<RegisteredErrorHandler>);

impl ErrorHandlers {
    /// Returns `false` (and changes nothing) when the callback is already registered.
    pub(crate) fn add(&mut self, callback: ErrorCallback, block: bool) -> bool {
        if self.0.iter().any(|h| h.callback.ptr_eq(&callback)) {
            return false;
        }
        self.0.push(RegisteredErrorHandler { callback, block });
        true
    }

    /// Returns whether anything was removed.
    pub(crate) fn remove(&mut self, callback: &ErrorCallback) -> bool {
        let before = self.0.len();
        self.0.retain(|h| !h.callback.ptr_eq(callback));
        self.0.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<RegisteredErrorHandler> {
        self.0.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Flow;

    fn noop() -> ErrorCallback {
        ErrorCallback::new(|_, _| async { Ok(Flow::Continue) })
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut handlers = ErrorHandlers::default();
        let cb = noop();
        assert!(handlers.add(cb.clone(), true));
        assert!(!handlers.add(cb.clone(), false));
        assert_eq!(handlers.len(), 1);
        assert!(handlers.snapshot()[0].block);
    }

    #[test]
    fn test_distinct_callbacks_keep_order() {
        let mut handlers = ErrorHandlers::default();
        let (a, b) = (noop(), noop());
        handlers.add(a.clone(), true);
        handlers.add(b.clone(), false);
        let snapshot = handlers.snapshot();
        assert!(snapshot[0].callback.ptr_eq(&a));
        assert!(snapshot[1].callback.ptr_eq(&b));

        assert!(handlers.remove(&a));
        assert!(!handlers.remove(&a));
        assert_eq!(handlers.len(), 1);
    }
}
