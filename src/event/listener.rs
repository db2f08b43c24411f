use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use super::value::Value;

/// An error produced by a listener's own logic.
///
/// Whatever message the listener reports is propagated verbatim as the
/// failure of the [`emit`](super::emitter::EventEmitter::emit) call that
/// invoked it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a single listener invocation.
///
/// A listener signals failure explicitly by returning `Err`; a success value
/// is never inspected for error-ness. This is the tagged-result rendition of
/// the dynamic "did the callback resolve to an error object" check: both
/// returning an error and failing mid-flight surface as the `Err` variant.
pub type ListenerResult = Result<Value, ListenerError>;

/// An event handler invocable by the dispatcher.
///
/// Listeners receive the positional arguments of the triggering
/// [`emit`](super::emitter::EventEmitter::emit) call. Each invocation is
/// awaited to completion before the next listener in the sequence starts.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn call(&self, args: &[Value]) -> ListenerResult;
}

/// Shared handle to a registered listener.
///
/// The handle doubles as the listener's identity: `off` removes the first
/// record holding the same allocation, so callers keep a clone of the handle
/// they registered if they intend to remove it later.
pub type ListenerHandle = Arc<dyn Listener>;

/// Identity comparison for listener handles.
///
/// Compares the underlying allocation only, ignoring the vtable half of the
/// fat pointer, so two clones of one handle always match.
pub(crate) fn same_handler(a: &ListenerHandle, b: &ListenerHandle) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

struct FnListener {
    func: Box<dyn Fn(Vec<Value>) -> BoxFuture<'static, ListenerResult> + Send + Sync>,
}

#[async_trait]
impl Listener for FnListener {
    async fn call(&self, args: &[Value]) -> ListenerResult {
        (self.func)(args.to_vec()).await
    }
}

/// Wraps an async closure into a [`ListenerHandle`].
///
/// # Example
///
/// ```rust,no_run
/// # use renzoku::event::listener::listener_fn;
/// # use renzoku::event::value::Value;
/// let handler = listener_fn(|args| async move {
///     Ok(Value::Integer(args.len() as i64))
/// });
/// ```
pub fn listener_fn<F, Fut>(func: F) -> ListenerHandle
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ListenerResult> + Send + 'static,
{
    Arc::new(FnListener {
        func: Box::new(move |args| Box::pin(func(args))),
    })
}
