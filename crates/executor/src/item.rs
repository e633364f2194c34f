use crate::error::ActionResult;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The future produced by a single invocation of an action.
pub type ActionFuture<T> = BoxFuture<'static, ActionResult<T>>;

type ActionFn<T> = Arc<dyn Fn() -> ActionFuture<T> + Send + Sync>;

/// A unit of work: a stable key plus a re-invocable action.
///
/// The action is a zero-argument factory rather than a future because a
/// retry has to run the *same* operation again from scratch. Anything the
/// action needs must be captured by value (usually behind an `Arc`).
pub struct WorkItem<T> {
    key: String,
    action: ActionFn<T>,
}

impl<T> WorkItem<T> {
    pub fn new<F, Fut>(key: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult<T>> + Send + 'static,
    {
        Self {
            key: key.into(),
            action: Arc::new(move || action().boxed()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn invoke(&self) -> ActionFuture<T> {
        (self.action)()
    }

    pub(crate) fn into_key(self) -> String {
        self.key
    }
}

impl<T> fmt::Debug for WorkItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem").field("key", &self.key).finish_non_exhaustive()
    }
}

/// A successfully settled action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed<T> {
    pub key: String,
    pub output: T,
    /// Number of times the action was invoked, including the successful one.
    pub attempts: u32,
}
