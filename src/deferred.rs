//! Deferred values: chainable placeholders for a result produced later.

use crate::error::WorkflowError;
use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

type BoxedResult<T> = Pin<Box<dyn Future<Output = Result<T, WorkflowError>> + Send + 'static>>;

/// A result that resolves or rejects once, with continuations chained on.
///
/// Awaiting a `Deferred<T>` yields `Result<T, WorkflowError>`. Chained
/// stages run strictly in order: a stage starts only after the previous
/// one resolved, and control returns to the runtime in between. A
/// rejection skips every later [`and_then`](Deferred::and_then) and
/// [`map`](Deferred::map) stage and lands in the first
/// [`recover`](Deferred::recover) handler.
///
/// ```
/// use junban::{Deferred, WorkflowError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let doubled = Deferred::resolve(21).map(|n| n * 2);
/// assert_eq!(doubled.await, Ok(42));
///
/// let rejected: Deferred<u32> = Deferred::reject(WorkflowError::rejected("Parse", "not a number"));
/// let message = rejected
///     .map(|n| n.to_string())
///     .recover(|error| error.to_string())
///     .await;
/// assert_eq!(message, Ok("not a number".to_string()));
/// # }
/// ```
#[must_use = "a deferred value does nothing unless awaited"]
pub struct Deferred<T> {
    inner: BoxedResult<T>,
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Deferred<T> {
    /// Wraps a future producing the result.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, WorkflowError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// Runs `producer` right away and holds on to its result.
    ///
    /// Side effects of `producer` happen at construction, before anything
    /// awaits the value.
    pub fn settle<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<T, WorkflowError>,
    {
        Self::new(future::ready(producer()))
    }

    /// An already resolved value.
    pub fn resolve(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// An already rejected value.
    pub fn reject(error: WorkflowError) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// Chains a stage that produces another deferred value.
    pub fn and_then<U, F>(self, stage: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Deferred<U> + Send + 'static,
    {
        Deferred::new(async move {
            let value = self.await?;
            tokio::task::yield_now().await;
            stage(value).await
        })
    }

    /// Chains a stage that transforms the value directly.
    pub fn map<U, F>(self, stage: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Deferred::new(async move {
            let value = self.await?;
            tokio::task::yield_now().await;
            Ok(stage(value))
        })
    }

    /// Attaches the failure handler.
    ///
    /// A rejection anywhere earlier in the chain is passed to `handler`,
    /// whose return value resolves the chain. Resolved values pass
    /// through untouched.
    pub fn recover<F>(self, handler: F) -> Deferred<T>
    where
        F: FnOnce(WorkflowError) -> T + Send + 'static,
    {
        Deferred::new(async move {
            match self.await {
                Ok(value) => Ok(value),
                Err(error) => Ok(handler(error)),
            }
        })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, WorkflowError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Console;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_settle_runs_producer_eagerly() {
        let console = Console::capture();
        let sink = console.clone();
        let deferred = Deferred::settle(move || {
            sink.emit("producing");
            Ok(7)
        });
        assert_eq!(console.lines(), vec!["producing".to_string()]);
        assert_eq!(assert_ok!(deferred.await), 7);
    }

    #[tokio::test]
    async fn test_stages_receive_previous_output() {
        let result = Deferred::resolve("a".to_string())
            .and_then(|s| Deferred::resolve(format!("{}b", s)))
            .map(|s| format!("{}c", s))
            .await;
        assert_eq!(result, Ok("abc".to_string()));
    }

    #[tokio::test]
    async fn test_rejection_skips_remaining_stages() {
        let console = Console::capture();
        let later = console.clone();
        let result = Deferred::resolve(1)
            .and_then(|_| Deferred::<u32>::reject(WorkflowError::rejected("Second", "boom")))
            .map(move |n| {
                later.emit("should not run");
                n
            })
            .await;

        let error = assert_err!(result);
        assert_eq!(error.to_string(), "boom");
        assert!(console.lines().is_empty());
    }

    #[tokio::test]
    async fn test_recover_passes_success_through() {
        let result = Deferred::resolve(5).recover(|_| 0).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test]
    async fn test_chain_runs_only_when_polled() {
        let console = Console::capture();
        let chained = console.clone();
        let chain = Deferred::resolve(()).map(move |_| chained.emit("stage"));

        let spawned = tokio::spawn(chain);
        console.emit("caller");
        assert_ok!(assert_ok!(spawned.await));
        assert_eq!(
            console.lines(),
            vec!["caller".to_string(), "stage".to_string()]
        );
    }
}
