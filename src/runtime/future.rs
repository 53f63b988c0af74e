use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::combinator;
use crate::error::{self, Error};
use crate::runtime::execution::Builder;
use crate::runtime::gate::Gate;
use crate::runtime::work::Resolution;

/// Handle to the outcome of a computation that runs on its own thread.
///
/// A future is pending until its computation returns, and resolved forever after. The outcome is
/// a [`Result`]: the computation either succeeded with a `T` or failed with an `E`. Waiting on
/// the future any number of times, from any number of threads, always yields that same outcome.
///
/// Handles are cheap to clone. All clones refer to the same computation and the same outcome.
/// Each clone awaited from async code holds at most one waker, which it releases when dropped.
///
/// # Blocking and async waits
///
/// Synchronous code calls [`Future::wait`], which blocks the calling thread only while the future
/// is pending. Async code simply `.await`s the handle, which yields the outcome without blocking
/// the executor:
///
/// ```
/// # use async_promise::Future;
/// # tokio_test::block_on(async {
/// let future = Future::spawn(|| Ok::<_, ()>(6 * 7));
/// assert_eq!(future.clone().await, Ok(42));
/// assert_eq!(future.wait(), Ok(42));
/// # })
/// ```
///
/// # Panics
///
/// If the computation panics, the panic is caught on the producer thread and the future resolves
/// as panicked. Every wait on it then panics as well. Use [`Future::try_wait`] to observe this
/// case without panicking.
pub struct Future<T, E> {
    gate: Arc<Gate<Resolution<T, E>>>,
    /// Waker slot in the gate, taken on the first pending poll.
    waiter: Option<usize>,
}

impl<T, E> Future<T, E> {
    /// Run `computation` on a new thread and return a future for its outcome. Does not block.
    ///
    /// # Arguments
    ///
    /// * `computation` - Closure producing the outcome of the future.
    ///
    /// # Panics
    ///
    /// Panics if the producer thread cannot be created, like [`std::thread::spawn`] does. Use
    /// [`Future::try_spawn`] to handle that case.
    ///
    /// # Example
    ///
    /// ```
    /// # use async_promise::Future;
    /// let future = Future::spawn(|| "42".parse::<u32>());
    /// assert_eq!(future.wait(), Ok(42));
    /// ```
    pub fn spawn<F>(computation: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Self::try_spawn(computation).expect("failed to spawn producer thread")
    }

    /// Like [`Future::spawn`], but reports failure to create the producer thread.
    ///
    /// # Arguments
    ///
    /// * `computation` - Closure producing the outcome of the future.
    pub fn try_spawn<F>(computation: F) -> error::Result<Self>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Builder::default().spawn(computation)
    }

    /// Future that is resolved from the start. No thread is involved.
    ///
    /// # Arguments
    ///
    /// * `outcome` - Outcome of the future.
    pub fn ready(outcome: Result<T, E>) -> Self {
        Self::from_gate(Arc::new(Gate::resolved(Resolution::Done(outcome))))
    }

    /// Future that is resolved with `value` from the start.
    #[inline]
    pub fn ok(value: T) -> Self {
        Self::ready(Ok(value))
    }

    /// Future that is resolved with `error` from the start.
    #[inline]
    pub fn err(error: E) -> Self {
        Self::ready(Err(error))
    }

    /// Block until the future is resolved and borrow its outcome.
    ///
    /// # Panics
    ///
    /// Panics if the computation of the future panicked.
    pub fn wait_ref(&self) -> &Result<T, E> {
        match self.gate.wait() {
            Resolution::Done(outcome) => outcome,
            Resolution::Panicked(message) => panic!("future computation panicked: {message}"),
        }
    }

    /// Block until the future is resolved, reporting a panicked computation as an error.
    ///
    /// # Return value
    ///
    /// The outer result is [`Error::Panicked`] if the computation panicked. Otherwise it holds
    /// the outcome of the computation.
    pub fn try_wait(&self) -> error::Result<&Result<T, E>> {
        match self.gate.wait() {
            Resolution::Done(outcome) => Ok(outcome),
            Resolution::Panicked(message) => Err(Error::Panicked(message.clone())),
        }
    }

    /// Outcome of the future if it is resolved. Never blocks.
    ///
    /// # Panics
    ///
    /// Panics if the computation of the future panicked.
    pub fn peek(&self) -> Option<&Result<T, E>> {
        match self.gate.get()? {
            Resolution::Done(outcome) => Some(outcome),
            Resolution::Panicked(message) => panic!("future computation panicked: {message}"),
        }
    }

    /// Whether the computation has finished, successfully or not.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.gate.get().is_some()
    }

    /// Wrap the gate of a future whose producer has been set up elsewhere.
    #[inline]
    pub(crate) fn from_gate(gate: Arc<Gate<Resolution<T, E>>>) -> Self {
        Future { gate, waiter: None }
    }

    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.gate.parked()
    }

    #[cfg(test)]
    pub(crate) fn slow_waits(&self) -> usize {
        self.gate.slow_waits()
    }

    #[cfg(test)]
    pub(crate) fn registered(&self) -> usize {
        self.gate.registered()
    }
}

impl<T: Clone, E: Clone> Future<T, E> {
    /// Block until the future is resolved and return its outcome.
    ///
    /// Every call, from any thread and at any time, returns a clone of the same outcome.
    ///
    /// # Panics
    ///
    /// Panics if the computation of the future panicked.
    pub fn wait(&self) -> Result<T, E> {
        self.wait_ref().clone()
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Method form of [`combinator::then`].
    pub fn then<U, F, R>(self, reducer: R) -> Future<U, F>
    where
        U: Send + Sync + 'static,
        F: Send + Sync + 'static,
        R: FnOnce(Result<T, E>) -> Result<U, F> + Send + 'static,
    {
        combinator::then(self, reducer)
    }

    /// Method form of [`combinator::join`].
    pub fn join<T2, E2, U, F, R>(self, other: Future<T2, E2>, reducer: R) -> Future<U, F>
    where
        T2: Clone + Send + Sync + 'static,
        E2: Clone + Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: Send + Sync + 'static,
        R: FnOnce(Result<T, E>, Result<T2, E2>) -> Result<U, F> + Send + 'static,
    {
        combinator::join(self, other, reducer)
    }
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Future {
            gate: self.gate.clone(),
            waiter: None,
        }
    }
}

impl<T, E> Drop for Future<T, E> {
    fn drop(&mut self) {
        if let Some(key) = self.waiter.take() {
            self.gate.unregister(key);
        }
    }
}

impl<T, E> std::fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = match self.gate.get() {
            None => "pending",
            Some(Resolution::Done(Ok(_))) => "ok",
            Some(Resolution::Done(Err(_))) => "err",
            Some(Resolution::Panicked(_)) => "panicked",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}

impl<T: Clone, E: Clone> std::future::Future for Future<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let Future { gate, waiter } = self.get_mut();
        match gate.poll_wait(waiter, cx) {
            Poll::Ready(Resolution::Done(outcome)) => Poll::Ready(outcome.clone()),
            Poll::Ready(Resolution::Panicked(message)) => {
                panic!("future computation panicked: {message}")
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
