use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use once_cell::sync::OnceCell;
use slab::Slab;

/// One-shot completion gate.
///
/// The gate starts out pending and is resolved exactly once by [`Gate::publish`]. Readers block
/// (or register a waker) only while the gate is pending. After resolution every reader, including
/// readers racing each other, takes the lock-free fast path and observes the same value.
///
/// # Ordering
///
/// The value is stored in a [`OnceCell`] before anything is woken up. The cell itself provides
/// release/acquire ordering for the fast path, and the slow path re-checks the cell while holding
/// the waiter lock, which the publisher must acquire after storing. A reader that found the gate
/// pending under the lock is therefore already parked (or its waker registered) by the time the
/// publisher notifies, so no wakeup can be missed.
///
/// # Async waiters
///
/// Each async waiter owns one waker slot, identified by the key handed out on its first
/// [`Gate::poll_wait`]. Polling again replaces the waker in that slot. A waiter that stops
/// waiting must give the slot back with [`Gate::unregister`], otherwise the waker is kept alive
/// until the gate resolves (which may be never).
///
/// # Usage
///
/// ```ignore
/// let gate = Gate::new();
/// gate.publish(42).unwrap();
/// assert_eq!(*gate.wait(), 42);
/// ```
pub(crate) struct Gate<V> {
    value: OnceCell<V>,
    waiters: Mutex<Waiters>,
    signal: Condvar,
}

/// Bookkeeping for everyone that is currently waiting on a pending gate.
#[derive(Default)]
struct Waiters {
    /// Number of threads parked on the condition variable.
    parked: usize,
    /// Number of blocking waits that had to take the lock, over the lifetime of the gate.
    slow_waits: usize,
    /// Wakers of async waiters that polled the gate while it was pending, one slot per waiter.
    wakers: Slab<Waker>,
}

impl<V> Gate<V> {
    /// Create a pending gate.
    pub(crate) fn new() -> Self {
        Gate {
            value: OnceCell::new(),
            waiters: Mutex::new(Waiters::default()),
            signal: Condvar::new(),
        }
    }

    /// Create a gate that is resolved from the start.
    pub(crate) fn resolved(value: V) -> Self {
        Gate {
            value: OnceCell::with_value(value),
            waiters: Mutex::new(Waiters::default()),
            signal: Condvar::new(),
        }
    }

    /// Resolve the gate and release all waiters.
    ///
    /// # Arguments
    ///
    /// * `value` - Value every current and future reader will observe.
    ///
    /// # Return value
    ///
    /// If the gate was already resolved, the value is handed back unchanged.
    pub(crate) fn publish(&self, value: V) -> Result<(), V> {
        self.value.set(value)?;

        let (parked, wakers) = {
            let mut waiters = self.lock();
            (waiters.parked, std::mem::take(&mut waiters.wakers))
        };

        log::trace!(
            "gate resolved, releasing {parked} parked thread(s) and {} task(s)",
            wakers.len(),
        );

        self.signal.notify_all();
        for (_, waker) in wakers {
            waker.wake();
        }

        Ok(())
    }

    /// Block the calling thread until the gate is resolved.
    pub(crate) fn wait(&self) -> &V {
        if let Some(value) = self.value.get() {
            return value;
        }

        let mut waiters = self.lock();
        waiters.slow_waits += 1;
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            waiters.parked += 1;
            log::debug!(
                "gate pending, parking thread ({} parked, {} slow wait(s) so far)",
                waiters.parked,
                waiters.slow_waits,
            );
            waiters = self
                .signal
                .wait(waiters)
                .unwrap_or_else(PoisonError::into_inner);
            waiters.parked -= 1;
        }
    }

    /// Async counterpart of [`Gate::wait`]. Stores the task's waker if the gate is pending.
    ///
    /// # Arguments
    ///
    /// * `key` - Waker slot of this waiter. Starts out as `None` and is filled in on the first
    ///   pending poll.
    /// * `cx` - Context of the polling task.
    pub(crate) fn poll_wait(&self, key: &mut Option<usize>, cx: &mut Context<'_>) -> Poll<&V> {
        if let Some(value) = self.value.get() {
            return Poll::Ready(value);
        }

        let mut waiters = self.lock();
        // Publish might have happened between the fast path and taking the lock.
        if let Some(value) = self.value.get() {
            return Poll::Ready(value);
        }
        match key.filter(|slot| waiters.wakers.contains(*slot)) {
            Some(slot) => {
                let waker = &mut waiters.wakers[slot];
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
            }
            None => *key = Some(waiters.wakers.insert(cx.waker().clone())),
        }

        Poll::Pending
    }

    /// Release the waker slot of an async waiter that no longer waits.
    ///
    /// # Arguments
    ///
    /// * `key` - Slot handed out by [`Gate::poll_wait`].
    pub(crate) fn unregister(&self, key: usize) {
        let mut waiters = self.lock();
        // Slots are all released at once on publish, and none are handed out after.
        if waiters.wakers.contains(key) {
            waiters.wakers.remove(key);
        }
    }

    /// Value of the gate, if it was resolved already.
    #[inline]
    pub(crate) fn get(&self) -> Option<&V> {
        self.value.get()
    }

    /// Number of threads currently parked in [`Gate::wait`].
    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.lock().parked
    }

    /// Number of blocking waits that missed the fast path so far.
    #[cfg(test)]
    pub(crate) fn slow_waits(&self) -> usize {
        self.lock().slow_waits
    }

    /// Number of wakers currently held for async waiters.
    #[cfg(test)]
    pub(crate) fn registered(&self) -> usize {
        self.lock().wakers.len()
    }

    /// The waiter bookkeeping is consistent at every unlock, so a poisoned lock is still usable.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Waiters> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
