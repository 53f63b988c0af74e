use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::runtime::gate::Gate;

/// Computation that produces the outcome of a future.
pub(crate) type Computation<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send + 'static>;

/// How a producer finished.
#[derive(Debug)]
pub(crate) enum Resolution<T, E> {
    /// The computation returned normally.
    Done(Result<T, E>),
    /// The computation panicked. Holds the panic message.
    Panicked(String),
}

/// Represents the unit of work that a producer thread runs: the computation, and the gate it
/// publishes to once the computation returns.
///
/// The work is consumed by [`Work::run`], which makes it the single writer of its gate.
///
/// # Usage
///
/// ```ignore
/// let gate = Arc::new(Gate::new());
/// let work = Work::new(|| Ok::<_, ()>(1), gate.clone());
/// work.run();
/// ```
pub(crate) struct Work<T, E> {
    computation: Computation<T, E>,
    gate: Arc<Gate<Resolution<T, E>>>,
}

impl<T, E> Work<T, E> {
    /// Create a new work item.
    ///
    /// # Arguments
    ///
    /// * `computation` - Closure to execute.
    /// * `gate` - Gate of the future that receives the outcome.
    pub(crate) fn new(
        computation: impl FnOnce() -> Result<T, E> + Send + 'static,
        gate: Arc<Gate<Resolution<T, E>>>,
    ) -> Self {
        Work {
            computation: Box::new(computation),
            gate,
        }
    }

    /// Execute the computation and publish its outcome.
    ///
    /// A panic inside the computation is caught and published as [`Resolution::Panicked`] so that
    /// waiters are released instead of blocking forever.
    pub(crate) fn run(self) {
        let Work { computation, gate } = self;
        let resolution = match catch_unwind(AssertUnwindSafe(computation)) {
            Ok(outcome) => Resolution::Done(outcome),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("future computation panicked: {message}");
                Resolution::Panicked(message)
            }
        };
        if gate.publish(resolution).is_err() {
            unreachable!("future resolved by more than one producer");
        }
    }
}

/// Extract a printable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
