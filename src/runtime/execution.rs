use std::sync::Arc;

use crate::error::{self, Error};
use crate::runtime::future::Future;
use crate::runtime::gate::Gate;
use crate::runtime::work::Work;

/// Default name given to producer threads.
const DEFAULT_THREAD_NAME: &str = "async-promise";

/// Producer thread factory.
///
/// Every future gets its own dedicated OS thread that runs the computation to completion and then
/// publishes the outcome. There is no pooling and no upper bound on the number of threads. The
/// builder only controls how each thread is created, in the same way [`std::thread::Builder`]
/// does.
///
/// # Usage
///
/// ```
/// # use async_promise::Builder;
/// let future = Builder::new()
///     .name("answer".to_string())
///     .stack_size(64 * 1024)
///     .spawn(|| Ok::<_, ()>(42))
///     .unwrap();
/// assert_eq!(future.wait(), Ok(42));
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    name: String,
    stack_size: Option<usize>,
}

impl Builder {
    /// Create a builder with the default thread name and the platform's default stack size.
    pub fn new() -> Self {
        Builder {
            name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }

    /// Name for the producer thread. Shows up in panic messages and debuggers.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name.
    pub fn name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// Stack size in bytes for the producer thread.
    ///
    /// # Arguments
    ///
    /// * `size` - Stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Start `computation` on a new thread and return its future right away.
    ///
    /// The future is pending from the moment it is returned until the computation returns. Its
    /// gate exists before the thread starts, so no waiter can ever observe a half-initialized
    /// future.
    ///
    /// # Arguments
    ///
    /// * `computation` - Closure producing the outcome of the future.
    ///
    /// # Return value
    ///
    /// Fails with [`Error::Spawn`] if the operating system refuses to create the thread. The
    /// computation is dropped without being run in that case.
    pub fn spawn<T, E, F>(self, computation: F) -> error::Result<Future<T, E>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let gate = Arc::new(Gate::new());
        let work = Work::new(computation, gate.clone());

        let mut thread = std::thread::Builder::new().name(self.name);
        if let Some(size) = self.stack_size {
            thread = thread.stack_size(size);
        }
        let handle = thread.spawn(move || work.run()).map_err(Error::Spawn)?;
        log::trace!("spawned producer thread {:?}", handle.thread().id());

        // The handle is dropped on purpose: the producer detaches and the future is the only way
        // to observe it.
        Ok(Future::from_gate(gate))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
