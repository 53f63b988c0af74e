//! # `async-promise`: thread-backed futures
//!
//! A [`Future`] is a handle to the outcome of a computation that runs on its own OS thread. The
//! handle is returned immediately; the computation resolves it exactly once. Any number of
//! callers, on any number of threads, can then wait on the handle and will all observe that same
//! outcome. Outcomes are plain [`Result`]s, so the computation decides what counts as an error.
//!
//! Futures compose through three combinators, all of which are ordinary futures themselves:
//!
//! * [`then`]: continue a future with a reducer.
//! * [`join`]: wait on two futures, then reduce both outcomes.
//! * [`join_all`]: wait on any number of futures, then reduce all outcomes in input order.
//!
//! Waiting is blocking ([`Future::wait`]) from synchronous code, and non-blocking from async code
//! since the handle implements [`std::future::Future`].
//!
//! ## Example
//!
//! ```
//! use async_promise::{join, Future};
//!
//! let width = Future::spawn(|| "3".parse::<u32>());
//! let height = Future::spawn(|| "4".parse::<u32>());
//! let area = join(width, height, |width, height| Ok::<_, std::num::ParseIntError>(width? * height?));
//! assert_eq!(area.wait(), Ok(12));
//! ```
//!
//! ## Limitations
//!
//! There is no cancellation and no timeout. A computation that never returns leaves its future
//! pending forever, and every wait on it blocks forever. Each future occupies a thread until its
//! computation returns; there is no pooling.

pub mod combinator;
pub mod error;
pub mod runtime;

pub use combinator::{join, join_all, then};
pub use error::Error;
pub use runtime::{Builder, Future};
