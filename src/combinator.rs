//! Composition of futures.
//!
//! Every combinator starts a new future whose computation waits on one or more existing futures
//! and hands their outcomes to a user supplied reducer. The reducer's return value becomes the
//! outcome of the new future.
//!
//! Combinators never interpret outcomes. An `Err` from a dependency does not short-circuit
//! anything: all dependencies are always waited on, and the reducer alone decides how errors are
//! merged, propagated or suppressed.
//!
//! Dependencies are observed in a fixed order (`first` then `second` for [`join`], index order for
//! [`join_all`]). Their producers keep running concurrently regardless, so the order in which they
//! actually finish does not matter.
//!
//! # Example
//!
//! ```
//! use async_promise::{join, join_all, Future};
//!
//! let total = join_all(
//!     (1..=3u32).map(|n| Future::spawn(move || Ok::<_, String>(n))),
//!     |outcomes| outcomes.into_iter().sum::<Result<u32, String>>(),
//! );
//! let doubled = total.then(|outcome| outcome.map(|total| total * 2));
//! let label = Future::<_, String>::ok("sum".to_string());
//! let summary = join(doubled, label, |total, label| {
//!     Ok::<_, String>(format!("{}: {}", label?, total?))
//! });
//! assert_eq!(summary.wait(), Ok("sum: 12".to_string()));
//! ```
use crate::runtime::Future;

/// Continue `future` with `reducer` once it is resolved.
///
/// # Arguments
///
/// * `future` - Future to continue from.
/// * `reducer` - Maps the outcome of `future` to the outcome of the new future.
///
/// # Example
///
/// ```
/// # use async_promise::{then, Future};
/// let six = then(Future::<_, ()>::ok(5), |outcome| outcome.map(|value| value + 1));
/// assert_eq!(six.wait(), Ok(6));
/// ```
pub fn then<T, E, U, F, R>(future: Future<T, E>, reducer: R) -> Future<U, F>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Send + Sync + 'static,
    R: FnOnce(Result<T, E>) -> Result<U, F> + Send + 'static,
{
    Future::spawn(move || reducer(future.wait()))
}

/// Join two futures. Waits on `first`, then on `second`, then reduces both outcomes.
///
/// # Arguments
///
/// * `first` - Future waited on first.
/// * `second` - Future waited on second.
/// * `reducer` - Combines both outcomes into the outcome of the new future.
///
/// # Example
///
/// ```
/// # use async_promise::{join, Future};
/// let sum = join(
///     Future::<u32, String>::ok(2),
///     Future::<u32, String>::ok(3),
///     |first, second| Ok::<_, String>(first? + second?),
/// );
/// assert_eq!(sum.wait(), Ok(5));
/// ```
pub fn join<T1, E1, T2, E2, U, F, R>(
    first: Future<T1, E1>,
    second: Future<T2, E2>,
    reducer: R,
) -> Future<U, F>
where
    T1: Clone + Send + Sync + 'static,
    E1: Clone + Send + Sync + 'static,
    T2: Clone + Send + Sync + 'static,
    E2: Clone + Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Send + Sync + 'static,
    R: FnOnce(Result<T1, E1>, Result<T2, E2>) -> Result<U, F> + Send + 'static,
{
    Future::spawn(move || {
        let first = first.wait();
        let second = second.wait();
        reducer(first, second)
    })
}

/// Join any number of futures. Waits on each future in order, then reduces all outcomes.
///
/// The outcomes are handed to the reducer in the same order as the input, whatever order the
/// producers finished in. An empty input is allowed and yields an empty vector.
///
/// # Arguments
///
/// * `futures` - Futures to wait on, in order.
/// * `reducer` - Combines all outcomes into the outcome of the new future.
///
/// # Example
///
/// ```
/// # use async_promise::{join_all, Future};
/// let futures = vec![Future::ok(1), Future::err("two"), Future::ok(3)];
/// let report = join_all(futures, |outcomes| {
///     Ok::<_, ()>(outcomes.iter().filter(|outcome| outcome.is_err()).count())
/// });
/// assert_eq!(report.wait(), Ok(1));
/// ```
pub fn join_all<T, E, U, F, R>(
    futures: impl IntoIterator<Item = Future<T, E>>,
    reducer: R,
) -> Future<U, F>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Send + Sync + 'static,
    R: FnOnce(Vec<Result<T, E>>) -> Result<U, F> + Send + 'static,
{
    let futures = futures.into_iter().collect::<Vec<_>>();
    log::trace!("joining {} future(s)", futures.len());

    Future::spawn(move || {
        let outcomes = futures.iter().map(Future::wait).collect::<Vec<_>>();
        reducer(outcomes)
    })
}
