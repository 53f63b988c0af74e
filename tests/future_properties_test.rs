use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use async_promise::{join, join_all, then, Error, Future};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn first_error(first: Option<String>, second: Option<String>) -> Option<String> {
    first.or(second)
}

/// Every concurrent waiter observes the one outcome the computation produced, and the computation
/// runs exactly once.
#[test]
fn test_single_resolution_with_concurrent_waiters() {
    init_logging();
    let runs = Arc::new(AtomicUsize::new(0));
    let future = Future::spawn({
        let runs = runs.clone();
        move || {
            std::thread::sleep(Duration::from_millis(20));
            runs.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![4, 8, 15, 16, 23, 42])
        }
    });

    let start = Arc::new(Barrier::new(32));
    let waiters = (0..32)
        .map(|_| {
            let future = future.clone();
            let start = start.clone();
            std::thread::spawn(move || {
                start.wait();
                future.wait()
            })
        })
        .collect::<Vec<_>>();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Ok(vec![4, 8, 15, 16, 23, 42]));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// Waiters that arrive before the computation finishes are still released.
#[test]
fn test_no_missed_wakeup() {
    init_logging();
    for _ in 0..100 {
        let future = Future::spawn(|| Ok::<_, ()>(std::thread::current().id()));
        let waiter = std::thread::spawn({
            let future = future.clone();
            move || future.wait()
        });
        let outcome = future.wait();
        assert_eq!(waiter.join().unwrap(), outcome);
    }
}

/// After resolution, a thousand concurrent waiters all take the fast path.
#[test]
fn test_concurrent_fast_path() {
    init_logging();
    let future = Future::spawn(|| Ok::<_, ()>("resolved"));
    while !future.is_resolved() {
        std::thread::sleep(Duration::from_millis(1));
    }

    let started = Instant::now();
    let waiters = (0..1_000)
        .map(|_| {
            let future = future.clone();
            std::thread::spawn(move || future.wait())
        })
        .collect::<Vec<_>>();
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Ok("resolved"));
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_then_add_one() {
    init_logging();
    let future = then(Future::spawn(|| Ok::<i32, String>(5)), |outcome| {
        outcome.map(|value| value + 1)
    });
    assert_eq!(future.wait(), Ok(6));
}

#[test]
fn test_join_sum() {
    init_logging();
    let sum = |first: Result<i32, String>, second: Result<i32, String>| {
        match first_error(first.clone().err(), second.clone().err()) {
            Some(error) => Err(error),
            None => Ok(first.unwrap_or_default() + second.unwrap_or_default()),
        }
    };
    let future = join(
        Future::spawn(|| Ok::<i32, String>(2)),
        Future::spawn(|| Ok::<i32, String>(3)),
        sum,
    );
    assert_eq!(future.wait(), Ok(5));

    let future = join(
        Future::spawn(|| Ok::<i32, String>(2)),
        Future::spawn(|| Err::<i32, _>("three".to_string())),
        sum,
    );
    assert_eq!(future.wait(), Err("three".to_string()));
}

#[test]
fn test_join_all_order_independent_of_completion() {
    init_logging();
    let (done_tx, done_rx) = channel::<usize>();

    // Each producer finishes only when released. They are released in reverse order.
    let (releases, futures): (Vec<_>, Vec<_>) = (1..=3)
        .map(|value| {
            let (release_tx, release_rx) = channel::<()>();
            let done_tx = done_tx.clone();
            let future = Future::spawn(move || {
                release_rx.recv().unwrap();
                done_tx.send(value).unwrap();
                Ok::<_, ()>(value)
            });
            (release_tx, future)
        })
        .unzip();
    let joined = join_all(futures, |outcomes| {
        outcomes.into_iter().collect::<Result<Vec<_>, _>>()
    });

    let mut completion_order = Vec::new();
    for release in releases.iter().rev() {
        release.send(()).unwrap();
        completion_order.push(done_rx.recv().unwrap());
    }
    assert_eq!(completion_order, vec![3, 2, 1]);
    assert_eq!(joined.wait(), Ok(vec![1, 2, 3]));
}

#[test]
fn test_join_all_empty_input() {
    init_logging();
    let future = join_all(Vec::<Future<i32, String>>::new(), |outcomes| {
        Ok::<_, String>(outcomes)
    });
    assert_eq!(future.wait(), Ok(Vec::new()));
}

#[test]
fn test_reducer_decides_error_policy() {
    init_logging();
    let futures = vec![
        Future::spawn(|| Err::<u8, _>("disk full".to_string())),
        Future::spawn(|| Ok(1)),
        Future::spawn(|| Err("timeout".to_string())),
    ];
    // Suppress errors, keep successes.
    let future = join_all(futures, |outcomes| {
        Ok::<_, ()>(outcomes.into_iter().flatten().collect::<Vec<_>>())
    });
    assert_eq!(future.wait(), Ok(vec![1]));
}

#[test]
#[should_panic(expected = "future computation panicked")]
fn test_wait_on_panicked_future_fails_fast() {
    init_logging();
    let future = Future::spawn(|| -> Result<(), ()> { panic!("contract violated") });
    let _ = future.wait();
}

#[test]
fn test_panicked_dependency_reported() {
    init_logging();
    let failing = Future::spawn(|| -> Result<u8, ()> { panic!("contract violated") });
    let joined = join(Future::<_, ()>::ok(1), failing, |first, second| {
        Ok::<_, ()>((first, second))
    });
    assert!(matches!(joined.try_wait(), Err(Error::Panicked(_))));
}

/// A computation that never returns leaves its future pending. This is a known boundary: there
/// is no timeout, so only non-blocking inspection is safe.
#[test]
fn test_non_terminating_computation_stays_pending() {
    init_logging();
    let (_keep_blocked, blocked) = channel::<()>();
    let future = Future::spawn(move || {
        let _ = blocked.recv();
        Ok::<_, ()>(())
    });
    std::thread::sleep(Duration::from_millis(50));
    assert!(!future.is_resolved());
    assert!(future.peek().is_none());
    assert_eq!(format!("{future:?}"), "Future { state: \"pending\" }");
}

#[tokio::test]
async fn test_await_combinators() {
    init_logging();
    let futures = (0..10u64)
        .map(|n| {
            Future::spawn(move || {
                std::thread::sleep(Duration::from_millis(10 - n));
                Ok::<_, String>(n)
            })
        })
        .collect::<Vec<_>>();
    let total = join_all(futures, |outcomes| outcomes.into_iter().sum::<Result<u64, String>>());
    assert_eq!(total.clone().await, Ok(45));
    assert_eq!(total.then(|total| total.map(|total| total / 5)).await, Ok(9));
}
