use mainline::{Background, Error, Generator, ResultCell};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn test_construction_runs_nothing() {
    let runs = Cell::new(0);

    let mut numbers = Generator::new(|co| {
        runs.set(runs.get() + 1);
        async move {
            co.yield_(1).await;
            2
        }
    });

    assert_eq!(runs.get(), 0);
    assert!(numbers.current().is_none());

    assert_eq!(numbers.move_next(), Ok(true));
    assert_eq!(runs.get(), 1);
}

#[test]
fn test_body_advances_one_yield_per_pull() {
    let steps = Cell::new(0);
    let counter = &steps;

    let mut numbers = Generator::new(|co| async move {
        for i in 0..3 {
            counter.set(counter.get() + 1);
            co.yield_(i * 10).await;
        }
        counter.set(counter.get() + 1);
        -1
    });

    assert_eq!(steps.get(), 0);

    for expected in 0..3 {
        assert_eq!(numbers.move_next(), Ok(true));
        assert_eq!(numbers.current(), Some(&(expected * 10)));
        assert_eq!(steps.get(), expected + 1);
    }

    assert_eq!(numbers.move_next(), Ok(false));
    assert_eq!(steps.get(), 4);
    assert_eq!(numbers.current(), Some(&-1));
}

#[test]
fn test_exhaustion_is_final() {
    let mut numbers = Generator::new(|co| async move {
        co.yield_(1).await;
        7
    });

    assert_eq!(numbers.move_next(), Ok(true));
    assert_eq!(numbers.move_next(), Ok(false));
    assert!(numbers.is_exhausted());

    for _ in 0..3 {
        assert_eq!(numbers.move_next(), Ok(false));
        assert_eq!(numbers.current(), Some(&7));
    }
}

#[test]
fn test_body_without_yields() {
    let mut single = Generator::new(|_co| async { "only" });

    assert_eq!(single.move_next(), Ok(false));
    assert_eq!(single.current(), Some(&"only"));
}

#[test]
fn test_runs_on_the_pulling_thread() {
    let puller = std::thread::current().id();

    let mut ids = Generator::new(|co| async move {
        co.yield_(std::thread::current().id()).await;
        std::thread::current().id()
    });

    assert_eq!(ids.move_next(), Ok(true));
    assert_eq!(ids.current(), Some(&puller));
    assert_eq!(ids.move_next(), Ok(false));
    assert_eq!(ids.current(), Some(&puller));
}

#[test]
fn test_iterator_yields_values_but_not_return_value() {
    let numbers = Generator::new(|co| async move {
        for i in 1..=4 {
            co.yield_(i).await;
        }
        100
    });

    let values: Result<Vec<_>, _> = numbers.collect();
    assert_eq!(values, Ok(vec![1, 2, 3, 4]));
}

#[test]
fn test_panic_in_body_exhausts_the_generator() {
    let mut faulty = Generator::new(|co| async move {
        let fail = true;
        co.yield_(1).await;
        co.yield_(2).await;
        if fail {
            panic!("sequence fault");
        }
        3
    });

    assert_eq!(faulty.move_next(), Ok(true));
    assert_eq!(faulty.move_next(), Ok(true));
    assert_eq!(
        faulty.move_next(),
        Err(Error::Panicked(String::from("sequence fault")))
    );
    assert!(faulty.is_exhausted());
    assert_eq!(faulty.move_next(), Ok(false));
    assert_eq!(faulty.current(), Some(&2));
}

#[test]
fn test_foreign_suspend_is_rejected() {
    let (_promise, cell) = mainline::result_cell::<u32>();

    let mut confused = Generator::new(|_co| async move {
        let _ = mainline::task::suspend(cell).await;
        0u32
    });

    // The pending cell would need a waiter thread and a context; neither
    // exists for a generator.
    let first = confused.move_next();
    assert_eq!(first, Err(Error::ForeignSuspend));
    assert!(confused.is_exhausted());
}

/// A pending operation that records whether anyone blocked on it.
struct Watched {
    waited: Arc<AtomicBool>,
}

impl Background for Watched {
    type Output = ();

    fn is_ready(&self) -> bool {
        false
    }

    fn wait(&self) {
        self.waited.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> mainline::Result<()> {
        Err(Error::Abandoned)
    }
}

#[test]
fn test_foreign_suspend_starts_no_waiter() {
    let waited = Arc::new(AtomicBool::new(false));

    let op = Watched {
        waited: waited.clone(),
    };
    let mut confused = Generator::new(|_co| async move {
        let _ = mainline::task::suspend(op).await;
        0u32
    });

    assert_eq!(confused.move_next(), Err(Error::ForeignSuspend));

    thread::sleep(Duration::from_millis(20));
    assert!(!waited.load(Ordering::SeqCst));
}

#[test]
fn test_ready_operation_does_not_suspend_a_generator() {
    let mut eager = Generator::new(|co| async move {
        let n = mainline::task::suspend(ResultCell::ready(5u32))
            .await
            .unwrap_or(0);
        co.yield_(n).await;
        n + 1
    });

    assert_eq!(eager.move_next(), Ok(true));
    assert_eq!(eager.current(), Some(&5));
    assert_eq!(eager.move_next(), Ok(false));
    assert_eq!(eager.current(), Some(&6));
}
