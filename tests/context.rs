use mainline::{ContextBuilder, Step, SyncContext};
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_run_step_executes_posted_item() {
    let context = SyncContext::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let h = hits.clone();
    context.post(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(context.pending(), 1);
    assert_eq!(context.run_step(), Step::Ran);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(context.pending(), 0);
}

#[test]
fn test_items_run_in_post_order() {
    let context = SyncContext::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..10 {
        let o = order.clone();
        context.post(move || o.lock().unwrap().push(i));
    }

    for _ in 0..10 {
        assert_eq!(context.run_step(), Step::Ran);
    }

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_items_run_on_the_context_thread() {
    let context = SyncContext::new();
    let main = thread::current().id();
    let handle = context.handle().clone();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            let observed = observed.clone();
            thread::spawn(move || {
                handle.post(move || observed.lock().unwrap().push(thread::current().id()));
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(context.run_until_idle(), 4);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 4);
    assert!(observed.iter().all(|id| *id == main));
}

#[test]
fn test_run_step_blocks_until_post_from_another_thread() {
    let context = SyncContext::new();
    let handle = context.handle().clone();
    let hits = Arc::new(AtomicUsize::new(0));

    let h = hits.clone();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        handle.post(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
    });

    let start = Instant::now();
    assert_eq!(context.run_step(), Step::Ran);
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    producer.join().unwrap();
}

#[test]
fn test_items_never_overlap() {
    let context = SyncContext::new();
    let handle = context.handle().clone();
    let active = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            let active = active.clone();
            let overlaps = overlaps.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let active = active.clone();
                    let overlaps = overlaps.clone();
                    handle.post(move || {
                        if active.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        active.store(false, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();

    for _ in 0..200 {
        assert_eq!(context.run_step(), Step::Ran);
    }

    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_try_run_step_on_empty_queue_is_idle() {
    let context = SyncContext::new();
    assert_eq!(context.try_run_step(), Step::Idle);
}

#[test]
fn test_run_step_timeout_expires() {
    let context = SyncContext::new();

    let start = Instant::now();
    assert_eq!(context.run_step_timeout(Duration::from_millis(20)), Step::Idle);
    assert!(start.elapsed() >= Duration::from_millis(15));
}

#[test]
fn test_run_step_timeout_accepts_unbounded_timeouts() {
    let context = SyncContext::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let h = hits.clone();
    context.post(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(context.run_step_timeout(Duration::MAX), Step::Ran);

    let handle = context.handle().clone();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.post(|| {});
    });

    assert_eq!(context.run_step_timeout(Duration::MAX), Step::Ran);
    producer.join().unwrap();

    context.abort();
    assert_eq!(context.run_step_timeout(Duration::MAX), Step::Aborted);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_abort_skips_pending_items() {
    let context = SyncContext::new();
    let hits = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let h = hits.clone();
        context.post(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
    }

    context.abort();

    assert_eq!(context.run_step(), Step::Aborted);
    assert_eq!(context.run_step(), Step::Aborted);
    assert_eq!(context.try_run_step(), Step::Aborted);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(context.pending(), 3);
}

#[test]
fn test_abort_wakes_blocked_run_step() {
    let context = SyncContext::new();
    let handle = context.handle().clone();

    let aborter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.abort();
    });

    assert_eq!(context.run_step(), Step::Aborted);
    aborter.join().unwrap();

    let start = Instant::now();
    assert_eq!(context.run_step(), Step::Aborted);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_abort_is_idempotent() {
    let context = SyncContext::new();
    context.abort();
    context.abort();
    context.handle().abort();

    assert!(context.is_aborted());
    assert_eq!(context.run_step(), Step::Aborted);
}

#[test]
fn test_post_after_abort_is_queued_but_never_runs() {
    let context = SyncContext::new();
    let hits = Arc::new(AtomicUsize::new(0));
    context.abort();

    let h = hits.clone();
    context.post(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(context.pending(), 1);
    assert_eq!(context.run_step(), Step::Aborted);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    assert_eq!(context.discard_pending(), 1);
    assert_eq!(context.pending(), 0);
}

#[test]
fn test_discarded_items_are_dropped() {
    let context = SyncContext::new();
    let token = Arc::new(());

    let t = token.clone();
    context.post(move || drop(t));
    assert_eq!(Arc::strong_count(&token), 2);

    context.discard_pending();
    assert_eq!(Arc::strong_count(&token), 1);
}

#[test]
fn test_items_posted_while_running_run_later() {
    let context = SyncContext::new();
    let handle = context.handle().clone();
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = order.clone();
    context.post(move || {
        o.lock().unwrap().push("outer");
        let o = o.clone();
        handle.post(move || o.lock().unwrap().push("inner"));
    });

    assert_eq!(context.run_until_idle(), 2);
    assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
}

#[test]
fn test_independent_contexts_do_not_interfere() {
    let first = SyncContext::new();
    let second = SyncContext::new();

    first.post(|| {});
    second.abort();

    assert_eq!(second.run_step(), Step::Aborted);
    assert_eq!(first.run_step(), Step::Ran);
    assert!(!first.is_aborted());
}

#[test]
fn test_builder_configuration() {
    let context = ContextBuilder::new().name("ui").capacity(4).build();

    assert_eq!(context.name(), "ui");
    assert_eq!(context.handle().name(), "ui");
    assert_eq!(SyncContext::new().name(), "main");
}

#[test]
#[should_panic(expected = "capacity must be > 0")]
fn test_builder_rejects_zero_capacity() {
    let _ = ContextBuilder::new().capacity(0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fifo_across_producers(producers in 1usize..5, per_producer in 1usize..20) {
        let context = SyncContext::new();
        let handle = context.handle().clone();
        let posted = Arc::new(Mutex::new(Vec::new()));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let barrier = Arc::new(Barrier::new(producers));

        let threads: Vec<_> = (0..producers)
            .map(|p| {
                let handle = handle.clone();
                let posted = posted.clone();
                let executed = executed.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..per_producer {
                        let id = (p, i);
                        let executed = executed.clone();
                        // Record and post under one lock so the post order is total.
                        let mut posted = posted.lock().unwrap();
                        posted.push(id);
                        handle.post(move || executed.lock().unwrap().push(id));
                    }
                })
            })
            .collect();

        for _ in 0..producers * per_producer {
            prop_assert_eq!(context.run_step(), Step::Ran);
        }

        for t in threads {
            t.join().unwrap();
        }

        prop_assert_eq!(&*executed.lock().unwrap(), &*posted.lock().unwrap());
    }
}
