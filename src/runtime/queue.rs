use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A queued, one-shot callback.
///
/// Captures everything needed to resume one suspended computation at one
/// suspension point. Invoked at most once, then dropped.
pub(crate) type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of asking the queue for the next item.
pub(crate) enum Next {
    /// The head of the queue, removed from it.
    Item(WorkItem),

    /// The queue was empty (non-blocking or timed pop only).
    Empty,

    /// The queue has been aborted; nothing will be handed out again.
    Aborted,
}

/// Queue contents and abort flag, guarded together.
struct State {
    /// Pending callbacks in post order.
    items: VecDeque<WorkItem>,

    /// Set once by [`WorkQueue::abort`], never cleared.
    aborted: bool,
}

/// Thread-safe FIFO of work items with a blocking pop.
///
/// The queue and the abort flag live behind one mutex so that the waiter's
/// predicate sees both atomically. Producers notify one waiter per push;
/// abort notifies all of them.
pub(crate) struct WorkQueue {
    /// Items and abort flag.
    state: Mutex<State>,

    /// Signalled on push and on abort.
    condvar: Condvar,
}

impl WorkQueue {
    /// Creates an empty queue with room for `capacity` items.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                aborted: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Appends an item to the tail and wakes one waiter.
    ///
    /// Items pushed after abort are still stored but will never be handed
    /// out. Returns the queue length after the push and whether the queue
    /// was already aborted.
    pub(crate) fn push(&self, item: WorkItem) -> (usize, bool) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        let len = state.items.len();
        let aborted = state.aborted;
        drop(state);

        self.condvar.notify_one();
        (len, aborted)
    }

    /// Appends an item unless the queue has been aborted.
    ///
    /// On abort the item is handed back untouched so the caller decides
    /// what to do with the state it captures.
    pub(crate) fn push_live(&self, item: WorkItem) -> Result<usize, WorkItem> {
        let mut state = self.state.lock();
        if state.aborted {
            return Err(item);
        }

        state.items.push_back(item);
        let len = state.items.len();
        drop(state);

        self.condvar.notify_one();
        Ok(len)
    }

    /// Blocks until an item is available or the queue is aborted.
    ///
    /// Abort wins over pending items: once aborted, nothing is handed out.
    pub(crate) fn pop(&self) -> Next {
        let mut state = self.state.lock();

        loop {
            if state.aborted {
                return Next::Aborted;
            }

            if let Some(item) = state.items.pop_front() {
                return Next::Item(item);
            }

            self.condvar.wait(&mut state);
        }
    }

    /// Like [`pop`](Self::pop), but gives up after `timeout`.
    ///
    /// A timeout too large to be represented as a deadline waits forever.
    pub(crate) fn pop_timeout(&self, timeout: Duration) -> Next {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.pop();
        };
        let mut state = self.state.lock();

        loop {
            if state.aborted {
                return Next::Aborted;
            }

            if let Some(item) = state.items.pop_front() {
                return Next::Item(item);
            }

            if self.condvar.wait_until(&mut state, deadline).timed_out() {
                if state.aborted {
                    return Next::Aborted;
                }

                return match state.items.pop_front() {
                    Some(item) => Next::Item(item),
                    None => Next::Empty,
                };
            }
        }
    }

    /// Removes the head item without blocking.
    pub(crate) fn try_pop(&self) -> Next {
        let mut state = self.state.lock();

        if state.aborted {
            return Next::Aborted;
        }

        match state.items.pop_front() {
            Some(item) => Next::Item(item),
            None => Next::Empty,
        }
    }

    /// Sets the abort flag and wakes every waiter. Idempotent.
    pub(crate) fn abort(&self) {
        self.state.lock().aborted = true;
        self.condvar.notify_all();
    }

    /// Returns `true` once [`abort`](Self::abort) has been called.
    pub(crate) fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// Number of items currently queued.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Removes every queued item and returns them in post order.
    ///
    /// The items are dropped by the caller outside the lock, since dropping
    /// captured state may run arbitrary code.
    pub(crate) fn drain(&self) -> Vec<WorkItem> {
        self.state.lock().items.drain(..).collect()
    }
}
