use crate::error::{Error, Result};

use parking_lot::{Condvar, Mutex};
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Contents of a result cell.
enum Slot<T> {
    /// Nothing has been published yet.
    Pending,

    /// The producer published an outcome that has not been taken.
    Ready(Result<T>),

    /// The outcome was published and then taken by a consumer.
    Taken,
}

impl<T> Slot<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

/// State shared between a [`Promise`] and its [`ResultCell`]s.
struct Shared<T> {
    /// The published outcome, if any.
    slot: Mutex<Slot<T>>,

    /// Signalled once when the outcome is published.
    ready: Condvar,
}

/// Creates a connected producer/consumer pair.
///
/// The [`Promise`] publishes exactly one outcome. The [`ResultCell`] can be
/// cloned freely and observed from any thread.
///
/// # Examples
///
/// ```rust
/// let (promise, cell) = mainline::result_cell();
///
/// assert!(!cell.is_ready());
/// promise.set(7);
/// assert_eq!(cell.take(), Ok(7));
/// ```
pub fn result_cell<T>() -> (Promise<T>, ResultCell<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });

    (
        Promise {
            shared: Some(shared.clone()),
        },
        ResultCell { shared },
    )
}

/// The producing half of a result cell.
///
/// Publishing consumes the promise, so an outcome can only ever be set once.
/// Dropping a promise that never published resolves its cell to
/// [`Error::Abandoned`], which keeps blocked consumers from waiting forever.
pub struct Promise<T> {
    /// `None` once the outcome has been published.
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Promise<T> {
    /// Publishes a successful value.
    pub fn set(mut self, value: T) {
        self.publish(Ok(value));
    }

    /// Publishes a failure.
    pub fn fail(mut self, error: Error) {
        self.publish(Err(error));
    }

    /// Publishes an arbitrary outcome.
    pub(crate) fn complete(mut self, outcome: Result<T>) {
        self.publish(outcome);
    }

    fn publish(&mut self, outcome: Result<T>) {
        let Some(shared) = self.shared.take() else {
            return;
        };

        let mut slot = shared.slot.lock();
        debug_assert!(slot.is_pending(), "result cell published twice");
        *slot = Slot::Ready(outcome);
        drop(slot);

        shared.ready.notify_all();
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        self.publish(Err(Error::Abandoned));
    }
}

/// The observing half of a one-shot result.
///
/// Any number of clones may poll or wait on the same cell. The value itself
/// can be taken once with [`take`](Self::take); clonable values can also be
/// read repeatedly with [`get`](Self::get).
pub struct ResultCell<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ResultCell<T> {
    /// Creates a cell that is already resolved with `value`.
    pub fn ready(value: T) -> Self {
        let (promise, cell) = result_cell();
        promise.set(value);
        cell
    }

    /// Returns `true` once an outcome has been published.
    ///
    /// Never blocks. A cell whose value was already taken still counts as
    /// ready.
    pub fn is_ready(&self) -> bool {
        !self.shared.slot.lock().is_pending()
    }

    /// Blocks the calling thread until an outcome is published.
    ///
    /// Waiting does not consume the outcome.
    pub fn wait(&self) {
        let mut slot = self.shared.slot.lock();

        while slot.is_pending() {
            self.shared.ready.wait(&mut slot);
        }
    }

    /// Blocks until an outcome is published or `timeout` elapses.
    ///
    /// Returns `true` if the cell is ready. A timeout too large to be
    /// represented as a deadline waits without limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut slot = self.shared.slot.lock();

        while slot.is_pending() {
            if self.shared.ready.wait_until(&mut slot, deadline).timed_out() {
                return !slot.is_pending();
            }
        }

        true
    }

    /// Blocks until ready, then takes the outcome.
    ///
    /// Only the first take observes the outcome; later calls from any clone
    /// return [`Error::AlreadyTaken`].
    pub fn take(&self) -> Result<T> {
        let mut slot = self.shared.slot.lock();

        while slot.is_pending() {
            self.shared.ready.wait(&mut slot);
        }

        match mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(outcome) => outcome,
            Slot::Taken | Slot::Pending => Err(Error::AlreadyTaken),
        }
    }

    /// Takes the outcome if it has been published, without blocking.
    pub fn try_take(&self) -> Option<Result<T>> {
        let mut slot = self.shared.slot.lock();

        if slot.is_pending() {
            return None;
        }

        match mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(outcome) => Some(outcome),
            Slot::Taken | Slot::Pending => Some(Err(Error::AlreadyTaken)),
        }
    }
}

impl<T: Clone> ResultCell<T> {
    /// Blocks until ready, then returns a copy of the outcome.
    ///
    /// Unlike [`take`](Self::take), this leaves the outcome in place, so
    /// every reader sees the same value.
    pub fn get(&self) -> Result<T> {
        let mut slot = self.shared.slot.lock();

        while slot.is_pending() {
            self.shared.ready.wait(&mut slot);
        }

        match &*slot {
            Slot::Ready(outcome) => outcome.clone(),
            Slot::Taken | Slot::Pending => Err(Error::AlreadyTaken),
        }
    }
}

impl<T> Clone for ResultCell<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ResultCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCell")
            .field("ready", &self.is_ready())
            .finish()
    }
}
