use super::core::{ResultCell, result_cell};
use crate::error::{Error, Result, panic_message};
use crate::task::Suspend;

use std::future::IntoFuture;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// An asynchronous operation a task can suspend on.
///
/// The runtime does not care how the operation is produced (a thread, an I/O
/// completion, a timer). It only needs three things from it:
///
/// - a non-blocking readiness check,
/// - a blocking wait that does not consume the result,
/// - a one-time retrieval of the result.
///
/// The blocking wait is called from a dedicated waiter thread, never from the
/// thread that runs task bodies.
pub trait Background: Send + Sync + 'static {
    /// The value produced by the operation.
    type Output: Send + 'static;

    /// Returns `true` if the result is available. Must not block.
    fn is_ready(&self) -> bool;

    /// Blocks until the result is available.
    fn wait(&self);

    /// Retrieves the result. Only the first call yields the value.
    fn take(&self) -> Result<Self::Output>;
}

impl<T: Send + 'static> Background for ResultCell<T> {
    type Output = T;

    fn is_ready(&self) -> bool {
        ResultCell::is_ready(self)
    }

    fn wait(&self) {
        ResultCell::wait(self)
    }

    fn take(&self) -> Result<T> {
        ResultCell::take(self)
    }
}

impl<T: Send + 'static> IntoFuture for ResultCell<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<ResultCell<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Suspend::new(self)
    }
}

/// Runs `f` on a fresh background thread and returns a cell for its result.
///
/// A panic inside `f` resolves the cell to [`Error::Panicked`]. If the thread
/// cannot be spawned at all, the cell resolves to [`Error::Abandoned`].
///
/// # Examples
///
/// ```rust
/// let cell = mainline::cell::spawn(|| 6 * 7);
/// assert_eq!(cell.take(), Ok(42));
/// ```
pub fn spawn<F, T>(f: F) -> ResultCell<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (promise, cell) = result_cell();

    let spawned = thread::Builder::new()
        .name(String::from("mainline-background"))
        .spawn(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => promise.set(value),
            Err(payload) => promise.fail(Error::Panicked(panic_message(payload))),
        });

    // On failure the closure is dropped together with its promise, which
    // resolves the cell as abandoned.
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to spawn background thread");
    }

    cell
}
