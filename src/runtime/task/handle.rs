use super::suspend::Suspend;
use crate::cell::{Background, ResultCell};
use crate::error::Result;

use std::fmt;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-unique identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to a started task.
///
/// The handle observes the task's result; it does not own the task. Dropping
/// it does **not** cancel the task, it only discards the ability to observe
/// the result.
///
/// A handle is itself a [`Background`] operation, so one task can await
/// another.
pub struct TaskHandle<T> {
    id: TaskId,
    cell: ResultCell<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(id: TaskId, cell: ResultCell<T>) -> Self {
        Self { id, cell }
    }

    /// The task's identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` once the task has completed. Never blocks.
    pub fn is_completed(&self) -> bool {
        self.cell.is_ready()
    }

    /// Blocks the calling thread until the task completes.
    ///
    /// Do not call this on the context's own thread before the task is
    /// complete: the task can only make progress through that thread's run
    /// steps. Use [`SyncContext::block_on`](crate::SyncContext::block_on)
    /// there instead.
    pub fn wait(&self) {
        self.cell.wait();
    }

    /// Blocks until the task completes or `timeout` elapses.
    ///
    /// Returns `true` if the task is complete.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.cell.wait_timeout(timeout)
    }

    /// Blocks until the task completes and returns its result.
    ///
    /// Faults inside the body are reported as
    /// [`Error::Panicked`](crate::Error::Panicked); a task whose context was
    /// aborted before it finished reports
    /// [`Error::Aborted`](crate::Error::Aborted).
    pub fn get_return_value(self) -> Result<T> {
        self.cell.take()
    }
}

impl<T: Send + 'static> Background for TaskHandle<T> {
    type Output = T;

    fn is_ready(&self) -> bool {
        self.cell.is_ready()
    }

    fn wait(&self) {
        self.cell.wait();
    }

    fn take(&self) -> Result<T> {
        self.cell.take()
    }
}

impl<T: Send + 'static> IntoFuture for TaskHandle<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<TaskHandle<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Suspend::new(self)
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("completed", &self.is_completed())
            .finish()
    }
}
