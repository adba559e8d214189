use super::handle::{TaskHandle, TaskId};
use super::state::{self, CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::cell::{Promise, result_cell};
use crate::error::{Error, Result, panic_message};
use crate::runtime::context::{ContextHandle, SyncContext};

use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

/// The boxed task body.
type Body<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// An eagerly started computation whose body always runs on the thread of
/// its synchronization context.
///
/// The body is a future. Every time it returns `Poll::Pending`, the task is
/// parked; whoever holds its waker (a waiter thread, usually) requests a
/// resume, which posts exactly one work item to the context. Running that
/// work item polls the body again.
///
/// Exclusive access to the body and the promise is granted by the `state`
/// machine: only the thread that moved the task into `RUNNING` (or, for
/// cancellation, out of `QUEUED`) touches them.
pub(crate) struct Task<T> {
    /// Process-unique identifier used in log events.
    id: TaskId,

    /// The suspended continuation. `None` once completed or cancelled.
    body: UnsafeCell<Option<Body<T>>>,

    /// Producer of the task's result. `None` once published.
    promise: UnsafeCell<Option<Promise<T>>>,

    /// Current lifecycle state (see [`super::state`]).
    state: AtomicUsize,

    /// Context that resumptions are posted to.
    context: ContextHandle,
}

unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Resumes the task from a work item.
    ///
    /// Only a task in the `QUEUED` state can be resumed. Anything else means
    /// a resume was requested for a continuation that is not waiting for
    /// one, which is a protocol violation and is ignored.
    fn run(self: Arc<Self>) {
        if let Err(current) =
            self.state
                .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        {
            tracing::error!(
                task = %self.id,
                state = state::name(current),
                "resume of a task that is not queued"
            );
            debug_assert!(
                current == CANCELLED,
                "task {} resumed in state {}",
                self.id,
                state::name(current)
            );
            return;
        }

        self.poll_body();
    }

    /// Polls the body once. The caller must have moved the task to `RUNNING`.
    fn poll_body(self: Arc<Self>) {
        let _entered = tracing::debug_span!("task", task = %self.id).entered();
        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: the RUNNING state guarantees that no other thread touches the body.
        let body = unsafe { &mut *self.body.get() };
        let Some(future) = body.as_mut() else {
            return;
        };

        let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        match poll {
            Ok(Poll::Pending) => {
                tracing::debug!(task = %self.id, "task suspended");

                // Park unless a resume was requested while the body was running.
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    self.state.store(QUEUED, Ordering::Release);
                    self.schedule();
                }
            }
            Ok(Poll::Ready(value)) => {
                tracing::debug!(task = %self.id, "task completed");
                self.finish(COMPLETED, Ok(value));
            }
            Err(payload) => {
                let message = panic_message(payload);
                tracing::error!(task = %self.id, panic = %message, "task body panicked");
                self.finish(COMPLETED, Err(Error::Panicked(message)));
            }
        }
    }

    /// Requests resumption of the task. Called through the task's waker.
    ///
    /// A parked task moves to `QUEUED` and gets exactly one work item posted.
    /// A running task is marked `NOTIFIED` and re-posts itself once the
    /// current poll returns. Requests in any other state are no-ops, which
    /// is what makes resumption at-most-once per suspension.
    pub(crate) fn request_resume(self: Arc<Self>) {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            let next = match current {
                IDLE => QUEUED,
                RUNNING => NOTIFIED,
                // Already requested, or finished.
                _ => return,
            };

            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if next == QUEUED {
                        self.schedule();
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Posts the resume work item. The task must be in the `QUEUED` state.
    ///
    /// If the context no longer drains its queue, the task is cancelled
    /// instead.
    fn schedule(self: Arc<Self>) {
        let task = self.clone();

        if self.context.post_live(Box::new(move || task.run())).is_err() {
            tracing::warn!(
                task = %self.id,
                context = %self.context.name(),
                "context aborted, dropping resume"
            );
            self.cancel();
        }
    }

    /// Drops the continuation of a queued task and resolves it as aborted.
    fn cancel(&self) {
        if self
            .state
            .compare_exchange(QUEUED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.finish(CANCELLED, Err(Error::Aborted));
        }
    }

    /// Tears down the continuation and publishes the outcome.
    ///
    /// The caller must hold exclusive access through the state machine.
    fn finish(&self, terminal: usize, outcome: Result<T>) {
        // Safety: exclusive access is guaranteed by the caller's state transition.
        let body = unsafe { (*self.body.get()).take() };
        let promise = unsafe { (*self.promise.get()).take() };

        self.state.store(terminal, Ordering::Release);
        drop(body);

        if let Some(promise) = promise {
            promise.complete(outcome);
        }
    }
}

impl<T> Drop for Task<T> {
    /// Resolves a task that is dropped before finishing.
    ///
    /// This happens when its pending resume is discarded from the queue, or
    /// when the body awaited something that dropped its waker without ever
    /// waking it.
    fn drop(&mut self) {
        if let Some(promise) = self.promise.get_mut().take() {
            let error = if self.context.is_aborted() {
                Error::Aborted
            } else {
                Error::Abandoned
            };

            promise.fail(error);
        }
    }
}

/// Starts a task on `context`.
///
/// The body runs immediately on the calling thread until it first suspends
/// or completes. Later resumptions happen inside [`SyncContext::run_step`].
/// Since a `SyncContext` cannot leave its thread, the body only ever runs
/// on that thread.
///
/// A panic in the body is caught and delivered as [`Error::Panicked`]
/// through the returned handle.
///
/// # Examples
///
/// ```rust
/// use mainline::{SyncContext, task};
///
/// let context = SyncContext::new();
/// let handle = task::spawn(&context, async { 5 });
///
/// // Nothing to wait for: the body ran to completion during spawn.
/// assert!(handle.is_completed());
/// assert_eq!(handle.get_return_value(), Ok(5));
/// ```
pub fn spawn<F, T>(context: &SyncContext, future: F) -> TaskHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (promise, cell) = result_cell();
    let id = TaskId::next();

    let task = Arc::new(Task {
        id,
        body: UnsafeCell::new(Some(Box::pin(future))),
        promise: UnsafeCell::new(Some(promise)),
        state: AtomicUsize::new(RUNNING),
        context: context.handle().clone(),
    });

    tracing::debug!(task = %id, context = %context.name(), "task started");
    task.poll_body();

    TaskHandle::new(id, cell)
}
