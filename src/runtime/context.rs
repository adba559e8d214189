use super::builder::ContextBuilder;
use super::queue::{Next, WorkItem, WorkQueue};
use crate::error::{Error, Result};
use crate::task::{self, TaskHandle};

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single run step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One work item was executed on the calling thread.
    Ran,

    /// Nothing was executed because the queue was empty.
    ///
    /// Only returned by the non-blocking and timed variants.
    Idle,

    /// The context has been aborted; nothing will be executed anymore.
    Aborted,
}

/// State shared by a context and all of its handles.
struct Inner {
    /// Pending work and abort flag.
    queue: WorkQueue,

    /// Name reported in log events.
    name: Box<str>,
}

/// A cloneable, thread-safe handle to a [`SyncContext`].
///
/// Handles can post work and abort the context from any thread, but cannot
/// run work: only the owning [`SyncContext`] does that, on its own thread.
#[derive(Clone)]
pub struct ContextHandle {
    inner: Arc<Inner>,
}

impl ContextHandle {
    /// Appends a callback to the context's queue.
    ///
    /// Never fails. A callback posted after [`abort`](Self::abort) is still
    /// queued but will never run; it stays alive until
    /// [`SyncContext::discard_pending`] is called or the context is dropped.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let (pending, aborted) = self.inner.queue.push(Box::new(f));

        if aborted {
            tracing::warn!(
                context = %self.inner.name,
                pending,
                "work item posted to an aborted context will never run"
            );
        } else {
            tracing::trace!(context = %self.inner.name, pending, "work item posted");
        }
    }

    /// Appends a work item unless the context has been aborted.
    ///
    /// Hands the item back when the context no longer drains its queue.
    pub(crate) fn post_live(&self, item: WorkItem) -> std::result::Result<(), WorkItem> {
        let pending = self.inner.queue.push_live(item)?;
        tracing::trace!(context = %self.inner.name, pending, "resume posted");
        Ok(())
    }

    /// Stops the context's run loop. Idempotent.
    ///
    /// Pending callbacks are not executed. Waiter threads and background
    /// operations that are still in flight are not interrupted.
    pub fn abort(&self) {
        self.inner.queue.abort();
        tracing::debug!(
            context = %self.inner.name,
            pending = self.inner.queue.len(),
            "context aborted"
        );
    }

    /// Returns `true` once the context has been aborted.
    pub fn is_aborted(&self) -> bool {
        self.inner.queue.is_aborted()
    }

    /// Number of callbacks waiting in the queue.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// The context's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("name", &self.name())
            .field("pending", &self.pending())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// A single-threaded run loop fed by a thread-safe callback queue.
///
/// Callbacks posted from any thread are executed one at a time, in post
/// order, on the thread that owns the context. Tasks use it to resume their
/// bodies after a background operation completes, so task code always runs
/// on this one thread.
///
/// `SyncContext` is neither `Send` nor `Sync`: the thread that creates it is
/// the only thread that can run its callbacks. Use [`handle`](Self::handle)
/// to post from elsewhere.
///
/// # Examples
///
/// ```rust
/// use mainline::SyncContext;
///
/// let context = SyncContext::new();
///
/// let task = context.spawn(async {
///     let n = mainline::cell::spawn(|| 21).await?;
///     Ok::<_, mainline::Error>(n * 2)
/// });
///
/// assert_eq!(context.block_on(task), Ok(Ok(42)));
/// ```
pub struct SyncContext {
    handle: ContextHandle,

    /// Pins the context to its creating thread.
    _main_thread: PhantomData<*const ()>,
}

impl SyncContext {
    /// Creates a context with the default configuration.
    pub fn new() -> Self {
        ContextBuilder::new().build()
    }

    /// Returns a builder for a customized context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub(crate) fn from_parts(name: String, capacity: usize) -> Self {
        Self {
            handle: ContextHandle {
                inner: Arc::new(Inner {
                    queue: WorkQueue::with_capacity(capacity),
                    name: name.into_boxed_str(),
                }),
            },
            _main_thread: PhantomData,
        }
    }

    /// Returns a thread-safe handle for posting work.
    pub fn handle(&self) -> &ContextHandle {
        &self.handle
    }

    /// The context's name.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Appends a callback to the queue. See [`ContextHandle::post`].
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.post(f);
    }

    /// Runs the next callback, blocking until one is available.
    ///
    /// Returns [`Step::Aborted`] without running anything once the context
    /// has been aborted, even if callbacks are still queued.
    ///
    /// A panic raised by a raw posted callback propagates to the caller.
    pub fn run_step(&self) -> Step {
        self.execute(self.handle.inner.queue.pop())
    }

    /// Runs the next callback if one is queued, without blocking.
    pub fn try_run_step(&self) -> Step {
        self.execute(self.handle.inner.queue.try_pop())
    }

    /// Runs the next callback, waiting at most `timeout` for one to arrive.
    pub fn run_step_timeout(&self, timeout: Duration) -> Step {
        self.execute(self.handle.inner.queue.pop_timeout(timeout))
    }

    /// Runs queued callbacks until the queue is empty, without blocking.
    ///
    /// Callbacks posted while draining are run as well. Returns the number of
    /// callbacks executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;

        while self.try_run_step() == Step::Ran {
            ran += 1;
        }

        ran
    }

    fn execute(&self, next: Next) -> Step {
        match next {
            Next::Item(item) => {
                tracing::trace!(
                    context = %self.name(),
                    pending = self.pending(),
                    "running work item"
                );
                item();
                Step::Ran
            }
            Next::Empty => Step::Idle,
            Next::Aborted => Step::Aborted,
        }
    }

    /// Stops the run loop. See [`ContextHandle::abort`].
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the context has been aborted.
    pub fn is_aborted(&self) -> bool {
        self.handle.is_aborted()
    }

    /// Number of callbacks waiting in the queue.
    pub fn pending(&self) -> usize {
        self.handle.pending()
    }

    /// Drops every queued callback without running it.
    ///
    /// This reclaims work that an aborted context would otherwise hold on to.
    /// Tasks whose resumption is dropped this way resolve to
    /// [`Error::Aborted`] if the context was aborted, or
    /// [`Error::Abandoned`] otherwise. Returns the number of callbacks
    /// dropped.
    pub fn discard_pending(&self) -> usize {
        let items = self.handle.inner.queue.drain();
        let discarded = items.len();
        drop(items);

        if discarded > 0 {
            tracing::debug!(context = %self.name(), discarded, "pending work discarded");
        }

        discarded
    }

    /// Starts a task on this context. See [`task::spawn`].
    pub fn spawn<F, T>(&self, future: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        task::spawn(self, future)
    }

    /// Runs callbacks until `handle`'s task completes, then returns its
    /// result.
    ///
    /// Returns [`Error::Aborted`] if the context is aborted before the task
    /// completes.
    pub fn block_on<T>(&self, handle: TaskHandle<T>) -> Result<T> {
        while !handle.is_completed() {
            if self.run_step() == Step::Aborted && !handle.is_completed() {
                return Err(Error::Aborted);
            }
        }

        handle.get_return_value()
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SyncContext {
    /// Aborts the context and drops its pending work.
    ///
    /// Once the owning context is gone nothing can drain the queue, so any
    /// waiter finishing later cancels its task instead of posting.
    fn drop(&mut self) {
        self.handle.abort();
        self.discard_pending();
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("name", &self.name())
            .field("pending", &self.pending())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
