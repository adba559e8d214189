use super::waker;
use crate::cell::Background;
use crate::error::Result;

use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread;

/// Waker slot shared between a suspension point and its waiter thread.
///
/// The waiter takes the waker out when it fires, so a fired slot never keeps
/// the task alive.
type WakerSlot = Arc<Mutex<Option<Waker>>>;

/// A suspension point on a [`Background`] operation.
///
/// Polling it follows the hand-off protocol:
///
/// 1. If the operation is already complete, the result is returned right
///    away: no thread is spawned and nothing goes through the queue.
/// 2. Otherwise a waiter thread is spawned. It blocks until the operation is
///    ready and then wakes the task, which posts the resume to the task's
///    synchronization context. The poll returns `Pending` and the task
///    parks.
///
/// Once resumed, the operation is ready and its result is taken.
///
/// Created by [`suspend`], or implicitly by awaiting a
/// [`ResultCell`](crate::ResultCell) or a [`TaskHandle`](crate::TaskHandle).
#[must_use = "futures do nothing unless awaited"]
pub struct Suspend<O: Background> {
    /// The awaited operation, shared with the waiter thread.
    op: Arc<O>,

    /// Present while a waiter thread is outstanding.
    waiter: Option<WakerSlot>,
}

impl<O: Background> Suspend<O> {
    pub(crate) fn new(op: O) -> Self {
        Self {
            op: Arc::new(op),
            waiter: None,
        }
    }

    /// Spawns the waiter thread for the current suspension.
    ///
    /// Returns `false` if no thread could be spawned.
    fn spawn_waiter(&mut self, waker: &Waker) -> bool {
        let slot: WakerSlot = Arc::new(Mutex::new(Some(waker.clone())));
        let op = self.op.clone();
        let fired = slot.clone();

        let spawned = thread::Builder::new()
            .name(String::from("mainline-waiter"))
            .spawn(move || {
                op.wait();

                let waker = fired.lock().take();
                if let Some(waker) = waker {
                    waker.wake();
                }
            });

        match spawned {
            Ok(_) => {
                self.waiter = Some(slot);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to spawn waiter thread, waiting inline");
                false
            }
        }
    }
}

impl<O: Background> Future for Suspend<O> {
    type Output = Result<O::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.op.is_ready() {
            // The waiter may not have fired yet. It must not wake whatever
            // the task suspends on next.
            if let Some(slot) = self.waiter.take() {
                slot.lock().take();
            }
            return Poll::Ready(self.op.take());
        }

        if let Some(slot) = &self.waiter {
            // Spurious poll: the waiter is still blocked, keep its waker current.
            let mut held = slot.lock();
            if let Some(waker) = held.as_mut() {
                waker.clone_from(cx.waker());
            }
            return Poll::Pending;
        }

        if waker::is_detached(cx.waker()) {
            return Poll::Pending;
        }

        if self.spawn_waiter(cx.waker()) {
            return Poll::Pending;
        }

        self.op.wait();
        Poll::Ready(self.op.take())
    }
}

impl<O: Background> Drop for Suspend<O> {
    fn drop(&mut self) {
        if let Some(slot) = self.waiter.take() {
            slot.lock().take();
        }
    }
}

/// Suspends the current task until `op` completes.
///
/// If `op` is already complete the task keeps running without a thread
/// hand-off. Otherwise the task parks and is resumed on its context's thread
/// once `op` is ready.
///
/// # Examples
///
/// ```rust
/// use mainline::{SyncContext, cell, task};
///
/// let context = SyncContext::new();
///
/// let handle = context.spawn(async {
///     let a = task::suspend(cell::spawn(|| 1)).await;
///     let b = task::suspend(cell::spawn(|| 2)).await;
///     a.and_then(|a| b.map(|b| a + b))
/// });
///
/// assert_eq!(context.block_on(handle), Ok(Ok(3)));
/// ```
pub fn suspend<O: Background>(op: O) -> Suspend<O> {
    Suspend::new(op)
}
