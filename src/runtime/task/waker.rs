use super::core::Task;

use std::sync::{Arc, LazyLock};
use std::task::{Wake, Waker};

/// A task's waker requests its resumption.
///
/// Each live waker owns one strong reference to the task, so a waiter thread
/// holding it keeps the continuation alive until the resume is requested.
impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        self.request_resume();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.clone().request_resume();
    }
}

/// Waker for computations that have no context to resume them.
struct Detached;

impl Wake for Detached {
    fn wake(self: Arc<Self>) {}
}

static DETACHED: LazyLock<Waker> = LazyLock::new(|| Waker::from(Arc::new(Detached)));

/// The waker generators poll their bodies with.
///
/// Waking it does nothing. Suspension points recognize it and skip the
/// waiter hand-off, since nobody would ever run the resume.
pub(crate) fn detached() -> &'static Waker {
    &DETACHED
}

/// Returns `true` if `waker` is the [`detached`] waker.
pub(crate) fn is_detached(waker: &Waker) -> bool {
    waker.will_wake(detached())
}
