use super::yielder::{YieldSlot, Yielder};
use crate::error::{Error, Result, panic_message};
use crate::runtime::task::waker;

use std::cell::Cell;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// A started, suspended body.
type Body<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A body that has not been started yet.
type Start<'a, T> = Box<dyn FnOnce(Yielder<T>) -> Body<'a, T> + 'a>;

/// Lifecycle of a generator.
enum State<'a, T> {
    /// Created, body not run at all.
    NotStarted(Start<'a, T>),

    /// Parked on a yield.
    Suspended(Body<'a, T>),

    /// Returned, panicked, or suspended illegally. Never resumed again.
    Completed,
}

/// A lazy, pull-driven sequence.
///
/// The body is an async closure receiving a [`Yielder`]. Nothing runs until
/// the first [`move_next`](Self::move_next); each pull then runs the body up
/// to its next yield, on the calling thread. The sequence is finite and
/// cannot be restarted.
///
/// The current value is the one passed to the most recent yield, or the
/// body's return value once the body has finished.
///
/// # Examples
///
/// ```rust
/// use mainline::Generator;
///
/// let mut countdown = Generator::new(|co| async move {
///     for i in (1..=3).rev() {
///         co.yield_(i).await;
///     }
///     0
/// });
///
/// let mut seen = Vec::new();
/// while countdown.move_next()? {
///     seen.extend(countdown.current().copied());
/// }
///
/// assert_eq!(seen, vec![3, 2, 1]);
/// assert_eq!(countdown.current(), Some(&0));
/// # Ok::<(), mainline::Error>(())
/// ```
pub struct Generator<'a, T> {
    state: State<'a, T>,

    /// Shared with the body's [`Yielder`].
    slot: YieldSlot<T>,

    /// Most recently yielded or returned value.
    current: Option<T>,
}

impl<'a, T: 'a> Generator<'a, T> {
    /// Creates a generator from its body. Does not run the body.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> Fut + 'a,
        Fut: Future<Output = T> + 'a,
    {
        Self {
            state: State::NotStarted(Box::new(move |co| -> Body<'a, T> {
                Box::pin(body(co))
            })),
            slot: Rc::new(Cell::new(None)),
            current: None,
        }
    }

    /// Runs the body to its next yield.
    ///
    /// Returns `Ok(true)` if the body yielded a value and `Ok(false)` once it
    /// has finished. After that every call keeps returning `Ok(false)` and
    /// [`current`](Self::current) keeps the final value.
    ///
    /// # Errors
    ///
    /// - [`Error::Panicked`] if the body panicked,
    /// - [`Error::ForeignSuspend`] if the body awaited something other than
    ///   a yield.
    ///
    /// Either error exhausts the generator.
    pub fn move_next(&mut self) -> Result<bool> {
        let state = mem::replace(&mut self.state, State::Completed);
        let slot = self.slot.clone();

        let resumed = panic::catch_unwind(AssertUnwindSafe(move || {
            let mut body = match state {
                State::NotStarted(start) => start(Yielder::new(slot)),
                State::Suspended(body) => body,
                State::Completed => return None,
            };

            let poll = body.as_mut().poll(&mut Context::from_waker(waker::detached()));
            Some((body, poll))
        }));

        match resumed {
            Ok(None) => Ok(false),
            Ok(Some((_, Poll::Ready(value)))) => {
                self.current = Some(value);
                Ok(false)
            }
            Ok(Some((body, Poll::Pending))) => match self.slot.take() {
                Some(value) => {
                    self.current = Some(value);
                    self.state = State::Suspended(body);
                    Ok(true)
                }
                None => Err(Error::ForeignSuspend),
            },
            Err(payload) => Err(Error::Panicked(panic_message(payload))),
        }
    }

    /// The most recently yielded or returned value.
    ///
    /// `None` before the first successful [`move_next`](Self::move_next).
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Returns `true` once the body can no longer produce values.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Completed)
    }
}

impl<'a, T: Clone + 'a> Iterator for Generator<'a, T> {
    type Item = Result<T>;

    /// Yields each value passed to a yield, in order.
    ///
    /// The body's return value is not part of the iteration; read it with
    /// [`current`](Generator::current) afterwards. A fault is reported once,
    /// then iteration ends.
    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> std::fmt::Debug for Generator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::NotStarted(_) => "not-started",
            State::Suspended(_) => "suspended",
            State::Completed => "completed",
        };

        f.debug_struct("Generator").field("state", &state).finish()
    }
}
