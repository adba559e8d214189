use std::cell::Cell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Slot through which a yielded value travels from the body to the
/// generator.
pub(crate) type YieldSlot<T> = Rc<Cell<Option<T>>>;

/// The body's side of a [`Generator`](super::Generator).
///
/// Passed to the body closure when the generator first starts. Each call to
/// [`yield_`](Self::yield_) hands a value to the puller and suspends the body
/// until the next pull.
pub struct Yielder<T> {
    slot: YieldSlot<T>,
}

impl<T> Yielder<T> {
    pub(crate) fn new(slot: YieldSlot<T>) -> Self {
        Self { slot }
    }

    /// Produces `value` and suspends until the next pull.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mainline::Generator;
    ///
    /// let mut numbers = Generator::new(|co| async move {
    ///     co.yield_(1).await;
    ///     co.yield_(2).await;
    ///     3
    /// });
    ///
    /// assert_eq!(numbers.move_next(), Ok(true));
    /// assert_eq!(numbers.current(), Some(&1));
    /// ```
    pub fn yield_(&self, value: T) -> YieldOnce<T> {
        YieldOnce {
            slot: self.slot.clone(),
            value: Some(value),
        }
    }
}

/// A future that suspends the generator body exactly once.
///
/// The first poll deposits the value and returns `Pending` without waking
/// anyone; the generator's next pull polls again and completes it.
#[must_use = "a yield does nothing unless awaited"]
pub struct YieldOnce<T> {
    slot: YieldSlot<T>,
    value: Option<T>,
}

impl<T> Unpin for YieldOnce<T> {}

impl<T> Future for YieldOnce<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(value) = self.value.take() {
            self.slot.set(Some(value));
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}
