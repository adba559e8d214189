use std::any::Any;

use thiserror::Error;

/// Errors surfaced through task results and sequence steps.
///
/// Every failure of a task body ends up in the task's result cell as one of
/// these variants, so a driver observes faults through the same channel as
/// successful results instead of the process going down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The task or sequence body panicked. Carries the panic message.
    #[error("body panicked: {0}")]
    Panicked(String),

    /// The producer side of a result was dropped without publishing anything.
    #[error("producer dropped before publishing a result")]
    Abandoned,

    /// The one-time value of a result cell was already taken.
    #[error("result already taken")]
    AlreadyTaken,

    /// The synchronization context was aborted before the task completed.
    #[error("synchronization context aborted before completion")]
    Aborted,

    /// A sequence body suspended on something other than a yield.
    #[error("sequence body suspended without yielding a value")]
    ForeignSuspend,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => String::from("non-string panic payload"),
        },
    }
}
