/// Task is parked on a suspension point.
///
/// Its continuation is waiting for a waiter thread to request resumption.
pub(crate) const IDLE: usize = 0;

/// A resumption has been posted to the context and not yet executed.
///
/// Exactly one work item for the task exists in the queue.
pub(crate) const QUEUED: usize = 1;

/// The task body is being polled on the context's thread.
///
/// At most one thread may observe this state at a time.
pub(crate) const RUNNING: usize = 2;

/// The task body returned or panicked.
///
/// The continuation has been dropped and will never be polled again.
pub(crate) const COMPLETED: usize = 3;

/// Resumption was requested while the body was still running.
///
/// The task is re-posted as soon as the current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// The context was aborted before a requested resumption could be posted.
///
/// The continuation has been dropped without completing.
pub(crate) const CANCELLED: usize = 5;

/// Human-readable state name for log events.
pub(crate) fn name(state: usize) -> &'static str {
    match state {
        IDLE => "idle",
        QUEUED => "queued",
        RUNNING => "running",
        COMPLETED => "completed",
        NOTIFIED => "notified",
        CANCELLED => "cancelled",
        _ => "unknown",
    }
}
