//! Suspendable tasks.
//!
//! A task is an eagerly started future whose body always runs on the thread
//! of its [`SyncContext`](crate::SyncContext). Whenever the body awaits a
//! background operation that is not ready yet, a waiter thread blocks on the
//! operation and then posts the task's resumption into the context.
//!
//! It includes:
//! - [`spawn`], which starts a task,
//! - [`suspend`] and [`Suspend`], the await point for background work,
//! - [`TaskHandle`], which observes the task's result.
//!
//! The lower-level state machine and waker are internal.

pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod suspend;
pub(crate) mod waker;

pub use self::core::spawn;
pub use handle::{TaskHandle, TaskId};
pub use suspend::{Suspend, suspend};
