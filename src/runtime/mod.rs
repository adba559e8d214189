//! Core runtime components.
//!
//! This module contains the synchronization context and the tasks that run
//! on it.
//!
//! It is responsible for:
//! - queueing callbacks posted from any thread,
//! - running them one at a time, in post order, on the context's thread,
//! - starting, parking and resuming tasks around background operations.
//!
//! Most users interact with [`SyncContext`] and [`task::spawn`].

mod queue;

pub(crate) mod builder;
pub(crate) mod context;

pub mod task;

pub use builder::ContextBuilder;
pub use context::{ContextHandle, Step, SyncContext};
