//! One-shot result cells.
//!
//! This module provides the cross-thread bridge between a producer that
//! computes a value once and any number of observers of that value.
//!
//! It includes:
//! - [`ResultCell`] and [`Promise`], the consumer and producer halves,
//! - the [`Background`] trait describing anything a task can suspend on,
//! - [`spawn`], a minimal launcher running a closure on its own thread.
//!
//! Cells are internally synchronized and do not depend on a
//! synchronization context.

mod background;
mod core;

pub use background::{Background, spawn};
pub use self::core::{Promise, ResultCell, result_cell};
