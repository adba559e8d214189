//! Lazy, pull-driven sequences.
//!
//! A [`Generator`] runs its body only when pulled, one yield at a time, on
//! the pulling thread. Unlike tasks, a generator never crosses threads and
//! never touches a synchronization context.

mod core;
mod yielder;

pub use self::core::Generator;
pub use yielder::{YieldOnce, Yielder};
