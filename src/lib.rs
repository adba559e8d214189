//! # Mainline
//!
//! **Mainline** is a minimal cooperative task runtime built around a
//! *synchronization context*: a thread-safe callback queue drained by one
//! designated thread.
//!
//! Work may complete on any thread, but the code that reacts to it always
//! runs on the context's thread, one callback at a time, in the order the
//! callbacks were posted. On top of that queue, Mainline offers two
//! suspension-aware computations:
//!
//! - **Tasks** start eagerly, suspend on background operations, and resume
//!   on the context's thread once those operations complete.
//! - **Generators** are lazy, pull-driven sequences that suspend on each
//!   yield and never leave the pulling thread.
//!
//! ## Quick Start
//!
//! ```rust
//! use mainline::{SyncContext, cell};
//! use std::time::Duration;
//!
//! let context = SyncContext::new();
//!
//! let task = context.spawn(async {
//!     let mut last = 0;
//!     for i in 0..3 {
//!         last = cell::spawn(move || {
//!             std::thread::sleep(Duration::from_millis(5));
//!             i
//!         })
//!         .await?;
//!     }
//!     Ok::<_, mainline::Error>(last)
//! });
//!
//! while !task.is_completed() {
//!     context.run_step();
//! }
//!
//! assert_eq!(task.get_return_value(), Ok(Ok(2)));
//! ```
//!
//! ## Modules
//!
//! - [`cell`]: One-shot result cells and the background operation trait
//! - [`task`]: Eager tasks resumed through a synchronization context
//! - [`generator`]: Lazy, pull-driven sequences

mod error;
mod runtime;

pub mod cell;
pub mod generator;

pub use cell::{Background, Promise, ResultCell, result_cell};
pub use error::{Error, Result};
pub use generator::{Generator, Yielder};
pub use runtime::task;
pub use runtime::task::TaskHandle;
pub use runtime::{ContextBuilder, ContextHandle, Step, SyncContext};
