//! Drives one task through five background operations on the main thread.
//!
//! Run with `cargo run --example countdown`. Every log line carries the
//! thread it was emitted from: background work runs elsewhere, but the task
//! body always resumes on the main thread.

use mainline::{Error, SyncContext, cell};
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_thread_ids(true)
        .with_target(false)
        .compact()
        .init();

    let context = SyncContext::builder().name("main").build();

    tracing::info!(tid = ?thread::current().id(), "main: starting task");

    let task = context.spawn(async {
        tracing::info!(tid = ?thread::current().id(), "task: started");

        let mut last = 0;
        for i in 0..5 {
            last = cell::spawn(move || {
                tracing::info!(tid = ?thread::current().id(), i, "background: working");
                thread::sleep(Duration::from_millis(200));
                i
            })
            .await?;

            tracing::info!(tid = ?thread::current().id(), value = last, "task: resumed");
        }

        Ok::<_, Error>(last)
    });

    while !task.is_completed() {
        context.run_step();
    }

    match task.get_return_value() {
        Ok(Ok(value)) => {
            tracing::info!(tid = ?thread::current().id(), value, "main: task finished")
        }
        Ok(Err(err)) | Err(err) => tracing::error!(error = %err, "main: task failed"),
    }
}
