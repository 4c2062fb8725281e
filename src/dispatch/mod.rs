// src/dispatch/mod.rs

//! Queues feeding the UI-affine thread.
//!
//! - [`work`]: deferred work items. Background code that needs to touch
//!   UI-affine state enqueues a closure instead of running it directly.
//! - [`errors`]: error reports. Producers never display errors themselves; the
//!   main loop surfaces them one dialog at a time.
//!
//! Both are unbounded `tokio::sync::mpsc` channels with many producers and a
//! single consumer (the main loop), which only ever uses non-blocking
//! `try_recv`. Each queue is FIFO; there is no ordering between the two.

pub mod errors;
pub mod work;

pub use errors::{error_channel, ErrorChannel, ErrorQueue};
pub use work::{work_channel, UiJob, WorkDispatcher, WorkItem, WorkQueue};
