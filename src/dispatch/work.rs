// src/dispatch/work.rs

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::errors::{Result, TetherError};
use crate::ui::UiContext;

/// A closure executed on the UI-affine thread.
pub type UiJob = Box<dyn FnOnce(&mut UiContext) + Send + 'static>;

/// One deferred work item.
///
/// The job of a `Call` item fires a one-shot completion token (carrying the
/// closure's result) after running; a `Post` item has no completion token.
pub enum WorkItem {
    Post(UiJob),
    Call(UiJob),
}

impl WorkItem {
    /// Run the item on the UI thread. Consumes it; each item runs once.
    pub fn run(self, ui: &mut UiContext) {
        match self {
            WorkItem::Post(job) => {
                trace!("running posted work item");
                job(ui);
            }
            WorkItem::Call(job) => {
                trace!("running blocking work item");
                job(ui);
            }
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Post(_) => f.write_str("WorkItem::Post(..)"),
            WorkItem::Call(_) => f.write_str("WorkItem::Call(..)"),
        }
    }
}

/// Create the work queue: a cloneable producer side and the single consumer.
pub fn work_channel() -> (WorkDispatcher, WorkQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WorkDispatcher { tx }, WorkQueue { rx })
}

/// Producer side of the work queue. Usable from any thread.
#[derive(Clone)]
pub struct WorkDispatcher {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl fmt::Debug for WorkDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkDispatcher")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl WorkDispatcher {
    /// Enqueue `f` without waiting for it.
    ///
    /// Fails with [`TetherError::ShutdownInProgress`] once the main loop has
    /// gone away.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.tx
            .send(WorkItem::Post(Box::new(f)))
            .map_err(|_| TetherError::ShutdownInProgress)
    }

    /// Run `f` on the UI thread and wait for it to finish, returning its
    /// result. This is the "Do" operation for plain threads.
    ///
    /// Must not be called from the UI thread itself (it would wait on itself),
    /// nor from inside an async task; use [`WorkDispatcher::call`] there.
    ///
    /// If the main loop exits before running `f`, the queued item is dropped
    /// with its completion token and this returns
    /// [`TetherError::ShutdownInProgress`] instead of waiting forever.
    pub fn call_blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let done = self.enqueue_call(f)?;
        done.blocking_recv().map_err(|_| {
            debug!("work item dropped before completion; main loop has exited");
            TetherError::ShutdownInProgress
        })
    }

    /// Async form of [`WorkDispatcher::call_blocking`] for Tokio tasks.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let done = self.enqueue_call(f)?;
        done.await.map_err(|_| {
            debug!("work item dropped before completion; main loop has exited");
            TetherError::ShutdownInProgress
        })
    }

    fn enqueue_call<F, R>(&self, f: F) -> Result<oneshot::Receiver<R>>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<R>();
        let job: UiJob = Box::new(move |ui| {
            let result = f(ui);
            // The caller may have given up waiting; nothing to do then.
            let _ = done_tx.send(result);
        });

        self.tx
            .send(WorkItem::Call(job))
            .map_err(|_| TetherError::ShutdownInProgress)?;

        Ok(done_rx)
    }
}

/// Consumer side of the work queue, owned by the main loop.
#[derive(Debug)]
pub struct WorkQueue {
    rx: mpsc::UnboundedReceiver<WorkItem>,
}

impl WorkQueue {
    /// Non-blocking receive of the next item, if any.
    pub fn try_next(&mut self) -> Option<WorkItem> {
        self.rx.try_recv().ok()
    }
}
