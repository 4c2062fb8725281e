// src/dispatch/errors.rs

use tokio::sync::mpsc;
use tracing::warn;

use crate::errors::TetherError;

/// Create the error queue: a cloneable producer side and the single consumer.
pub fn error_channel() -> (ErrorChannel, ErrorQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ErrorChannel { tx }, ErrorQueue { rx })
}

/// Producer side of the error queue. Usable from any thread.
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    tx: mpsc::UnboundedSender<TetherError>,
}

impl ErrorChannel {
    /// Queue `err` for display.
    ///
    /// Reporting after the main loop has exited only logs the error.
    pub fn report(&self, err: TetherError) {
        warn!(error = %err, "queueing error for display");
        if let Err(mpsc::error::SendError(err)) = self.tx.send(err) {
            warn!(error = %err, "main loop has exited; error not displayed");
        }
    }
}

/// Consumer side of the error queue, owned by the main loop.
#[derive(Debug)]
pub struct ErrorQueue {
    rx: mpsc::UnboundedReceiver<TetherError>,
}

impl ErrorQueue {
    /// Non-blocking receive of the next error, if any.
    pub fn try_next(&mut self) -> Option<TetherError> {
        self.rx.try_recv().ok()
    }
}
