// src/supervisor/output.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Lines {
    /// Current run; writers tagged with an older one are ignored.
    run: u64,
    lines: VecDeque<String>,
}

/// Bounded ring buffer of output lines from the supervised process.
///
/// Shared between the reader tasks (writers) and the output window (reader).
/// Once `capacity` lines are stored, the oldest line is dropped for each new
/// one.
///
/// Each spawn calls [`OutputLog::begin_run`] and hands the returned log to
/// its readers. Lines still draining from a previous process's pipes after
/// that point are discarded instead of showing up in the new run.
#[derive(Debug, Clone)]
pub struct OutputLog {
    inner: Arc<Mutex<Lines>>,
    capacity: usize,
    run: u64,
}

impl OutputLog {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Lines {
                run: 0,
                lines: VecDeque::with_capacity(capacity),
            })),
            capacity,
            run: 0,
        }
    }

    /// Clear the buffer and start a new run. Only the returned log (and its
    /// clones) can add lines from now on.
    pub fn begin_run(&self) -> OutputLog {
        let mut inner = self.lock();
        inner.run += 1;
        inner.lines.clear();
        OutputLog {
            inner: Arc::clone(&self.inner),
            capacity: self.capacity,
            run: inner.run,
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut inner = self.lock();
        if inner.run != self.run {
            return;
        }
        if inner.lines.len() == self.capacity {
            inner.lines.pop_front();
        }
        inner.lines.push_back(line.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Lines> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
