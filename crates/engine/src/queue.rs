//! FIFO of pending script submissions.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// One pending script: inline source text or a file to load.
///
/// Owned by the queue until dequeued, consumed exactly once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Source(String),
    File(PathBuf),
}

/// Thread-safe submission FIFO with a blocking, stoppable take.
pub struct SubmissionQueue {
    items: Mutex<VecDeque<Submission>>,
    available: Condvar,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append a submission. Never blocks; callable from any thread.
    pub fn push(&self, submission: Submission) {
        self.items.lock().push_back(submission);
        self.available.notify_one();
    }

    /// Pop the head in FIFO order, blocking until a submission arrives.
    ///
    /// Returns `None` once `stop` is set; pending submissions are then
    /// dropped without executing.
    pub fn take(&self, stop: &AtomicBool) -> Option<Submission> {
        let mut items = self.items.lock();
        loop {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(submission) = items.pop_front() {
                return Some(submission);
            }
            self.available.wait(&mut items);
        }
    }

    /// Wake every blocked `take`, typically after setting the stop flag.
    pub fn wake_all(&self) {
        let _items = self.items.lock();
        self.available.notify_all();
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}
