//! Interruptible sleep for the `sleep` host function.
//!
//! The wait is a timed condition-variable wait that only `halt` ever
//! signals, so a sleeping script can always be stopped promptly: the wait
//! returns early and the checkpoint that follows the host call observes
//! the halt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::control::Controller;

pub struct SleepGate {
    gate: Mutex<()>,
    interrupted: Condvar,
    /// Per-run switch, reset to true at each submission. Kept so sleeping
    /// can be disabled without touching the call sites.
    allowed: AtomicBool,
}

impl SleepGate {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(()),
            interrupted: Condvar::new(),
            allowed: AtomicBool::new(true),
        }
    }

    /// Re-enable sleeping for a new run.
    pub fn reset(&self) {
        self.allowed.store(true, Ordering::Relaxed);
    }

    pub fn set_allowed(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::Relaxed);
    }

    /// Wait for `duration`, or until a halt is requested, whichever comes
    /// first. Returns immediately when sleeping is disallowed.
    pub fn sleep(&self, duration: Duration, control: &Controller) {
        if !self.allowed.load(Ordering::Relaxed) {
            return;
        }

        let deadline = Instant::now() + duration;
        let mut gate = self.gate.lock();
        while !control.halt_requested() {
            if Instant::now() >= deadline {
                break;
            }
            if self.interrupted.wait_until(&mut gate, deadline).timed_out() {
                break;
            }
        }
    }

    /// Wake a sleeping script. Called on halt.
    pub fn interrupt(&self) {
        let _gate = self.gate.lock();
        self.interrupted.notify_all();
    }
}

impl Default for SleepGate {
    fn default() -> Self {
        Self::new()
    }
}
