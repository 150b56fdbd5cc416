//! Pause/halt flags and the cooperative checkpoint.
//!
//! Cancellation is cooperative: the running script can only be stopped at
//! a checkpoint, never mid-instruction. Checkpoints are reached from the
//! interpreter's instruction hook (every [`CHECKPOINT_INTERVAL`]
//! instructions) and after every side-effecting host function call, so
//! halt latency is bounded by one host call or one instruction interval,
//! regardless of script structure.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// Number of interpreter instructions between automatic checkpoints.
///
/// Bounds how long a script that makes no host calls (a bare `while true
/// do end`) can run past a pause or halt request.
pub const CHECKPOINT_INTERVAL: u32 = 1_000;

/// Sentinel error message raised by the checkpoint when a halt request is
/// observed.
pub const HALT_MESSAGE: &str = "script halted";

/// Pause and halt state for the running script.
///
/// The pause flag and the halt flag are independent: halting a paused
/// script must still release the paused checkpoint, which is why
/// `request_halt` resumes internally.
pub struct Controller {
    paused: Mutex<bool>,
    resumed: Condvar,
    halt: AtomicBool,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            halt: AtomicBool::new(false),
        }
    }

    /// Request a pause. Takes effect at the script's next checkpoint, not
    /// immediately; has no effect if nothing is running.
    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    /// Clear the pause flag and wake any checkpoint blocked on it.
    pub fn resume(&self) {
        let mut paused = self.paused.lock();
        if *paused {
            *paused = false;
            self.resumed.notify_all();
        }
    }

    /// Request a halt. The script aborts at its next checkpoint. A script
    /// that is currently paused is resumed so it can observe the halt.
    pub fn request_halt(&self) {
        self.halt.store(true, Ordering::Relaxed);
        self.resume();
    }

    pub fn halt_requested(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }

    /// Clear both flags before a new run. Any checkpoint still blocked on
    /// a stale pause is woken.
    pub fn reset(&self) {
        self.resume();
        self.halt.store(false, Ordering::Relaxed);
    }

    /// The checkpoint body: block while paused, then abort with the halt
    /// sentinel if a halt was requested.
    pub fn checkpoint(&self) -> mlua::Result<()> {
        let mut paused = self.paused.lock();
        while *paused {
            self.resumed.wait(&mut paused);
        }
        drop(paused);

        if self.halt_requested() {
            Err(mlua::Error::RuntimeError(HALT_MESSAGE.to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn test_checkpoint_passes_when_idle() {
        let control = Controller::new();
        assert!(control.checkpoint().is_ok());
    }

    #[test]
    fn test_checkpoint_aborts_after_halt() {
        let control = Controller::new();
        control.request_halt();
        let err = control.checkpoint().unwrap_err();
        assert!(err.to_string().contains(HALT_MESSAGE));
    }

    #[test]
    fn test_reset_clears_both_flags() {
        let control = Controller::new();
        control.pause();
        control.request_halt();
        control.reset();
        assert!(!control.halt_requested());
        assert!(control.checkpoint().is_ok());
    }

    #[test]
    fn test_pause_blocks_checkpoint_until_resume() {
        let control = Arc::new(Controller::new());
        control.pause();

        let worker = {
            let control = control.clone();
            std::thread::spawn(move || {
                let start = Instant::now();
                control.checkpoint().unwrap();
                start.elapsed()
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        control.resume();
        let blocked_for = worker.join().unwrap();
        assert!(blocked_for >= Duration::from_millis(50),
                "checkpoint returned after {:?}, expected to block", blocked_for);
    }

    #[test]
    fn test_halt_releases_paused_checkpoint() {
        let control = Arc::new(Controller::new());
        control.pause();

        let worker = {
            let control = control.clone();
            // `mlua::Error` is not `Send` in this mlua build, so the
            // checkpoint result cannot cross the join boundary directly;
            // carry the error as a `String` instead.
            std::thread::spawn(move || control.checkpoint().map_err(|e| e.to_string()))
        };

        std::thread::sleep(Duration::from_millis(50));
        control.request_halt();
        let result = worker.join().unwrap();
        assert!(result.unwrap_err().to_string().contains(HALT_MESSAGE));
    }
}
