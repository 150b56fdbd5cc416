//! Single-slot message box from the worker to the controller.
//!
//! `print` output travels through here with backpressure: at most one
//! unread message exists at any time, and the worker blocks on the next
//! `post` until the controller drains the slot or a halt is requested.
//! This bounds the output backlog of a tight print loop to one message.
//!
//! Liveness note: a controller that neither drains nor halts leaves the
//! worker parked in `post` indefinitely. Draining on every
//! `MessageAvailable` event is part of the controller contract.

use parking_lot::{Condvar, Mutex};

use crate::control::Controller;

pub struct Mailbox {
    slot: Mutex<Option<String>>,
    changed: Condvar,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            changed: Condvar::new(),
        }
    }

    /// Store a message, waiting while one is already pending.
    ///
    /// Returns `true` once the message is stored. Returns `false` without
    /// storing when a halt request ends the wait (or was already pending
    /// on entry); the caller's next checkpoint turns that into an abort.
    pub fn post(&self, message: String, control: &Controller) -> bool {
        let mut slot = self.slot.lock();
        while slot.is_some() && !control.halt_requested() {
            self.changed.wait(&mut slot);
        }
        if control.halt_requested() {
            return false;
        }
        *slot = Some(message);
        true
    }

    /// Take and clear the pending message, waking a blocked `post`.
    pub fn consume(&self) -> Option<String> {
        let mut slot = self.slot.lock();
        let message = slot.take();
        self.changed.notify_all();
        message
    }

    /// Discard the pending message without reading it, waking a blocked
    /// `post`.
    pub fn clear(&self) {
        let mut slot = self.slot.lock();
        *slot = None;
        self.changed.notify_all();
    }

    pub fn pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Wake any blocked `post` so it can observe a halt request.
    pub fn interrupt(&self) {
        let _slot = self.slot.lock();
        self.changed.notify_all();
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_post_then_consume() {
        let mailbox = Mailbox::new();
        let control = Controller::new();

        assert!(mailbox.post("hello".to_string(), &control));
        assert!(mailbox.pending());
        assert_eq!(mailbox.consume(), Some("hello".to_string()));
        assert!(!mailbox.pending());
        assert_eq!(mailbox.consume(), None);
    }

    #[test]
    fn test_clear_discards() {
        let mailbox = Mailbox::new();
        let control = Controller::new();

        assert!(mailbox.post("dropped".to_string(), &control));
        mailbox.clear();
        assert!(!mailbox.pending());
        assert_eq!(mailbox.consume(), None);
    }

    #[test]
    fn test_second_post_blocks_until_consume() {
        let mailbox = Arc::new(Mailbox::new());
        let control = Arc::new(Controller::new());

        assert!(mailbox.post("first".to_string(), &control));

        let producer = {
            let mailbox = mailbox.clone();
            let control = control.clone();
            std::thread::spawn(move || mailbox.post("second".to_string(), &control))
        };

        // The producer must still be blocked with "first" undrained.
        std::thread::sleep(Duration::from_millis(100));
        assert!(!producer.is_finished());

        assert_eq!(mailbox.consume(), Some("first".to_string()));
        assert!(producer.join().unwrap());
        assert_eq!(mailbox.consume(), Some("second".to_string()));
    }

    #[test]
    fn test_halt_unblocks_post_without_delivering() {
        let mailbox = Arc::new(Mailbox::new());
        let control = Arc::new(Controller::new());

        assert!(mailbox.post("first".to_string(), &control));

        let producer = {
            let mailbox = mailbox.clone();
            let control = control.clone();
            std::thread::spawn(move || mailbox.post("second".to_string(), &control))
        };

        std::thread::sleep(Duration::from_millis(50));
        control.request_halt();
        mailbox.interrupt();

        assert!(!producer.join().unwrap());
        // Only the first message was ever stored.
        assert_eq!(mailbox.consume(), Some("first".to_string()));
        assert_eq!(mailbox.consume(), None);
    }

    #[test]
    fn test_post_after_halt_refuses() {
        let mailbox = Mailbox::new();
        let control = Controller::new();
        control.request_halt();
        assert!(!mailbox.post("late".to_string(), &control));
        assert!(!mailbox.pending());
    }
}
