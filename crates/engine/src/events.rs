//! Events raised by the engine worker toward the controller.
//!
//! Delivered over an `mpsc` channel held by the [`ScriptRunner`] handle.
//! Every failure path produces exactly one `Error` followed by exactly one
//! `Finished { has_error: true }`; nothing is silently swallowed.
//!
//! [`ScriptRunner`]: crate::runner::ScriptRunner

/// An event sent from the worker thread to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A submission finished executing.
    ///
    /// Emitted exactly once per submission, in submission order.
    Finished { has_error: bool },

    /// A compilation or runtime error message.
    ///
    /// Always followed by `Finished { has_error: true }` for the same
    /// submission. Also emitted (without a following `Finished`) when the
    /// worker dies on a fatal resource error.
    Error { message: String },

    /// The output mailbox holds an unread message.
    ///
    /// The controller must drain it via `consume_message` (or
    /// `clear_pending_message`), otherwise the next `print` call blocks
    /// the worker until a halt.
    MessageAvailable,
}
