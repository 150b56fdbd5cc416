//! Script execution engine for turtle graphics.
//!
//! # Architecture
//!
//! One dedicated worker thread owns a sandboxed Lua VM and executes
//! submitted scripts to completion, one at a time:
//!
//! 1. **ScriptRunner** is the controller-facing handle: submit scripts,
//!    pause/resume/halt, change require paths, drain printed messages.
//!    Every controller call is non-blocking and thread-safe.
//! 2. **SubmissionQueue** carries pending script texts (or file paths) to
//!    the worker in FIFO order.
//! 3. **Controller** holds the pause and halt flags; the interpreter's
//!    instruction hook and every side-effecting host function call
//!    `checkpoint()`, which blocks while paused and aborts the script with
//!    a fixed sentinel error once a halt is requested.
//! 4. **Mailbox** is the single-slot, backpressured path for `print`
//!    output: the worker blocks on a second message until the controller
//!    drains the first (or a halt is requested).
//! 5. **SleepGate** lets scripts sleep without blocking control: a halt
//!    releases the wait early.
//!
//! # Critical Rule
//!
//! **Scripts never touch the host directly.**
//!
//! The VM loads a restricted library set (no `os`, no `io`, no `debug`,
//! no code loading from strings or files) and the registered host
//! functions are the only way a script produces an externally visible
//! effect. Drawing goes through the [`Surface`] trait; the engine never
//! assumes exclusive access to the surface.

pub mod control;
pub mod events;
pub mod mailbox;
pub mod paths;
pub mod queue;
pub mod runner;
pub mod runtime;
pub mod sleep;
pub mod surface;

mod api;

#[cfg(test)]
pub mod harness;

pub use control::{Controller, CHECKPOINT_INTERVAL, HALT_MESSAGE};
pub use events::EngineEvent;
pub use runner::ScriptRunner;
pub use surface::Surface;
