//! The engine worker thread and its controller-facing handle.
//!
//! `ScriptRunner::spawn` starts one named worker thread that owns the
//! sandboxed Lua VM for its whole lifetime; no other thread ever touches
//! interpreter state. The worker drains the submission queue in FIFO
//! order, applies pending require-path changes, compiles and runs each
//! submission, and reports the outcome as [`EngineEvent`]s.
//!
//! Every controller method is non-blocking and safe to call from any
//! thread while a script is running.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use mlua::{HookTriggers, Lua, VmState};

use crate::api::{register_host_functions, HostContext};
use crate::control::{Controller, CHECKPOINT_INTERVAL};
use crate::events::EngineEvent;
use crate::mailbox::Mailbox;
use crate::paths::RequirePaths;
use crate::queue::{Submission, SubmissionQueue};
use crate::runtime::{format_lua_error, new_sandboxed_lua, set_package_path};
use crate::sleep::SleepGate;
use crate::surface::Surface;

/// State shared between the controller handle, the worker loop and the
/// host functions.
pub(crate) struct EngineShared {
    pub queue: SubmissionQueue,
    pub control: Controller,
    pub sleep: SleepGate,
    pub mailbox: Mailbox,
    pub paths: RequirePaths,
    pub stop: AtomicBool,
}

impl EngineShared {
    fn new() -> Self {
        Self {
            queue: SubmissionQueue::new(),
            control: Controller::new(),
            sleep: SleepGate::new(),
            mailbox: Mailbox::new(),
            paths: RequirePaths::new(),
            stop: AtomicBool::new(false),
        }
    }

    /// Halt the current script: set the flag, then wake every blocking
    /// point a script can be parked at (paused checkpoint, sleep,
    /// mailbox backpressure).
    pub(crate) fn halt(&self) {
        self.control.request_halt();
        self.sleep.interrupt();
        self.mailbox.interrupt();
    }
}

/// Controller-facing handle to the engine worker.
pub struct ScriptRunner {
    shared: Arc<EngineShared>,
    /// Worker → controller event stream.
    pub events: mpsc::Receiver<EngineEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptRunner {
    /// Spawn the worker thread against the given drawing surface.
    pub fn spawn(surface: Arc<dyn Surface>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let shared = Arc::new(EngineShared::new());

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("script-worker".to_string())
            .spawn(move || worker_main(worker_shared, surface, event_tx))
            .expect("failed to spawn script worker thread");

        Self {
            shared,
            events: event_rx,
            worker: Some(worker),
        }
    }

    /// Queue a script for execution. Also clears pause/halt state left
    /// over from a previous run.
    pub fn submit(&self, script: impl Into<String>) {
        self.prepare_submit();
        self.shared.queue.push(Submission::Source(script.into()));
    }

    /// Queue a script file for execution. Loading happens on the worker;
    /// the finished/error reporting is identical to `submit`.
    pub fn submit_file(&self, path: impl Into<PathBuf>) {
        self.prepare_submit();
        self.shared.queue.push(Submission::File(path.into()));
    }

    fn prepare_submit(&self) {
        self.shared.control.reset();
        self.shared.sleep.reset();
    }

    /// Pause the running script at its next checkpoint. No effect when
    /// nothing is running.
    pub fn pause(&self) {
        self.shared.control.pause();
    }

    /// Resume a paused script.
    pub fn resume(&self) {
        self.shared.control.resume();
    }

    /// Abort the running script at its next checkpoint, releasing any
    /// sleep or blocked print first.
    pub fn halt(&self) {
        self.shared.halt();
    }

    /// Halt, then shut the worker down. Queued submissions are discarded
    /// without executing.
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        self.shared.halt();
        self.shared.queue.wake_all();
    }

    /// Block until the worker thread exits. Call after `request_stop`.
    pub fn join(mut self) {
        self.request_stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// Replace the module search path. Applied before the next run; the
    /// currently executing script is unaffected.
    pub fn set_require_paths(&self, paths: Vec<String>) {
        self.shared.paths.set(paths);
    }

    /// Append one module search path fragment.
    pub fn add_require_path(&self, path: impl Into<String>) {
        self.shared.paths.add(path.into());
    }

    /// Take the pending printed message, if any, unblocking the worker.
    pub fn consume_message(&self) -> Option<String> {
        self.shared.mailbox.consume()
    }

    /// Discard the pending printed message, unblocking the worker.
    pub fn clear_pending_message(&self) {
        self.shared.mailbox.clear()
    }

    pub fn message_pending(&self) -> bool {
        self.shared.mailbox.pending()
    }
}

impl Drop for ScriptRunner {
    fn drop(&mut self) {
        // The worker winds down on its own within one checkpoint interval;
        // no join here.
        self.request_stop();
    }
}

// ============================================================================
// Worker
// ============================================================================

fn worker_main(
    shared: Arc<EngineShared>,
    surface: Arc<dyn Surface>,
    events: mpsc::Sender<EngineEvent>,
) {
    let lua = match new_sandboxed_lua() {
        Ok(lua) => lua,
        Err(e) => {
            // Interpreter setup failure is fatal to the engine, not a
            // script error: report and die.
            let _ = events.send(EngineEvent::Error {
                message: format!("failed to create interpreter: {}", e),
            });
            return;
        }
    };

    let ctx = HostContext {
        shared: shared.clone(),
        surface,
        events: events.clone(),
    };
    if let Err(e) = register_host_functions(&lua, ctx) {
        let _ = events.send(EngineEvent::Error {
            message: format!("failed to register host functions: {}", e),
        });
        return;
    }

    // The instruction-count checkpoint catches scripts that never call a
    // host function.
    {
        let shared = shared.clone();
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(CHECKPOINT_INTERVAL),
            move |_lua, _debug| {
                shared.control.checkpoint()?;
                Ok(VmState::Continue)
            },
        );
    }

    log::debug!("script worker ready");

    while let Some(submission) = shared.queue.take(&shared.stop) {
        if let Some(path) = shared.paths.take_if_dirty() {
            if let Err(e) = set_package_path(&lua, &path) {
                log::warn!("failed to apply require paths: {}", e);
            }
        }

        let outcome = match submission {
            Submission::Source(text) => run_chunk(&lua, &text, "script"),
            Submission::File(path) => run_file(&lua, &path),
        };

        match outcome {
            Ok(()) => {
                let _ = events.send(EngineEvent::Finished { has_error: false });
            }
            Err(message) => {
                log::debug!("script failed: {}", message);
                let _ = events.send(EngineEvent::Error { message });
                let _ = events.send(EngineEvent::Finished { has_error: true });
            }
        }
    }

    log::debug!("script worker stopped");
}

/// Compile and run one chunk. Compilation and execution failures land on
/// the same reporting path, as one formatted message.
fn run_chunk(lua: &Lua, source: &str, name: &str) -> Result<(), String> {
    let function = lua
        .load(source)
        .set_name(name)
        .into_function()
        .map_err(|e| format_lua_error(&e))?;
    function.call::<()>(()).map_err(|e| format_lua_error(&e))
}

fn run_file(lua: &Lua, path: &Path) -> Result<(), String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let name = format!("@{}", path.display());
    run_chunk(lua, &source, &name)
}

// ============================================================================
// Tests
// ============================================================================
