// Terrapin CLI - headless turtle graphics script runner
//
// Submits Lua scripts to the engine worker, streams printed messages to
// stdout and script errors to stderr, and exits non-zero when a script
// fails. This binary is the controller side of the engine: it owns the
// event pump and always drains pending messages (the single-slot output
// mailbox requires a live consumer).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use terrapin_canvas::Canvas;
use terrapin_config::Settings;
use terrapin_engine::{EngineEvent, ScriptRunner};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_SCRIPT_ERROR: u8 = 1;
// Exit code 2 is reserved: clap emits it on usage errors.
pub const EXIT_IO_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "terrapin")]
#[command(about = "Turtle graphics scripting (headless mode)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more Lua script files
    #[command(after_help = "\
Examples:
  terrapin run spiral.lua
  terrapin run setup.lua spiral.lua --canvas-size 512
  terrapin run demo.lua --require-path ~/turtle-libs")]
    Run {
        /// Script files to execute, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: EngineOptions,
    },

    /// Run an inline chunk of Lua
    #[command(after_help = "\
Examples:
  terrapin eval 'draw_line(0, 0, 100, 100, 255, 0, 0, 255, 2, 1)'
  terrapin eval 'print(get_background_color())'")]
    Eval {
        /// Lua source text
        code: String,

        #[command(flatten)]
        options: EngineOptions,
    },
}

#[derive(Args)]
struct EngineOptions {
    /// Additional Lua module search path (a directory or a ?.lua
    /// pattern); repeatable
    #[arg(long = "require-path", value_name = "PATH")]
    require_paths: Vec<String>,

    /// Canvas edge length in pixels (overrides settings)
    #[arg(long, value_name = "N")]
    canvas_size: Option<i32>,

    /// Skip the startup scripts listed in the settings file
    #[arg(long)]
    no_startup: bool,

    /// Suppress script print() output
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { files, options } => cmd_run(files, &options),
        Commands::Eval { code, options } => cmd_eval(code, &options),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(err.code)
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_run(files: Vec<PathBuf>, options: &EngineOptions) -> Result<(), CliError> {
    for file in &files {
        if !file.exists() {
            return Err(CliError::io(format!("file not found: {}", file.display())));
        }
    }

    let session = Session::start(options);
    let mut failed = session.run_startup_scripts(options)?;

    for file in &files {
        session.runner.submit_file(file);
        failed |= session.pump_one()?;
    }

    session.finish(failed)
}

fn cmd_eval(code: String, options: &EngineOptions) -> Result<(), CliError> {
    let session = Session::start(options);
    let mut failed = session.run_startup_scripts(options)?;

    session.runner.submit(code);
    failed |= session.pump_one()?;

    session.finish(failed)
}

// ============================================================================
// Engine session
// ============================================================================

struct Session {
    runner: ScriptRunner,
    settings: Settings,
    show_output: bool,
    show_errors: bool,
}

impl Session {
    fn start(options: &EngineOptions) -> Self {
        let settings = Settings::load();

        let size = options.canvas_size.unwrap_or(settings.canvas.size);
        let canvas = Arc::new(Canvas::new(size));
        let runner = ScriptRunner::spawn(canvas);

        let mut paths: Vec<String> = settings.require_paths.clone();
        paths.extend(options.require_paths.iter().map(|p| normalize_require_path(p)));
        if !paths.is_empty() {
            runner.set_require_paths(paths);
        }

        let show_output = settings.messages.auto_show_output && !options.quiet;
        let show_errors = settings.messages.auto_show_errors;
        Self {
            runner,
            settings,
            show_output,
            show_errors,
        }
    }

    fn run_startup_scripts(&self, options: &EngineOptions) -> Result<bool, CliError> {
        let mut failed = false;
        if options.no_startup {
            return Ok(failed);
        }
        for script in &self.settings.startup_scripts {
            log::debug!("running startup script {}", script);
            self.runner.submit_file(script.clone());
            failed |= self.pump_one()?;
        }
        Ok(failed)
    }

    /// Drive the event pump until the current submission finishes.
    /// Returns whether it finished with an error.
    fn pump_one(&self) -> Result<bool, CliError> {
        loop {
            match self.runner.events.recv() {
                Ok(EngineEvent::MessageAvailable) => {
                    // Always drain, even when not displaying: an undrained
                    // mailbox blocks the worker's next print.
                    if let Some(message) = self.runner.consume_message() {
                        if self.show_output {
                            println!("{}", message);
                        }
                    }
                }
                Ok(EngineEvent::Error { message }) => {
                    if self.show_errors {
                        eprintln!("script error: {}", message);
                    }
                }
                Ok(EngineEvent::Finished { has_error }) => return Ok(has_error),
                Err(mpsc::RecvError) => {
                    return Err(CliError::engine("engine worker terminated unexpectedly"))
                }
            }
        }
    }

    fn finish(self, failed: bool) -> Result<(), CliError> {
        self.runner.join();
        if failed {
            Err(CliError::script("one or more scripts reported errors"))
        } else {
            Ok(())
        }
    }
}

/// Accept either a ready-made Lua search pattern or a plain directory,
/// turning the latter into `<dir>/?.lua`.
fn normalize_require_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.contains('?') {
        trimmed.to_string()
    } else {
        format!("{}/?.lua", trimmed.trim_end_matches('/'))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_IO_ERROR,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_SCRIPT_ERROR,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_SCRIPT_ERROR,
            message: msg.into(),
            hint: Some("run with RUST_LOG=debug for engine logs".to_string()),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
