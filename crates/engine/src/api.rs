//! Script-facing host functions.
//!
//! Each function is a closure over one shared [`HostContext`]; there is no
//! process-wide "current engine" lookup. Arguments arrive loosely typed
//! from Lua and are validated at this boundary with errors naming the
//! offending position and function, before anything touches the surface.
//!
//! Every function that performs a visible side effect (draw, print,
//! sleep, turtle state change) ends with a checkpoint, so pause and halt
//! are observed within one host call. Queries do not checkpoint.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use mlua::{Lua, MultiValue, Value};
use terrapin_canvas::{CapStyle, Color, Pen, Point, TurtleState};

use crate::events::EngineEvent;
use crate::runner::EngineShared;
use crate::runtime::lua_value_to_string;
use crate::surface::Surface;

/// Upper bound for one `sleep` call, in seconds (one year).
const MAX_SLEEP_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

/// Everything a host function needs from its owning engine instance.
pub(crate) struct HostContext {
    pub shared: Arc<EngineShared>,
    pub surface: Arc<dyn Surface>,
    pub events: mpsc::Sender<EngineEvent>,
}

impl HostContext {
    fn checkpoint(&self) -> mlua::Result<()> {
        self.shared.control.checkpoint()
    }
}

/// Register the full host function set as globals of the VM.
pub(crate) fn register_host_functions(lua: &Lua, ctx: HostContext) -> mlua::Result<()> {
    let ctx = Arc::new(ctx);
    let globals = lua.globals();

    {
        let ctx = ctx.clone();
        globals.set(
            "draw_line",
            lua.create_function(move |_, args: MultiValue| {
                let args: Vec<Value> = args.into_iter().collect();
                check_arity(&args, 10, "draw_line")?;
                let x1 = number_arg(&args, 1, "draw_line")?;
                let y1 = number_arg(&args, 2, "draw_line")?;
                let x2 = number_arg(&args, 3, "draw_line")?;
                let y2 = number_arg(&args, 4, "draw_line")?;
                let pen = pen_args(&args, 5, "draw_line")?;
                ctx.surface
                    .draw_line(Point::new(x1, y1), Point::new(x2, y2), pen);
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "draw_arc",
            lua.create_function(move |_, args: MultiValue| {
                let args: Vec<Value> = args.into_iter().collect();
                check_arity(&args, 12, "draw_arc")?;
                let cx = number_arg(&args, 1, "draw_arc")?;
                let cy = number_arg(&args, 2, "draw_arc")?;
                let start_angle = number_arg(&args, 3, "draw_arc")?;
                let sweep_angle = number_arg(&args, 4, "draw_arc")?;
                let x_radius = number_arg(&args, 5, "draw_arc")?;
                let y_radius = number_arg(&args, 6, "draw_arc")?;
                let pen = pen_args(&args, 7, "draw_arc")?;
                ctx.surface.draw_arc(
                    Point::new(cx, cy),
                    start_angle,
                    sweep_angle,
                    x_radius,
                    y_radius,
                    pen,
                );
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "clear",
            lua.create_function(move |_, _args: MultiValue| {
                ctx.surface.clear();
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "set_background_color",
            lua.create_function(move |_, args: MultiValue| {
                let args: Vec<Value> = args.into_iter().collect();
                check_arity(&args, 3, "set_background_color")?;
                let r = number_arg(&args, 1, "set_background_color")?;
                let g = number_arg(&args, 2, "set_background_color")?;
                let b = number_arg(&args, 3, "set_background_color")?;
                ctx.surface
                    .set_background_color(Color::from_clamped_opaque(r, g, b));
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "get_background_color",
            lua.create_function(move |_, _args: MultiValue| {
                let color = ctx.surface.background_color();
                Ok((color.r as i64, color.g as i64, color.b as i64))
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "set_turtle",
            lua.create_function(move |_, args: MultiValue| {
                let args: Vec<Value> = args.into_iter().collect();
                check_arity(&args, 7, "set_turtle")?;
                let x = number_arg(&args, 1, "set_turtle")?;
                let y = number_arg(&args, 2, "set_turtle")?;
                let heading = number_arg(&args, 3, "set_turtle")?;
                let r = number_arg(&args, 4, "set_turtle")?;
                let g = number_arg(&args, 5, "set_turtle")?;
                let b = number_arg(&args, 6, "set_turtle")?;
                let a = number_arg(&args, 7, "set_turtle")?;
                ctx.surface.set_turtle(TurtleState {
                    x,
                    y,
                    heading,
                    color: Color::from_clamped(r, g, b, a),
                });
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "get_turtle",
            lua.create_function(move |_, _args: MultiValue| {
                let turtle = ctx.surface.turtle();
                let c = turtle.color;
                Ok((
                    turtle.x,
                    turtle.y,
                    turtle.heading,
                    c.r as i64,
                    c.g as i64,
                    c.b as i64,
                    c.a as i64,
                ))
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "show_turtle",
            lua.create_function(move |_, _args: MultiValue| {
                ctx.surface.show_turtle();
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "hide_turtle",
            lua.create_function(move |_, _args: MultiValue| {
                ctx.surface.hide_turtle();
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "is_turtle_hidden",
            lua.create_function(move |_, _args: MultiValue| {
                Ok(ctx.surface.turtle_hidden())
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "print",
            lua.create_function(move |_, args: MultiValue| {
                let parts: Vec<String> =
                    args.into_iter().map(|v| lua_value_to_string(&v)).collect();
                let line = parts.join("\t");
                if ctx.shared.mailbox.post(line, &ctx.shared.control) {
                    let _ = ctx.events.send(EngineEvent::MessageAvailable);
                }
                ctx.checkpoint()
            })?,
        )?;
    }

    {
        let ctx = ctx.clone();
        globals.set(
            "sleep",
            lua.create_function(move |_, args: MultiValue| {
                let args: Vec<Value> = args.into_iter().collect();
                check_arity(&args, 1, "sleep")?;
                let seconds = number_arg(&args, 1, "sleep")?;
                if !seconds.is_finite() {
                    return Err(type_error(1, "sleep", "number"));
                }
                // Halt still releases long sleeps; the cap only keeps the
                // duration arithmetic in range.
                let duration = Duration::from_secs_f64(seconds.clamp(0.0, MAX_SLEEP_SECONDS));
                ctx.shared.sleep.sleep(duration, &ctx.shared.control);
                ctx.checkpoint()
            })?,
        )?;
    }

    Ok(())
}

// ============================================================================
// Argument marshalling
// ============================================================================

fn type_error(position: usize, func: &str, expected: &str) -> mlua::Error {
    mlua::Error::RuntimeError(format!(
        "argument {} to {} must be a {}",
        position, func, expected
    ))
}

fn check_arity(args: &[Value], expected: usize, func: &str) -> mlua::Result<()> {
    if args.len() < expected {
        return Err(mlua::Error::RuntimeError(format!(
            "too few arguments to {}",
            func
        )));
    }
    Ok(())
}

/// Read argument `position` (1-indexed) as a number, accepting Lua's
/// usual string-to-number coercion.
fn number_arg(args: &[Value], position: usize, func: &str) -> mlua::Result<f64> {
    match args.get(position - 1) {
        Some(Value::Integer(i)) => Ok(*i as f64),
        Some(Value::Number(n)) => Ok(*n),
        Some(Value::String(s)) => s
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or_else(|| type_error(position, func, "number")),
        _ => Err(type_error(position, func, "number")),
    }
}

/// Read argument `position` (1-indexed) as an integer. Floats with an
/// integral value are accepted.
fn integer_arg(args: &[Value], position: usize, func: &str) -> mlua::Result<i64> {
    match args.get(position - 1) {
        Some(Value::Integer(i)) => Ok(*i),
        Some(Value::Number(n)) if n.fract() == 0.0 => Ok(*n as i64),
        Some(Value::String(s)) => s
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| type_error(position, func, "integer")),
        _ => Err(type_error(position, func, "integer")),
    }
}

/// Read the five trailing pen arguments (r, g, b, a, width, cap style)
/// starting at `first` (1-indexed).
fn pen_args(args: &[Value], first: usize, func: &str) -> mlua::Result<Pen> {
    let r = number_arg(args, first, func)?;
    let g = number_arg(args, first + 1, func)?;
    let b = number_arg(args, first + 2, func)?;
    let a = number_arg(args, first + 3, func)?;
    let width = number_arg(args, first + 4, func)?;
    let cap = integer_arg(args, first + 5, func)?;
    Ok(Pen::new(
        Color::from_clamped(r, g, b, a),
        width,
        CapStyle::from_code(cap),
    ))
}
