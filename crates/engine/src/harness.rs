//! Test-only recording surface.

use parking_lot::Mutex;
use terrapin_canvas::{CanvasImage, Color, Pen, Point, Rect, TurtleState};

use crate::surface::Surface;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Line { from: Point, to: Point, pen: Pen },
    Arc {
        center: Point,
        start_angle: f64,
        sweep_angle: f64,
        x_radius: f64,
        y_radius: f64,
        pen: Pen,
    },
    Clear,
    SetBackground(Color),
    SetTurtle(TurtleState),
    ShowTurtle,
    HideTurtle,
    Resize(i32),
}

/// Surface mock that records every call instead of rasterizing.
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    background: Mutex<Color>,
    turtle: Mutex<TurtleState>,
    hidden: Mutex<bool>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            background: Mutex::new(Color::WHITE),
            turtle: Mutex::new(TurtleState::default()),
            hidden: Mutex::new(false),
        }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn line_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Line { .. }))
            .count()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().push(call);
    }
}

impl Surface for RecordingSurface {
    fn draw_line(&self, from: Point, to: Point, pen: Pen) {
        self.record(SurfaceCall::Line { from, to, pen });
    }

    fn draw_arc(
        &self,
        center: Point,
        start_angle: f64,
        sweep_angle: f64,
        x_radius: f64,
        y_radius: f64,
        pen: Pen,
    ) {
        self.record(SurfaceCall::Arc {
            center,
            start_angle,
            sweep_angle,
            x_radius,
            y_radius,
            pen,
        });
    }

    fn clear(&self) {
        self.record(SurfaceCall::Clear);
    }

    fn set_background_color(&self, color: Color) {
        *self.background.lock() = color.to_opaque();
        self.record(SurfaceCall::SetBackground(color.to_opaque()));
    }

    fn background_color(&self) -> Color {
        *self.background.lock()
    }

    fn set_turtle(&self, turtle: TurtleState) {
        *self.turtle.lock() = turtle;
        self.record(SurfaceCall::SetTurtle(turtle));
    }

    fn turtle(&self) -> TurtleState {
        *self.turtle.lock()
    }

    fn show_turtle(&self) {
        *self.hidden.lock() = false;
        self.record(SurfaceCall::ShowTurtle);
    }

    fn hide_turtle(&self) {
        *self.hidden.lock() = true;
        self.record(SurfaceCall::HideTurtle);
    }

    fn turtle_hidden(&self) -> bool {
        *self.hidden.lock()
    }

    fn resize(&self, size: i32) {
        self.record(SurfaceCall::Resize(size));
    }

    fn used_rect(&self) -> Option<Rect> {
        None
    }

    fn to_image(&self, _transparent_background: bool, _fit_to_used_area: bool) -> CanvasImage {
        CanvasImage {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }
}
