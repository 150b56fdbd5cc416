//! The drawing surface interface consumed by the host functions.
//!
//! The engine talks to a trait, never to a concrete canvas: the surface
//! is an external collaborator expected to carry its own internal
//! synchronization (the engine never assumes exclusive access).
//!
//! Coordinates cross this boundary in the script convention: origin at
//! the surface's center, Y increasing upward. Flipping to a top-left
//! pixel convention is the surface's responsibility.

use terrapin_canvas::{Canvas, CanvasImage, Color, Pen, Point, Rect, TurtleState};

pub trait Surface: Send + Sync {
    fn draw_line(&self, from: Point, to: Point, pen: Pen);
    fn draw_arc(
        &self,
        center: Point,
        start_angle: f64,
        sweep_angle: f64,
        x_radius: f64,
        y_radius: f64,
        pen: Pen,
    );
    fn clear(&self);
    fn set_background_color(&self, color: Color);
    fn background_color(&self) -> Color;
    fn set_turtle(&self, turtle: TurtleState);
    fn turtle(&self) -> TurtleState;
    fn show_turtle(&self);
    fn hide_turtle(&self);
    fn turtle_hidden(&self) -> bool;
    fn resize(&self, size: i32);
    fn used_rect(&self) -> Option<Rect>;
    fn to_image(&self, transparent_background: bool, fit_to_used_area: bool) -> CanvasImage;
}

impl Surface for Canvas {
    fn draw_line(&self, from: Point, to: Point, pen: Pen) {
        Canvas::draw_line(self, from, to, pen)
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
        Canvas::draw_arc(self, center, start_angle, sweep_angle, x_radius, y_radius, pen)
    }

    fn clear(&self) {
        Canvas::clear(self)
    }

    fn set_background_color(&self, color: Color) {
        Canvas::set_background_color(self, color)
    }

    fn background_color(&self) -> Color {
        Canvas::background_color(self)
    }

    fn set_turtle(&self, turtle: TurtleState) {
        Canvas::set_turtle(self, turtle)
    }

    fn turtle(&self) -> TurtleState {
        Canvas::turtle(self)
    }

    fn show_turtle(&self) {
        Canvas::show_turtle(self)
    }

    fn hide_turtle(&self) {
        Canvas::hide_turtle(self)
    }

    fn turtle_hidden(&self) -> bool {
        Canvas::turtle_hidden(self)
    }

    fn resize(&self, size: i32) {
        Canvas::resize(self, size)
    }

    fn used_rect(&self) -> Option<Rect> {
        Canvas::used_rect(self)
    }

    fn to_image(&self, transparent_background: bool, fit_to_used_area: bool) -> CanvasImage {
        Canvas::to_image(self, transparent_background, fit_to_used_area)
    }
}
