//! Turtle cursor state.
//!
//! The canvas stores the turtle but never paints it; rendering the cursor
//! is the presentation layer's job. Visibility is tracked separately so
//! that moving the turtle does not implicitly show or hide it.

use crate::color::Color;

/// Position, heading and color of the turtle cursor.
///
/// Coordinates follow the canvas convention (origin at the center, Y up).
/// The heading is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub color: Color,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            color: Color::BLACK,
        }
    }
}
