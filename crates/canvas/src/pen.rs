//! Pen description used by the stroking operations.

use crate::color::Color;

/// How the ends of a stroked line are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapStyle {
    /// The stroke extends half the pen width past each endpoint.
    #[default]
    Square,
    /// The stroke stops exactly at the endpoint.
    Flat,
    /// A half-disc is drawn around each endpoint.
    Round,
}

impl CapStyle {
    /// Map the script-facing cap-style code to a style.
    ///
    /// 1 is square, 2 is flat, 3 is round; anything else falls back to
    /// square.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => CapStyle::Flat,
            3 => CapStyle::Round,
            _ => CapStyle::Square,
        }
    }
}

/// A stroking pen: color, width in pixels, cap style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    pub cap: CapStyle,
}

impl Pen {
    pub fn new(color: Color, width: f64, cap: CapStyle) -> Self {
        Self { color, width, cap }
    }

    /// Effective stroke width. Zero and negative widths draw a one pixel
    /// hairline.
    pub(crate) fn effective_width(&self) -> f64 {
        if self.width > 0.0 { self.width } else { 1.0 }
    }
}
