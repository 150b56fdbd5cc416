pub mod canvas;
pub mod color;
pub mod pen;
pub mod turtle;

pub use canvas::{Canvas, CanvasImage, Point, Rect, DEFAULT_CANVAS_SIZE};
pub use color::Color;
pub use pen::{CapStyle, Pen};
pub use turtle::TurtleState;
