//! Software raster canvas for turtle graphics.
//!
//! # Coordinate system
//!
//! Public drawing operations use a Cartesian system with the origin at the
//! center of the canvas: X grows as the pen moves right, Y grows as the pen
//! moves *up*. The canvas flips to its own top-left-origin pixel convention
//! internally, so callers never deal with buffer coordinates.
//!
//! The canvas is always square. `resize` keeps the drawing centered: content
//! at the origin is preserved, edges are cropped when shrinking and padded
//! when growing.
//!
//! # Threading
//!
//! All state lives behind one internal mutex; every public method may be
//! called concurrently from any thread (the script worker draws while a
//! presentation layer snapshots).
//!
//! The drawing layer is kept separate from the background color: `clear`
//! erases strokes but leaves the background, and `to_image` composites the
//! two unless asked for a transparent snapshot.

use std::sync::Mutex;

use crate::color::Color;
use crate::pen::{CapStyle, Pen};
use crate::turtle::TurtleState;

/// Default canvas edge length in pixels.
pub const DEFAULT_CANVAS_SIZE: i32 = 2048;

/// A point in canvas coordinates (origin at the center, Y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned pixel rectangle in buffer coordinates (top-left origin).
/// `x`/`y` are inclusive of the first covered pixel; `width`/`height` count
/// covered pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    fn from_bounds(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    fn union_pixel(&mut self, x: i32, y: i32) {
        let max_x = (self.x + self.width - 1).max(x);
        let max_y = (self.y + self.height - 1).max(y);
        self.x = self.x.min(x);
        self.y = self.y.min(y);
        self.width = max_x - self.x + 1;
        self.height = max_y - self.y + 1;
    }
}

/// An RGBA snapshot of the canvas, row-major from the top-left.
#[derive(Debug, Clone)]
pub struct CanvasImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CanvasImage {
    /// Color of the pixel at (x, y), top-left origin.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color::new(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }
}

struct CanvasState {
    /// Edge length in pixels; the canvas is square.
    size: i32,
    /// RGBA drawing layer, transparent where nothing was drawn.
    pixels: Vec<u8>,
    background: Color,
    turtle: TurtleState,
    turtle_hidden: bool,
    /// Bounding rectangle of everything drawn since the last clear.
    used: Option<Rect>,
}

impl CanvasState {
    fn new(size: i32) -> Self {
        let size = size.max(1);
        Self {
            size,
            pixels: vec![0; (size as usize) * (size as usize) * 4],
            background: Color::WHITE,
            turtle: TurtleState::default(),
            turtle_hidden: false,
            used: None,
        }
    }

    /// Map a canvas point (center origin, Y up) to buffer space (top-left
    /// origin, Y down).
    fn to_buffer(&self, p: Point) -> (f64, f64) {
        let half = self.size as f64 / 2.0;
        (half + p.x, half - p.y)
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.size || y >= self.size {
            return;
        }
        let idx = (y as usize * self.size as usize + x as usize) * 4;
        blend(&mut self.pixels[idx..idx + 4], color);
        if let Some(rect) = &mut self.used {
            rect.union_pixel(x, y);
        } else {
            self.used = Some(Rect::from_bounds(x, y, x, y));
        }
    }

    /// Stroke one segment given in buffer coordinates.
    fn stroke_segment(&mut self, ax: f64, ay: f64, bx: f64, by: f64, pen: Pen, cap: CapStyle) {
        let half_w = pen.effective_width() / 2.0;
        let dx = bx - ax;
        let dy = by - ay;
        let len = (dx * dx + dy * dy).sqrt();

        if len < 1e-9 {
            self.stroke_point(ax, ay, half_w, pen.color, cap);
            return;
        }

        let reach = half_w + 1.0;
        let x0 = ((ax.min(bx) - reach).floor() as i32).max(0);
        let y0 = ((ay.min(by) - reach).floor() as i32).max(0);
        let x1 = ((ax.max(bx) + reach).ceil() as i32).min(self.size - 1);
        let y1 = ((ay.max(by) + reach).ceil() as i32).min(self.size - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                // Position along the segment (in pixels) and perpendicular
                // distance from its infinite line.
                let t = ((cx - ax) * dx + (cy - ay) * dy) / len;
                let perp = ((cx - ax) * dy - (cy - ay) * dx).abs() / len;

                let covered = match cap {
                    CapStyle::Flat => perp <= half_w && t >= 0.0 && t <= len,
                    CapStyle::Square => perp <= half_w && t >= -half_w && t <= len + half_w,
                    CapStyle::Round => {
                        let dist = if t < 0.0 {
                            ((cx - ax).powi(2) + (cy - ay).powi(2)).sqrt()
                        } else if t > len {
                            ((cx - bx).powi(2) + (cy - by).powi(2)).sqrt()
                        } else {
                            perp
                        };
                        dist <= half_w
                    }
                };

                if covered {
                    self.blend_pixel(px, py, pen.color);
                }
            }
        }
    }

    /// Degenerate zero-length stroke: a disc for round caps, a square for
    /// square caps, nothing for flat caps.
    fn stroke_point(&mut self, x: f64, y: f64, half_w: f64, color: Color, cap: CapStyle) {
        if cap == CapStyle::Flat {
            return;
        }
        let x0 = ((x - half_w - 1.0).floor() as i32).max(0);
        let y0 = ((y - half_w - 1.0).floor() as i32).max(0);
        let x1 = ((x + half_w + 1.0).ceil() as i32).min(self.size - 1);
        let y1 = ((y + half_w + 1.0).ceil() as i32).min(self.size - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - x;
                let dy = py as f64 + 0.5 - y;
                let covered = match cap {
                    CapStyle::Round => (dx * dx + dy * dy).sqrt() <= half_w,
                    _ => dx.abs() <= half_w && dy.abs() <= half_w,
                };
                if covered {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }
}

/// Thread-safe turtle graphics canvas.
pub struct Canvas {
    state: Mutex<CanvasState>,
}

impl Canvas {
    pub fn new(size: i32) -> Self {
        Self {
            state: Mutex::new(CanvasState::new(size)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CanvasState> {
        // A panic while holding the canvas lock leaves nothing worth
        // preserving; recover the data and keep drawing.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current edge length in pixels.
    pub fn size(&self) -> i32 {
        self.lock().size
    }

    /// Stroke a line between two canvas points.
    pub fn draw_line(&self, from: Point, to: Point, pen: Pen) {
        let mut state = self.lock();
        let (ax, ay) = state.to_buffer(from);
        let (bx, by) = state.to_buffer(to);
        state.stroke_segment(ax, ay, bx, by, pen, pen.cap);
    }

    /// Stroke an elliptical arc.
    ///
    /// Angles are in degrees, counter-clockwise positive, with 0 at three
    /// o'clock. The arc is approximated by short segments with rounded
    /// joints; the pen's cap style shapes only degenerate (zero-sweep)
    /// arcs, which draw nothing.
    pub fn draw_arc(
        &self,
        center: Point,
        start_angle: f64,
        sweep_angle: f64,
        x_radius: f64,
        y_radius: f64,
        pen: Pen,
    ) {
        if sweep_angle == 0.0 {
            return;
        }
        let mut state = self.lock();

        let rx = x_radius.abs();
        let ry = y_radius.abs();
        let arc_px = sweep_angle.abs().to_radians() * rx.max(ry);
        let steps = (arc_px.ceil() as usize).clamp(8, 4096);

        let mut prev: Option<(f64, f64)> = None;
        for i in 0..=steps {
            let angle = (start_angle + sweep_angle * i as f64 / steps as f64).to_radians();
            let p = Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin());
            let (bx, by) = state.to_buffer(p);
            if let Some((px, py)) = prev {
                state.stroke_segment(px, py, bx, by, pen, CapStyle::Round);
            }
            prev = Some((bx, by));
        }
    }

    /// Erase the drawing layer and forget the used area. The background
    /// color and turtle state are untouched.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.pixels.fill(0);
        state.used = None;
    }

    /// Set the background color. The background is always opaque.
    pub fn set_background_color(&self, color: Color) {
        self.lock().background = color.to_opaque();
    }

    pub fn background_color(&self) -> Color {
        self.lock().background
    }

    /// Replace the turtle's position, heading and color. Visibility is not
    /// affected.
    pub fn set_turtle(&self, turtle: TurtleState) {
        self.lock().turtle = turtle;
    }

    pub fn turtle(&self) -> TurtleState {
        self.lock().turtle
    }

    pub fn show_turtle(&self) {
        self.lock().turtle_hidden = false;
    }

    pub fn hide_turtle(&self) {
        self.lock().turtle_hidden = true;
    }

    pub fn turtle_hidden(&self) -> bool {
        self.lock().turtle_hidden
    }

    /// Change the canvas size, keeping the drawing centered on the origin.
    pub fn resize(&self, new_size: i32) {
        let new_size = new_size.max(1);
        let mut state = self.lock();
        if new_size == state.size {
            return;
        }

        let old_size = state.size;
        let offset = (new_size - old_size) / 2;
        let mut pixels = vec![0u8; (new_size as usize) * (new_size as usize) * 4];

        for y in 0..old_size {
            let ny = y + offset;
            if ny < 0 || ny >= new_size {
                continue;
            }
            for x in 0..old_size {
                let nx = x + offset;
                if nx < 0 || nx >= new_size {
                    continue;
                }
                let src = (y as usize * old_size as usize + x as usize) * 4;
                let dst = (ny as usize * new_size as usize + nx as usize) * 4;
                pixels[dst..dst + 4].copy_from_slice(&state.pixels[src..src + 4]);
            }
        }

        state.used = state.used.and_then(|rect| {
            let min_x = (rect.x + offset).max(0);
            let min_y = (rect.y + offset).max(0);
            let max_x = (rect.x + rect.width - 1 + offset).min(new_size - 1);
            let max_y = (rect.y + rect.height - 1 + offset).min(new_size - 1);
            if min_x > max_x || min_y > max_y {
                None
            } else {
                Some(Rect::from_bounds(min_x, min_y, max_x, max_y))
            }
        });
        state.pixels = pixels;
        state.size = new_size;
    }

    /// Bounding rectangle of everything drawn since the last clear, in
    /// buffer coordinates. `None` when nothing has been drawn.
    pub fn used_rect(&self) -> Option<Rect> {
        self.lock().used
    }

    /// Snapshot the canvas.
    ///
    /// With `transparent_background` the drawing layer is copied as-is;
    /// otherwise it is composited over the opaque background color. With
    /// `fit_to_used_area` the snapshot is cropped to the used rectangle
    /// (full canvas when nothing was drawn).
    pub fn to_image(&self, transparent_background: bool, fit_to_used_area: bool) -> CanvasImage {
        let state = self.lock();
        let region = match (fit_to_used_area, state.used) {
            (true, Some(rect)) => rect,
            _ => Rect {
                x: 0,
                y: 0,
                width: state.size,
                height: state.size,
            },
        };

        let mut pixels = Vec::with_capacity((region.width as usize) * (region.height as usize) * 4);
        let bg = state.background;
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let idx = (y as usize * state.size as usize + x as usize) * 4;
                let src = &state.pixels[idx..idx + 4];
                if transparent_background {
                    pixels.extend_from_slice(src);
                } else {
                    let mut out = [bg.r, bg.g, bg.b, 255];
                    blend(
                        &mut out,
                        Color::new(src[0], src[1], src[2], src[3]),
                    );
                    pixels.extend_from_slice(&out);
                }
            }
        }

        CanvasImage {
            width: region.width as u32,
            height: region.height as u32,
            pixels,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE)
    }
}

/// Source-over blend of a straight-alpha color onto one RGBA pixel.
fn blend(dst: &mut [u8], src: Color) {
    let sa = src.a as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        dst[0] = src.r;
        dst[1] = src.g;
        dst[2] = src.b;
        dst[3] = 255;
        return;
    }
    let inv = 255 - sa;
    let da = dst[3] as u32;
    let out_a = sa + da * inv / 255;
    if out_a == 0 {
        dst.fill(0);
        return;
    }
    let blend_channel = |s: u8, d: u8| -> u8 {
        ((s as u32 * sa + d as u32 * da * inv / 255) / out_a) as u8
    };
    dst[0] = blend_channel(src.r, dst[0]);
    dst[1] = blend_channel(src.g, dst[1]);
    dst[2] = blend_channel(src.b, dst[2]);
    dst[3] = out_a as u8;
}
