//! The abstract 2D drawing device.
//!
//! The real canvas (an HTML5 2D context or similar) lives outside this
//! crate; the core only issues calls through the [`Canvas`] trait. Two
//! implementations ship here: [`RecordingCanvas`], which captures calls
//! into a [`DisplayList`] (also the entity buffering cache), and
//! [`PixelCanvas`], a minimal software rasterizer used as the reference
//! device in tests and headless rendering.

use crate::brush::{Brush, Color, Paint};
use crate::geometry::{Matrix, Rect};
use crate::shape::Shape;

/// An opaque 2D device with a save/restore transform stack.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    /// Multiply the current global alpha.
    fn apply_alpha(&mut self, alpha: f32);
    /// Intersect the current clip with the union of `rects`.
    fn clip_rects(&mut self, rects: &[Rect]);
    /// Reset pixels in `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect);
    /// Fill and stroke an axis-aligned rect with a brush.
    fn paint_rect(&mut self, rect: Rect, brush: &Brush);
    /// Fill and stroke an arbitrary shape with a brush.
    fn paint_shape(&mut self, shape: &Shape, brush: &Brush);
    /// Replay a recorded display list.
    fn draw_list(&mut self, list: &DisplayList);
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Save,
    Restore,
    Translate(f32, f32),
    Scale(f32, f32),
    Rotate(f32),
    ApplyAlpha(f32),
    ClipRects(Vec<Rect>),
    ClearRect(Rect),
    PaintRect(Rect, Brush),
    PaintShape(Shape, Brush),
}

/// An ordered sequence of device calls.
///
/// Buffered entities cache their contents as a display list and replay
/// it while clean instead of re-running their paint routine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    ops: Vec<CanvasOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    pub fn replay_onto(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                CanvasOp::Save => canvas.save(),
                CanvasOp::Restore => canvas.restore(),
                CanvasOp::Translate(x, y) => canvas.translate(*x, *y),
                CanvasOp::Scale(x, y) => canvas.scale(*x, *y),
                CanvasOp::Rotate(a) => canvas.rotate(*a),
                CanvasOp::ApplyAlpha(a) => canvas.apply_alpha(*a),
                CanvasOp::ClipRects(rects) => canvas.clip_rects(rects),
                CanvasOp::ClearRect(rect) => canvas.clear_rect(*rect),
                CanvasOp::PaintRect(rect, brush) => canvas.paint_rect(*rect, brush),
                CanvasOp::PaintShape(shape, brush) => canvas.paint_shape(shape, brush),
            }
        }
    }
}

/// Records every call for later replay or inspection.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    list: DisplayList,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_list(self) -> DisplayList {
        self.list
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.list.ops
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.list.ops.push(CanvasOp::Save);
    }

    fn restore(&mut self) {
        self.list.ops.push(CanvasOp::Restore);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.list.ops.push(CanvasOp::Translate(x, y));
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.list.ops.push(CanvasOp::Scale(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.list.ops.push(CanvasOp::Rotate(angle));
    }

    fn apply_alpha(&mut self, alpha: f32) {
        self.list.ops.push(CanvasOp::ApplyAlpha(alpha));
    }

    fn clip_rects(&mut self, rects: &[Rect]) {
        self.list.ops.push(CanvasOp::ClipRects(rects.to_vec()));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.list.ops.push(CanvasOp::ClearRect(rect));
    }

    fn paint_rect(&mut self, rect: Rect, brush: &Brush) {
        self.list.ops.push(CanvasOp::PaintRect(rect, brush.clone()));
    }

    fn paint_shape(&mut self, shape: &Shape, brush: &Brush) {
        self.list
            .ops
            .push(CanvasOp::PaintShape(shape.clone(), brush.clone()));
    }

    fn draw_list(&mut self, list: &DisplayList) {
        // Flatten rather than nest, so recorded lists stay self-contained.
        self.list.ops.extend(list.ops.iter().cloned());
    }
}

#[derive(Clone)]
struct RasterState {
    matrix: Matrix,
    alpha: f32,
    /// Each entry is a union of device-space rects; a pixel must fall
    /// inside every entry.
    clips: Vec<Vec<Rect>>,
}

/// A small software device over a straight-alpha pixel grid.
///
/// Supports the subset of the canvas model the core emits: affine
/// transforms, rect-union clips, solid and gradient fills, and rect
/// strokes. Shadows and non-rect strokes are not rasterized.
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    stack: Vec<RasterState>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width * height],
            stack: vec![RasterState {
                matrix: Matrix::identity(),
                alpha: 1.0,
                clips: Vec::new(),
            }],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn state(&self) -> &RasterState {
        self.stack.last().expect("state stack never empty")
    }

    fn state_mut(&mut self) -> &mut RasterState {
        self.stack.last_mut().expect("state stack never empty")
    }

    fn clip_allows(&self, x: f32, y: f32) -> bool {
        self.state()
            .clips
            .iter()
            .all(|union| union.iter().any(|r| r.contains(x, y)))
    }

    fn blend(&mut self, x: usize, y: usize, color: Color, alpha: f32) {
        let a = (color.a * alpha).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = &mut self.pixels[y * self.width + x];
        let out_a = a + dst.a * (1.0 - a);
        if out_a <= 0.0 {
            *dst = Color::TRANSPARENT;
            return;
        }
        dst.r = (color.r * a + dst.r * dst.a * (1.0 - a)) / out_a;
        dst.g = (color.g * a + dst.g * dst.a * (1.0 - a)) / out_a;
        dst.b = (color.b * a + dst.b * dst.a * (1.0 - a)) / out_a;
        dst.a = out_a;
    }

    fn pixel_range(&self, device_rect: Rect) -> (usize, usize, usize, usize) {
        let x0 = device_rect.x.floor().max(0.0) as usize;
        let y0 = device_rect.y.floor().max(0.0) as usize;
        let x1 = (device_rect.right().ceil().max(0.0) as usize).min(self.width);
        let y1 = (device_rect.bottom().ceil().max(0.0) as usize).min(self.height);
        (x0, y0, x1, y1)
    }

    fn fill_device_shape(&mut self, shape: &Shape, paint: &Paint, alpha: f32) {
        let (x0, y0, x1, y1) = self.pixel_range(shape.scope());
        // Gradient axis in device space.
        let gradient_axis = match paint {
            Paint::Gradient(g) => {
                let m = self.state().matrix;
                Some((m.transform_point(g.start), m.transform_point(g.end)))
            }
            Paint::Solid(_) => None,
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                if !shape.contains(cx, cy) || !self.clip_allows(cx, cy) {
                    continue;
                }
                let color = match paint {
                    Paint::Solid(c) => *c,
                    Paint::Gradient(g) => {
                        let (start, end) = gradient_axis.expect("axis set for gradients");
                        let dx = end.x - start.x;
                        let dy = end.y - start.y;
                        let len_sq = dx * dx + dy * dy;
                        let t = if len_sq > 0.0 {
                            ((cx - start.x) * dx + (cy - start.y) * dy) / len_sq
                        } else {
                            0.0
                        };
                        g.sample(t)
                    }
                };
                self.blend(px, py, color, alpha);
            }
        }
    }

    fn device_shape(&self, shape: &Shape) -> Shape {
        shape.transform(&self.state().matrix)
    }
}

impl Canvas for PixelCanvas {
    fn save(&mut self) {
        let top = self.state().clone();
        self.stack.push(top);
    }

    fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::warn!("PixelCanvas::restore() without matching save");
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state_mut().matrix.translate(x, y);
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.state_mut().matrix.scale(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        self.state_mut().matrix.rotate(angle);
    }

    fn apply_alpha(&mut self, alpha: f32) {
        self.state_mut().alpha *= alpha;
    }

    fn clip_rects(&mut self, rects: &[Rect]) {
        let matrix = self.state().matrix;
        let device: Vec<Rect> = rects.iter().map(|r| matrix.transform_rect(*r)).collect();
        self.state_mut().clips.push(device);
    }

    fn clear_rect(&mut self, rect: Rect) {
        let device = self.state().matrix.transform_rect(rect);
        let (x0, y0, x1, y1) = self.pixel_range(device);
        for py in y0..y1 {
            for px in x0..x1 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                if device.contains(cx, cy) && self.clip_allows(cx, cy) {
                    self.pixels[py * self.width + px] = Color::TRANSPARENT;
                }
            }
        }
    }

    fn paint_rect(&mut self, rect: Rect, brush: &Brush) {
        let alpha = self.state().alpha;
        let device = self.device_shape(&Shape::Rectangle(rect));
        if let Some(fill) = &brush.fill {
            self.fill_device_shape(&device, fill, alpha);
        }
        if let Some(stroke) = &brush.stroke {
            let hw = stroke.line_width / 2.0;
            let paint = Paint::Solid(stroke.color);
            // Four edge bands centered on the rect edges.
            let edges = [
                Rect::new(rect.x - hw, rect.y - hw, rect.width + hw * 2.0, hw * 2.0),
                Rect::new(
                    rect.x - hw,
                    rect.bottom() - hw,
                    rect.width + hw * 2.0,
                    hw * 2.0,
                ),
                Rect::new(rect.x - hw, rect.y + hw, hw * 2.0, rect.height - hw * 2.0),
                Rect::new(
                    rect.right() - hw,
                    rect.y + hw,
                    hw * 2.0,
                    rect.height - hw * 2.0,
                ),
            ];
            for edge in edges {
                let device_edge = self.device_shape(&Shape::Rectangle(edge));
                self.fill_device_shape(&device_edge, &paint, alpha);
            }
        }
    }

    fn paint_shape(&mut self, shape: &Shape, brush: &Brush) {
        if let Shape::Rectangle(rect) = shape {
            self.paint_rect(*rect, brush);
            return;
        }
        let alpha = self.state().alpha;
        let device = self.device_shape(shape);
        if let Some(fill) = &brush.fill {
            self.fill_device_shape(&device, fill, alpha);
        }
        if brush.stroke.is_some() {
            log::debug!("PixelCanvas: non-rect strokes are not rasterized");
        }
    }

    fn draw_list(&mut self, list: &DisplayList) {
        list.replay_onto(self);
    }
}
