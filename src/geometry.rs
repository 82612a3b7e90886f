//! Geometric value types: points, sizes, rectangles, and 2D affine matrices.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::zero()
    }
}

/// An axis-aligned rectangle.
///
/// Used both for entity frames (untransformed local rects) and for
/// scopes and damaged regions in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Grow the rect outward by `amount` on every side.
    pub fn outset(&self, amount: f32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }

    /// The smallest rect covering both `self` and `other`.
    pub fn include(&self, other: Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Boundary-inclusive containment on all four edges.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// The bounding rect of a set of points. Empty input gives a zero rect.
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Rect::default();
        };
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// A 2D affine transform in row-major `[a c e; b d f]` form, matching the
/// canvas `transform(a, b, c, d, e, f)` convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Post-multiply by another matrix: `self = self * other`.
    pub fn multiply(&mut self, o: &Matrix) {
        let a = self.a * o.a + self.c * o.b;
        let b = self.b * o.a + self.d * o.b;
        let c = self.a * o.c + self.c * o.d;
        let d = self.b * o.c + self.d * o.d;
        let e = self.a * o.e + self.c * o.f + self.e;
        let f = self.b * o.e + self.d * o.f + self.f;
        *self = Self { a, b, c, d, e, f };
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.multiply(&Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: x,
            f: y,
        });
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.multiply(&Matrix {
            a: x,
            b: 0.0,
            c: 0.0,
            d: y,
            e: 0.0,
            f: 0.0,
        });
    }

    pub fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        self.multiply(&Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        });
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Transform a point by the inverse of this matrix.
    /// Returns the point unchanged when the matrix is singular.
    pub fn inverse_transform_point(&self, p: Point) -> Point {
        let det = self.determinant();
        if det == 0.0 {
            return p;
        }
        let x = p.x - self.e;
        let y = p.y - self.f;
        Point::new(
            (self.d * x - self.c * y) / det,
            (self.a * y - self.b * x) / det,
        )
    }

    /// The axis-aligned bounding rect of `rect` under this transform.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        let corners = [
            self.transform_point(Point::new(rect.x, rect.y)),
            self.transform_point(Point::new(rect.right(), rect.y)),
            self.transform_point(Point::new(rect.right(), rect.bottom())),
            self.transform_point(Point::new(rect.x, rect.bottom())),
        ];
        Rect::bounding(&corners)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_include() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        let u = a.include(b);
        assert_eq!(u, Rect::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(20.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn test_rect_contains_boundary_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(5.0, 10.0));
        assert!(!r.contains(10.1, 5.0));
        assert!(!r.contains(-0.1, 5.0));
    }

    #[test]
    fn test_rect_outset() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).outset(2.0);
        assert_eq!(r, Rect::new(8.0, 8.0, 24.0, 24.0));
    }

    #[test]
    fn test_matrix_translate_then_scale() {
        let mut m = Matrix::identity();
        m.translate(10.0, 5.0);
        m.scale(2.0, 2.0);
        let p = m.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 7.0));
    }

    #[test]
    fn test_matrix_rotate_quarter_turn() {
        let mut m = Matrix::identity();
        m.rotate(std::f32::consts::FRAC_PI_2);
        let p = m.transform_point(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_inverse_round_trip() {
        let mut m = Matrix::identity();
        m.translate(3.0, 4.0);
        m.rotate(0.7);
        m.scale(2.0, 3.0);
        let p = Point::new(5.0, -2.0);
        let q = m.inverse_transform_point(m.transform_point(p));
        assert!((q.x - p.x).abs() < 1e-4);
        assert!((q.y - p.y).abs() < 1e-4);
    }

    #[test]
    fn test_transform_rect_is_bounding() {
        let mut m = Matrix::identity();
        m.rotate(std::f32::consts::FRAC_PI_4);
        let r = m.transform_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let diag = 10.0 * std::f32::consts::SQRT_2;
        assert!((r.width - diag).abs() < 1e-4);
        assert!((r.height - diag).abs() < 1e-4);
    }
}
