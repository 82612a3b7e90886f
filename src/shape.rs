//! Geometric shapes used for painting and custom entity bounds.

use serde::{Deserialize, Serialize};

use crate::geometry::{Matrix, Point, Rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rect),
    Circle { center: Point, radius: f32 },
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub fn rectangle(x: f32, y: f32, width: f32, height: f32) -> Self {
        Shape::Rectangle(Rect::new(x, y, width, height))
    }

    pub fn circle(cx: f32, cy: f32, radius: f32) -> Self {
        Shape::Circle {
            center: Point::new(cx, cy),
            radius,
        }
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Shape::Polygon { points }
    }

    /// The shape's axis-aligned bounding rect.
    pub fn scope(&self) -> Rect {
        match self {
            Shape::Rectangle(rect) => *rect,
            Shape::Circle { center, radius } => Rect::new(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
            Shape::Polygon { points } => Rect::bounding(points),
        }
    }

    /// Boundary-inclusive point containment.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Rectangle(rect) => rect.contains(x, y),
            Shape::Circle { center, radius } => {
                let dx = x - center.x;
                let dy = y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            Shape::Polygon { points } => polygon_contains(points, x, y),
        }
    }

    /// The shape under an affine transform.
    ///
    /// Rectangles become polygons unless the matrix is the identity;
    /// circles stay circles with the radius scaled by the larger axis
    /// scale (an approximation, adequate for scope computation).
    pub fn transform(&self, matrix: &Matrix) -> Shape {
        if matrix.is_identity() {
            return self.clone();
        }
        match self {
            Shape::Rectangle(rect) => Shape::Polygon {
                points: vec![
                    matrix.transform_point(Point::new(rect.x, rect.y)),
                    matrix.transform_point(Point::new(rect.right(), rect.y)),
                    matrix.transform_point(Point::new(rect.right(), rect.bottom())),
                    matrix.transform_point(Point::new(rect.x, rect.bottom())),
                ],
            },
            Shape::Circle { center, radius } => {
                let sx = (matrix.a * matrix.a + matrix.b * matrix.b).sqrt();
                let sy = (matrix.c * matrix.c + matrix.d * matrix.d).sqrt();
                Shape::Circle {
                    center: matrix.transform_point(*center),
                    radius: radius * sx.max(sy),
                }
            }
            Shape::Polygon { points } => Shape::Polygon {
                points: points.iter().map(|p| matrix.transform_point(*p)).collect(),
            },
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Shape {
        match self {
            Shape::Rectangle(rect) => Shape::Rectangle(rect.translate(dx, dy)),
            Shape::Circle { center, radius } => Shape::Circle {
                center: Point::new(center.x + dx, center.y + dy),
                radius: *radius,
            },
            Shape::Polygon { points } => Shape::Polygon {
                points: points
                    .iter()
                    .map(|p| Point::new(p.x + dx, p.y + dy))
                    .collect(),
            },
        }
    }
}

/// Even-odd ray cast, with an on-edge tolerance so boundary points count
/// as inside.
fn polygon_contains(points: &[Point], x: f32, y: f32) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let pi = points[i];
        let pj = points[j];
        // Edge hit counts as containment.
        let cross = (pj.x - pi.x) * (y - pi.y) - (pj.y - pi.y) * (x - pi.x);
        let within_x = x >= pi.x.min(pj.x) && x <= pi.x.max(pj.x);
        let within_y = y >= pi.y.min(pj.y) && y <= pi.y.max(pj.y);
        if cross.abs() < 1e-6 && within_x && within_y {
            return true;
        }
        if (pi.y > y) != (pj.y > y) {
            let x_cross = (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_scope() {
        let c = Shape::circle(10.0, 10.0, 5.0);
        assert_eq!(c.scope(), Rect::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn test_circle_contains_boundary() {
        let c = Shape::circle(0.0, 0.0, 5.0);
        assert!(c.contains(5.0, 0.0));
        assert!(c.contains(3.0, 4.0));
        assert!(!c.contains(5.1, 0.0));
    }

    #[test]
    fn test_polygon_contains() {
        let tri = Shape::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(tri.contains(2.0, 2.0));
        assert!(tri.contains(0.0, 0.0));
        assert!(!tri.contains(8.0, 8.0));
    }

    #[test]
    fn test_rectangle_transform_to_polygon() {
        let mut m = Matrix::identity();
        m.translate(5.0, 0.0);
        let r = Shape::rectangle(0.0, 0.0, 10.0, 10.0).transform(&m);
        assert_eq!(r.scope(), Rect::new(5.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_identity_transform_is_clone() {
        let shape = Shape::rectangle(1.0, 2.0, 3.0, 4.0);
        assert_eq!(shape.transform(&Matrix::identity()), shape);
    }
}
