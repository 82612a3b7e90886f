//! Styling components: colors, gradients, and brushes.
//!
//! Brushes are dependency nodes: one brush may be shared by many
//! entities, and mutating it through the stage fans a STYLE/BACKGROUND
//! dirty out to every attached entity.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// A linear gradient between two points in entity-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub start: Point,
    pub end: Point,
    /// `(offset in 0..=1, color)`, ordered by offset.
    pub stops: Vec<(f32, Color)>,
}

impl Gradient {
    pub fn linear(start: Point, end: Point, from: Color, to: Color) -> Self {
        Self {
            start,
            end,
            stops: vec![(0.0, from), (1.0, to)],
        }
    }

    pub fn add_stop(mut self, offset: f32, color: Color) -> Self {
        let at = self
            .stops
            .iter()
            .position(|(o, _)| *o > offset)
            .unwrap_or(self.stops.len());
        self.stops.insert(at, (offset, color));
        self
    }

    /// Sample the gradient at `t` along the start-end axis.
    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Color::TRANSPARENT;
        };
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let f = if o1 > o0 { (t - o0) / (o1 - o0) } else { 1.0 };
                return Color::rgba(
                    c0.r + (c1.r - c0.r) * f,
                    c0.g + (c1.g - c0.g) * f,
                    c0.b + (c1.b - c0.b) * f,
                    c0.a + (c1.a - c0.a) * f,
                );
            }
        }
        self.stops.last().map(|(_, c)| *c).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub line_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub x: f32,
    pub y: f32,
    pub blur: f32,
    pub color: Color,
}

/// Fill, stroke, and shadow styling for an entity or shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Brush {
    pub fill: Option<Paint>,
    pub stroke: Option<Stroke>,
    pub shadow: Option<Shadow>,
}

impl Brush {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(Paint::Solid(color)),
            stroke: None,
            shadow: None,
        }
    }

    pub fn gradient(gradient: Gradient) -> Self {
        Self {
            fill: Some(Paint::Gradient(gradient)),
            stroke: None,
            shadow: None,
        }
    }

    pub fn with_stroke(mut self, color: Color, line_width: f32) -> Self {
        self.stroke = Some(Stroke { color, line_width });
        self
    }

    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill = Some(Paint::Solid(color));
    }

    /// How far the painted output extends past the geometry, from stroke
    /// width and shadow reach. Used when computing entity scopes.
    pub fn scope_padding(&self) -> f32 {
        let stroke = self.stroke.as_ref().map_or(0.0, |s| s.line_width / 2.0);
        let shadow = self
            .shadow
            .map_or(0.0, |s| s.x.abs().max(s.y.abs()) + s.blur);
        stroke.max(shadow)
    }
}
