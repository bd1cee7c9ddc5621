//! Planar geometry primitives used by the perception encoder.
//!
//! Angles are expressed in degrees and rotate counter-clockwise. A heading of
//! `0` faces `+y`, so the forward unit vector for heading `θ` is
//! `(-sin θ, cos θ)`.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point or vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `heading` degrees.
    #[must_use]
    pub fn from_heading(heading: f32) -> Self {
        let (x, y) = rotate_point(0.0, 1.0, 0.0, 0.0, heading);
        Self { x, y }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Rotate this point about `center` by `angle` degrees.
    #[must_use]
    pub fn rotated_about(self, center: Self, angle: f32) -> Self {
        let (x, y) = rotate_point(self.x, self.y, center.x, center.y, angle);
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Rotate `(x, y)` about `(cx, cy)` by `angle_degrees`.
#[must_use]
pub fn rotate_point(x: f32, y: f32, cx: f32, cy: f32, angle_degrees: f32) -> (f32, f32) {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let dx = x - cx;
    let dy = y - cy;
    (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
}

/// Even-odd ray-casting test.
///
/// Works for any simple polygon, including rotated quadrilaterals. Points
/// exactly on an edge are classified by the half-open comparison on `y`,
/// which keeps shared edges from being counted twice.
#[must_use]
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let crossing_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
