//! Math primitives shared by the transform hierarchy and UI layout.
//!
//! Vectors, quaternions and matrices come from [`glam`]. This module adds the
//! [`Rect`] value type used by [`RectTransform`](crate::components::recttransform::RectTransform)
//! layout, and the fallbacks used when an operation would otherwise produce NaN
//! (zero-length quaternions, singular matrices, zero scale components).

pub use glam::{Mat4, Quat, Vec2, Vec3};

/// Tolerance used for degenerate-input checks.
pub const EPSILON: f32 = 1e-6;

/// Coordinate frame used by relative transform operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Space {
    /// Relative to the node's own axes.
    #[default]
    Local,
    /// Relative to world axes.
    World,
}

/// Axis-aligned 2D rectangle, bottom-left origin, y up.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rect from two opposite corners in any order.
    pub fn from_min_max(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.point_at(Vec2::splat(0.5))
    }

    /// Point inside the rect at normalized coordinates (0,0 = min, 1,1 = max).
    pub fn point_at(&self, normalized: Vec2) -> Vec2 {
        self.min() + self.size() * normalized
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Normalize a quaternion, or return identity when its length is ~0.
pub fn normalize_or_identity(q: Quat) -> Quat {
    let len_sq = q.length_squared();
    if len_sq < EPSILON {
        Quat::IDENTITY
    } else {
        q * len_sq.sqrt().recip()
    }
}

/// Invert a matrix, or return identity when it is singular.
pub fn inverse_or_identity(m: Mat4) -> Mat4 {
    if m.determinant().abs() < EPSILON {
        Mat4::IDENTITY
    } else {
        m.inverse()
    }
}

/// Component-wise division that yields 0 where the divisor is ~0.
pub fn safe_div(a: Vec3, b: Vec3) -> Vec3 {
    let div = |n: f32, d: f32| if d.abs() < EPSILON { 0.0 } else { n / d };
    Vec3::new(div(a.x, b.x), div(a.y, b.y), div(a.z, b.z))
}
