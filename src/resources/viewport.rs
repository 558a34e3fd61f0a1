//! Viewport size resource.
//!
//! Root rect transforms (no rect-transform parent) lay themselves out against
//! this rectangle. Change it through
//! [`RectTransformOps::set_viewport_size`](crate::scene::rect_ops::RectTransformOps::set_viewport_size)
//! so that cached layouts are invalidated.

use bevy_ecs::prelude::Resource;

use crate::math::Rect;

/// Current viewport size in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl Viewport {
    /// The viewport as a rect anchored at the origin.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.w as f32, self.h as f32)
    }
}
