//! UI-space layout data attached next to a [`Transform`](super::transform::Transform).
//!
//! An actor spawned with a rect transform derives the X/Y of its local
//! position from anchors, pivot, size delta and anchored position, relative to
//! the parent's rect (or the viewport when the parent has no rect). The derived
//! position is written into the transform right before its local-to-world
//! matrix is recomputed; Z is left alone.
//!
//! Conventions: bottom-left origin, y up. A node's local rect is expressed
//! relative to its own pivot, so a child's anchors resolve directly in the
//! parent's local space.

use bevy_ecs::prelude::*;

use crate::math::{Rect, Vec2};

/// Anchor/pivot layout for a UI node.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct RectTransform {
    pub(crate) anchor_min: Vec2,
    pub(crate) anchor_max: Vec2,
    pub(crate) pivot: Vec2,
    pub(crate) anchored_position: Vec2,
    pub(crate) size_delta: Vec2,
    pub(crate) pixel_perfect: bool,
}

impl Default for RectTransform {
    fn default() -> Self {
        Self {
            anchor_min: Vec2::splat(0.5),
            anchor_max: Vec2::splat(0.5),
            pivot: Vec2::splat(0.5),
            anchored_position: Vec2::ZERO,
            size_delta: Vec2::splat(100.0),
            pixel_perfect: false,
        }
    }
}

impl RectTransform {
    /// A rect stretched over its whole parent, pivot at the bottom-left corner.
    pub fn stretched() -> Self {
        Self {
            anchor_min: Vec2::ZERO,
            anchor_max: Vec2::ONE,
            pivot: Vec2::ZERO,
            size_delta: Vec2::ZERO,
            ..Default::default()
        }
    }

    pub fn with_anchors(mut self, min: Vec2, max: Vec2) -> Self {
        self.anchor_min = min;
        self.anchor_max = max;
        self
    }

    pub fn with_pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_size_delta(mut self, size_delta: Vec2) -> Self {
        self.size_delta = size_delta;
        self
    }

    pub fn with_anchored_position(mut self, anchored_position: Vec2) -> Self {
        self.anchored_position = anchored_position;
        self
    }

    pub fn anchor_min(&self) -> Vec2 {
        self.anchor_min
    }

    pub fn anchor_max(&self) -> Vec2 {
        self.anchor_max
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn anchored_position(&self) -> Vec2 {
        self.anchored_position
    }

    pub fn size_delta(&self) -> Vec2 {
        self.size_delta
    }

    pub fn pixel_perfect(&self) -> bool {
        self.pixel_perfect
    }

    /// Resolve this node against `parent_rect`.
    ///
    /// Returns the derived local position (pivot location in the parent's
    /// space) and the node's own rect relative to that pivot.
    pub fn layout(&self, parent_rect: Rect) -> (Vec2, Rect) {
        let anchor_min = parent_rect.point_at(self.anchor_min);
        let anchor_max = parent_rect.point_at(self.anchor_max);
        let anchor_span = anchor_max - anchor_min;

        let size = anchor_span + self.size_delta;
        let min = -(size * self.pivot);
        let mut position = anchor_min + anchor_span * self.pivot + self.anchored_position;
        let mut rect = Rect::new(min.x, min.y, size.x, size.y);

        if self.pixel_perfect {
            position = position.floor();
            rect = Rect::new(
                rect.x.floor(),
                rect.y.floor(),
                rect.width.round(),
                rect.height.round(),
            );
        }
        (position, rect)
    }
}
