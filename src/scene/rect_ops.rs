//! Rect-transform layout operations on the ECS [`World`].
//!
//! A node's rect depends on its parent's rect, all the way up to the first
//! ancestor without a [`RectTransform`], which lays out against the
//! [`Viewport`]. Rects are cheap to derive and are not cached; only the
//! resulting world matrix is.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::recttransform::RectTransform;
use crate::components::transform::Transform;
use crate::math::{Rect, Vec2};
use crate::resources::viewport::Viewport;
use crate::scene::transform_ops::TransformOps;

pub trait RectTransformOps {
    fn rect_transform(&self, entity: Entity) -> Option<&RectTransform>;

    fn set_anchor(&mut self, entity: Entity, anchor: Vec2);
    fn set_anchor_min(&mut self, entity: Entity, anchor_min: Vec2);
    fn set_anchor_max(&mut self, entity: Entity, anchor_max: Vec2);
    fn set_pivot(&mut self, entity: Entity, pivot: Vec2);
    fn set_anchored_position(&mut self, entity: Entity, anchored_position: Vec2);
    fn set_size_delta(&mut self, entity: Entity, size_delta: Vec2);
    fn set_size_delta_x(&mut self, entity: Entity, x: f32);
    fn set_size_delta_y(&mut self, entity: Entity, y: f32);
    fn set_pixel_perfect(&mut self, entity: Entity, pixel_perfect: bool);

    /// Rect the node lays out against: the parent's rect, or the viewport.
    fn parent_rect(&self, entity: Entity) -> Rect;
    /// Local-space rect, relative to the node's pivot.
    fn rect(&self, entity: Entity) -> Option<Rect>;
    /// Local position derived from the layout (pivot location in parent space).
    fn derived_local_position(&self, entity: Entity) -> Option<Vec2>;
    /// The local rect's corners carried into world space.
    fn world_rect(&mut self, entity: Entity) -> Option<Rect>;
    fn rect_contains_world_point(&mut self, entity: Entity, point: Vec2) -> bool;

    fn set_viewport_size(&mut self, w: i32, h: i32);
}

fn modify_rect(world: &mut World, entity: Entity, op: &str, f: impl FnOnce(&mut RectTransform)) {
    match world.get_mut::<RectTransform>(entity) {
        Some(mut rt) => f(&mut *rt),
        None => {
            warn!("{}: {:?} has no rect transform", op, entity);
            return;
        }
    }
    world.invalidate_transform(entity);
}

impl RectTransformOps for World {
    fn rect_transform(&self, entity: Entity) -> Option<&RectTransform> {
        self.get::<RectTransform>(entity)
    }

    fn set_anchor(&mut self, entity: Entity, anchor: Vec2) {
        modify_rect(self, entity, "set_anchor", |rt| {
            rt.anchor_min = anchor;
            rt.anchor_max = anchor;
        });
    }

    fn set_anchor_min(&mut self, entity: Entity, anchor_min: Vec2) {
        modify_rect(self, entity, "set_anchor_min", |rt| rt.anchor_min = anchor_min);
    }

    fn set_anchor_max(&mut self, entity: Entity, anchor_max: Vec2) {
        modify_rect(self, entity, "set_anchor_max", |rt| rt.anchor_max = anchor_max);
    }

    fn set_pivot(&mut self, entity: Entity, pivot: Vec2) {
        modify_rect(self, entity, "set_pivot", |rt| rt.pivot = pivot);
    }

    fn set_anchored_position(&mut self, entity: Entity, anchored_position: Vec2) {
        modify_rect(self, entity, "set_anchored_position", |rt| {
            rt.anchored_position = anchored_position;
        });
    }

    fn set_size_delta(&mut self, entity: Entity, size_delta: Vec2) {
        modify_rect(self, entity, "set_size_delta", |rt| rt.size_delta = size_delta);
    }

    fn set_size_delta_x(&mut self, entity: Entity, x: f32) {
        modify_rect(self, entity, "set_size_delta_x", |rt| rt.size_delta.x = x);
    }

    fn set_size_delta_y(&mut self, entity: Entity, y: f32) {
        modify_rect(self, entity, "set_size_delta_y", |rt| rt.size_delta.y = y);
    }

    fn set_pixel_perfect(&mut self, entity: Entity, pixel_perfect: bool) {
        modify_rect(self, entity, "set_pixel_perfect", |rt| {
            rt.pixel_perfect = pixel_perfect;
        });
    }

    fn parent_rect(&self, entity: Entity) -> Rect {
        let parent = self.get::<Transform>(entity).and_then(|t| t.parent);
        match parent.and_then(|p| self.rect(p)) {
            Some(rect) => rect,
            None => self
                .get_resource::<Viewport>()
                .map(Viewport::rect)
                .unwrap_or_default(),
        }
    }

    fn rect(&self, entity: Entity) -> Option<Rect> {
        let rt = self.get::<RectTransform>(entity)?;
        Some(rt.layout(self.parent_rect(entity)).1)
    }

    fn derived_local_position(&self, entity: Entity) -> Option<Vec2> {
        let rt = self.get::<RectTransform>(entity)?;
        Some(rt.layout(self.parent_rect(entity)).0)
    }

    fn world_rect(&mut self, entity: Entity) -> Option<Rect> {
        let rect = self.rect(entity)?;
        let min = self.local_to_world_point(entity, rect.min().extend(0.0))?;
        let max = self.local_to_world_point(entity, rect.max().extend(0.0))?;
        Some(Rect::from_min_max(min.truncate(), max.truncate()))
    }

    fn rect_contains_world_point(&mut self, entity: Entity, point: Vec2) -> bool {
        self.world_rect(entity)
            .is_some_and(|rect| rect.contains(point))
    }

    fn set_viewport_size(&mut self, w: i32, h: i32) {
        self.insert_resource(Viewport { w, h });
        let mut query = self.query_filtered::<Entity, With<RectTransform>>();
        let nodes: Vec<Entity> = query.iter(self).collect();
        for node in nodes {
            self.invalidate_transform(node);
        }
    }
}
