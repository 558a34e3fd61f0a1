//! Transform hierarchy operations on the ECS [`World`].
//!
//! World matrices are computed lazily: a query recomputes only the nodes whose
//! cache is empty, walking up to the first cached ancestor. Every local or
//! parent-link mutation empties the cache of the node and of all of its
//! descendants, so the memoized matrix always equals a fresh composition.
//!
//! Missing entities are treated as absent: getters return `None`, setters log
//! a warning and do nothing.

use bevy_ecs::prelude::*;
use log::warn;
use smallvec::SmallVec;

use crate::components::recttransform::RectTransform;
use crate::components::transform::Transform;
use crate::math::{Mat4, Quat, Space, Vec3, inverse_or_identity, safe_div};
use crate::scene::rect_ops::RectTransformOps;

pub trait TransformOps {
    fn transform(&self, entity: Entity) -> Option<&Transform>;

    fn set_position(&mut self, entity: Entity, position: Vec3);
    fn set_rotation(&mut self, entity: Entity, rotation: Quat);
    fn set_scale(&mut self, entity: Entity, scale: Vec3);

    fn world_position(&mut self, entity: Entity) -> Option<Vec3>;
    fn world_rotation(&self, entity: Entity) -> Option<Quat>;
    fn world_scale(&self, entity: Entity) -> Option<Vec3>;

    fn set_world_position(&mut self, entity: Entity, position: Vec3);
    fn set_world_rotation(&mut self, entity: Entity, rotation: Quat);
    fn set_world_scale(&mut self, entity: Entity, scale: Vec3);

    fn local_to_world(&mut self, entity: Entity) -> Option<Mat4>;
    fn world_to_local(&mut self, entity: Entity) -> Option<Mat4>;

    fn local_to_world_point(&mut self, entity: Entity, point: Vec3) -> Option<Vec3>;
    fn world_to_local_point(&mut self, entity: Entity, point: Vec3) -> Option<Vec3>;
    fn local_to_world_direction(&self, entity: Entity, direction: Vec3) -> Option<Vec3>;
    fn world_to_local_direction(&self, entity: Entity, direction: Vec3) -> Option<Vec3>;

    fn forward(&self, entity: Entity) -> Option<Vec3>;
    fn right(&self, entity: Entity) -> Option<Vec3>;
    fn up(&self, entity: Entity) -> Option<Vec3>;

    fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) -> bool;
    fn add_child(&mut self, parent: Entity, child: Entity) -> bool;
    fn remove_child(&mut self, parent: Entity, child: Entity);
    fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool;

    fn translate(&mut self, entity: Entity, offset: Vec3, space: Space);
    fn rotate(&mut self, entity: Entity, rotation: Quat, space: Space);
    fn rotate_around(&mut self, entity: Entity, point: Vec3, rotation: Quat);

    /// Empty the matrix caches of `entity` and every descendant.
    fn invalidate_transform(&mut self, entity: Entity);
}

impl TransformOps for World {
    fn transform(&self, entity: Entity) -> Option<&Transform> {
        self.get::<Transform>(entity)
    }

    fn set_position(&mut self, entity: Entity, position: Vec3) {
        match self.get_mut::<Transform>(entity) {
            Some(mut t) => t.position = position,
            None => {
                warn!("set_position: {:?} has no transform", entity);
                return;
            }
        }
        self.invalidate_transform(entity);
    }

    fn set_rotation(&mut self, entity: Entity, rotation: Quat) {
        match self.get_mut::<Transform>(entity) {
            Some(mut t) => t.rotation = rotation,
            None => {
                warn!("set_rotation: {:?} has no transform", entity);
                return;
            }
        }
        self.invalidate_transform(entity);
    }

    fn set_scale(&mut self, entity: Entity, scale: Vec3) {
        match self.get_mut::<Transform>(entity) {
            Some(mut t) => t.scale = scale,
            None => {
                warn!("set_scale: {:?} has no transform", entity);
                return;
            }
        }
        self.invalidate_transform(entity);
    }

    fn world_position(&mut self, entity: Entity) -> Option<Vec3> {
        self.local_to_world(entity).map(|m| m.w_axis.truncate())
    }

    fn world_rotation(&self, entity: Entity) -> Option<Quat> {
        let t = self.get::<Transform>(entity)?;
        let mut rotation = t.rotation;
        let mut current = t.parent;
        while let Some(parent) = current {
            let Some(pt) = self.get::<Transform>(parent) else {
                break;
            };
            rotation = pt.rotation * rotation;
            current = pt.parent;
        }
        Some(rotation)
    }

    fn world_scale(&self, entity: Entity) -> Option<Vec3> {
        let t = self.get::<Transform>(entity)?;
        let mut scale = t.scale;
        let mut current = t.parent;
        while let Some(parent) = current {
            let Some(pt) = self.get::<Transform>(parent) else {
                break;
            };
            scale *= pt.scale;
            current = pt.parent;
        }
        Some(scale)
    }

    fn set_world_position(&mut self, entity: Entity, position: Vec3) {
        let Some(parent) = self.get::<Transform>(entity).map(|t| t.parent) else {
            warn!("set_world_position: {:?} has no transform", entity);
            return;
        };
        let local = match parent.and_then(|p| self.world_to_local(p)) {
            Some(inv) => inv.transform_point3(position),
            None => position,
        };
        self.set_position(entity, local);
    }

    fn set_world_rotation(&mut self, entity: Entity, rotation: Quat) {
        let Some(parent) = self.get::<Transform>(entity).map(|t| t.parent) else {
            warn!("set_world_rotation: {:?} has no transform", entity);
            return;
        };
        let local = match parent.and_then(|p| self.world_rotation(p)) {
            Some(parent_rotation) => parent_rotation.inverse() * rotation,
            None => rotation,
        };
        self.set_rotation(entity, local);
    }

    fn set_world_scale(&mut self, entity: Entity, scale: Vec3) {
        let Some(parent) = self.get::<Transform>(entity).map(|t| t.parent) else {
            warn!("set_world_scale: {:?} has no transform", entity);
            return;
        };
        let local = match parent.and_then(|p| self.world_scale(p)) {
            Some(parent_scale) => safe_div(scale, parent_scale),
            None => scale,
        };
        self.set_scale(entity, local);
    }

    fn local_to_world(&mut self, entity: Entity) -> Option<Mat4> {
        let t = self.get::<Transform>(entity)?;
        if let Some(cached) = t.local_to_world {
            return Some(cached);
        }
        let parent = t.parent;

        // Rect transforms derive X/Y from their layout first.
        if self.get::<RectTransform>(entity).is_some()
            && let Some(derived) = self.derived_local_position(entity)
            && let Some(mut t) = self.get_mut::<Transform>(entity)
        {
            t.position.x = derived.x;
            t.position.y = derived.y;
        }

        let local = self.get::<Transform>(entity)?.local_matrix();
        let matrix = match parent.and_then(|p| self.local_to_world(p)) {
            Some(parent_matrix) => parent_matrix * local,
            None => local,
        };

        let mut t = self.get_mut::<Transform>(entity)?;
        t.local_to_world = Some(matrix);
        t.world_to_local = None;
        Some(matrix)
    }

    fn world_to_local(&mut self, entity: Entity) -> Option<Mat4> {
        let t = self.get::<Transform>(entity)?;
        if t.local_to_world.is_some()
            && let Some(cached) = t.world_to_local
        {
            return Some(cached);
        }
        let inverse = inverse_or_identity(self.local_to_world(entity)?);
        self.get_mut::<Transform>(entity)?.world_to_local = Some(inverse);
        Some(inverse)
    }

    fn local_to_world_point(&mut self, entity: Entity, point: Vec3) -> Option<Vec3> {
        self.local_to_world(entity).map(|m| m.transform_point3(point))
    }

    fn world_to_local_point(&mut self, entity: Entity, point: Vec3) -> Option<Vec3> {
        self.world_to_local(entity).map(|m| m.transform_point3(point))
    }

    fn local_to_world_direction(&self, entity: Entity, direction: Vec3) -> Option<Vec3> {
        self.world_rotation(entity).map(|r| r * direction)
    }

    fn world_to_local_direction(&self, entity: Entity, direction: Vec3) -> Option<Vec3> {
        self.world_rotation(entity).map(|r| r.inverse() * direction)
    }

    fn forward(&self, entity: Entity) -> Option<Vec3> {
        self.local_to_world_direction(entity, Vec3::Z)
    }

    fn right(&self, entity: Entity) -> Option<Vec3> {
        self.local_to_world_direction(entity, Vec3::X)
    }

    fn up(&self, entity: Entity) -> Option<Vec3> {
        self.local_to_world_direction(entity, Vec3::Y)
    }

    fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) -> bool {
        let Some(old_parent) = self.get::<Transform>(entity).map(|t| t.parent) else {
            warn!("set_parent: {:?} has no transform", entity);
            return false;
        };
        if let Some(new_parent) = parent {
            if self.get::<Transform>(new_parent).is_none() {
                warn!("set_parent: parent {:?} has no transform", new_parent);
                return false;
            }
            if new_parent == entity || self.is_ancestor_of(entity, new_parent) {
                warn!(
                    "set_parent: refusing to parent {:?} under its own descendant {:?}",
                    entity, new_parent
                );
                return false;
            }
        }

        if let Some(old) = old_parent
            && let Some(mut old_t) = self.get_mut::<Transform>(old)
        {
            old_t.children.retain(|c| *c != entity);
        }
        if let Some(mut t) = self.get_mut::<Transform>(entity) {
            t.parent = parent;
        }
        if let Some(new_parent) = parent
            && let Some(mut parent_t) = self.get_mut::<Transform>(new_parent)
        {
            parent_t.children.push(entity);
        }
        self.invalidate_transform(entity);
        true
    }

    fn add_child(&mut self, parent: Entity, child: Entity) -> bool {
        self.set_parent(child, Some(parent))
    }

    fn remove_child(&mut self, parent: Entity, child: Entity) {
        if self.get::<Transform>(child).and_then(|t| t.parent) == Some(parent) {
            self.set_parent(child, None);
        }
    }

    fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.get::<Transform>(entity).and_then(|t| t.parent);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get::<Transform>(node).and_then(|t| t.parent);
        }
        false
    }

    fn translate(&mut self, entity: Entity, offset: Vec3, space: Space) {
        match space {
            Space::Local => {
                let Some(t) = self.get::<Transform>(entity) else {
                    return;
                };
                let position = t.position + t.rotation * offset;
                self.set_position(entity, position);
            }
            Space::World => {
                if let Some(world) = self.world_position(entity) {
                    self.set_world_position(entity, world + offset);
                }
            }
        }
    }

    fn rotate(&mut self, entity: Entity, rotation: Quat, space: Space) {
        match space {
            Space::Local => {
                if let Some(t) = self.get::<Transform>(entity) {
                    let local = t.rotation * rotation;
                    self.set_rotation(entity, local);
                }
            }
            Space::World => {
                if let Some(world) = self.world_rotation(entity) {
                    self.set_world_rotation(entity, rotation * world);
                }
            }
        }
    }

    fn rotate_around(&mut self, entity: Entity, point: Vec3, rotation: Quat) {
        let Some(world) = self.world_position(entity) else {
            return;
        };
        let orbited = point + rotation * (world - point);
        self.set_world_position(entity, orbited);
        self.rotate(entity, rotation, Space::World);
    }

    fn invalidate_transform(&mut self, entity: Entity) {
        let mut pending: SmallVec<[Entity; 16]> = SmallVec::new();
        pending.push(entity);
        while let Some(node) = pending.pop() {
            if let Some(mut t) = self.get_mut::<Transform>(node) {
                t.invalidate();
                pending.extend(t.children.iter().copied());
            }
        }
    }
}

/// Unlink `entity` from the hierarchy before its storage is reclaimed.
///
/// The node leaves its parent's child list and its children become roots.
pub(crate) fn detach_transform(world: &mut World, entity: Entity) {
    let Some((parent, children)) = world
        .get_mut::<Transform>(entity)
        .map(|mut t| (t.parent.take(), std::mem::take(&mut t.children)))
    else {
        return;
    };
    if let Some(parent) = parent
        && let Some(mut pt) = world.get_mut::<Transform>(parent)
    {
        pt.children.retain(|c| *c != entity);
    }
    for child in children {
        if let Some(mut ct) = world.get_mut::<Transform>(child) {
            ct.parent = None;
        }
        world.invalidate_transform(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut World, position: Vec3) -> Entity {
        world.spawn(Transform::from_position(position)).id()
    }

    #[test]
    fn root_world_equals_local() {
        let mut world = World::new();
        let e = spawn(&mut world, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(world.world_position(e), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn query_caches_and_mutation_invalidates() {
        let mut world = World::new();
        let e = spawn(&mut world, Vec3::X);
        world.local_to_world(e);
        assert!(!world.transform(e).unwrap().is_dirty());
        world.set_position(e, Vec3::Y);
        assert!(world.transform(e).unwrap().is_dirty());
    }

    #[test]
    fn self_parenting_is_rejected() {
        let mut world = World::new();
        let e = spawn(&mut world, Vec3::ZERO);
        assert!(!world.set_parent(e, Some(e)));
        assert!(world.transform(e).unwrap().parent().is_none());
    }

    #[test]
    fn detach_unparents_children() {
        let mut world = World::new();
        let parent = spawn(&mut world, Vec3::ZERO);
        let child = spawn(&mut world, Vec3::X);
        world.set_parent(child, Some(parent));
        detach_transform(&mut world, parent);
        assert!(world.transform(child).unwrap().parent().is_none());
        assert!(world.transform(parent).unwrap().children().is_empty());
    }
}
