//! Registry of live actors in creation order.
//!
//! The ECS world owns actor storage; this resource only records the order in
//! which actors were created, which is the order they are updated in.
//! Destroyed actors stay listed until the sweep at the end of the frame.

use bevy_ecs::prelude::*;

#[derive(Resource, Debug, Default)]
pub struct ActorRegistry {
    pub(crate) order: Vec<Entity>,
}

impl ActorRegistry {
    /// Actors in creation order.
    pub fn actors(&self) -> &[Entity] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn register(&mut self, actor: Entity) {
        self.order.push(actor);
    }

    pub(crate) fn unregister(&mut self, actor: Entity) {
        self.order.retain(|e| *e != actor);
    }
}
