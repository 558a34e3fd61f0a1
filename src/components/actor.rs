//! Actor identity and lifecycle state.
//!
//! An actor is an entity carrying [`Actor`], a
//! [`Transform`](super::transform::Transform) and an
//! [`ActorComponents`](super::actorcomponent::ActorComponents) list. Use
//! [`ActorOps`](crate::scene::actor_ops::ActorOps) to create and drive actors;
//! it keeps the registry, the hierarchy and the lifecycle hooks consistent.

use bevy_ecs::prelude::*;

/// Three-state lifecycle flag.
///
/// `Destroyed` is terminal: nothing moves an actor out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActorState {
    #[default]
    Active,
    Inactive,
    Destroyed,
}

/// Which transform flavor an actor is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransformKind {
    #[default]
    Transform,
    RectTransform,
}

#[derive(Component, Clone, Debug)]
pub struct Actor {
    pub(crate) name: String,
    pub(crate) state: ActorState,
    pub(crate) time_scale: f32,
    pub(crate) update_enabled: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ActorState::Active,
            time_scale: 1.0,
            update_enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own state, ignoring ancestors.
    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn update_enabled(&self) -> bool {
        self.update_enabled
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ActorState::Destroyed
    }
}
