//! Actor lifecycle events.
//!
//! These are triggered synchronously by
//! [`ActorOps`](crate::scene::actor_ops::ActorOps) and the frame systems.
//! Register observers with `world.add_observer(...)` to react to them.
//!
//! # Example
//!
//! ```ignore
//! world.add_observer(|trigger: On<ActorDeactivated>| {
//!     log::info!("{:?} went inactive", trigger.actor);
//! });
//! ```

use bevy_ecs::prelude::*;

/// The actor's own state moved from inactive to active.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorActivated {
    pub actor: Entity,
}

/// The actor's own state moved from active to inactive.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorDeactivated {
    pub actor: Entity,
}

/// Fired once per frame for each updating actor, before its components run.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ActorUpdated {
    pub actor: Entity,
    /// Delta already scaled by the actor's time scale.
    pub dt: f32,
}

/// The actor's storage is about to be reclaimed by the end-of-frame sweep.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ActorDestroyed {
    pub actor: Entity,
    pub name: String,
}
