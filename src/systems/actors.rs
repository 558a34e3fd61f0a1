//! Per-frame actor passes.
//!
//! Every pass walks the [`ActorRegistry`] in creation order over a snapshot,
//! so actors spawned during a pass are first visited next frame.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::actor::Actor;
use crate::events::actor::ActorDestroyed;
use crate::resources::actorregistry::ActorRegistry;
use crate::resources::worldtime::WorldTime;
use crate::scene::actor_ops::ActorOps;
use crate::scene::transform_ops::detach_transform;

fn frame_delta(world: &World) -> f32 {
    world.get_resource::<WorldTime>().map_or(0.0, |t| t.delta)
}

/// Run the update hook of every active actor.
pub fn update_actors(world: &mut World) {
    let dt = frame_delta(world);
    for actor in world.actors() {
        world.update_actor(actor, dt);
    }
}

/// Run the late-update hook of every active actor, after all updates.
pub fn late_update_actors(world: &mut World) {
    let dt = frame_delta(world);
    for actor in world.actors() {
        world.late_update_actor(actor, dt);
    }
}

/// Reclaim every actor flagged as destroyed.
///
/// Observers of [`ActorDestroyed`] run while the actor still exists. The
/// actor is then unlinked from the hierarchy (its surviving children become
/// roots), despawned and removed from the registry.
pub fn sweep_destroyed_actors(world: &mut World) {
    let doomed: Vec<(Entity, String)> = world
        .actors()
        .into_iter()
        .filter_map(|e| {
            world
                .get::<Actor>(e)
                .filter(|a| a.is_destroyed())
                .map(|a| (e, a.name().to_string()))
        })
        .collect();

    for (actor, name) in doomed {
        world.trigger(ActorDestroyed {
            actor,
            name: name.clone(),
        });
        detach_transform(world, actor);
        world.despawn(actor);
        if let Some(mut registry) = world.get_resource_mut::<ActorRegistry>() {
            registry.unregister(actor);
        }
        debug!("Reclaimed actor '{}' {:?}", name, actor);
    }
}
