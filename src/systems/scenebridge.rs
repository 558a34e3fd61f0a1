//! Applies [`SceneCommand`]s queued through the [`SceneBridge`].

use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::scenebridge::{SceneBridge, SceneCommand};
use crate::scene::actor_ops::ActorOps;
use crate::scene::transform_ops::TransformOps;

/// Drain the bridge and apply every command in send order.
///
/// Commands naming an actor that no longer exists are ignored.
pub fn apply_scene_commands(world: &mut World) {
    let commands: Vec<SceneCommand> = match world.get_resource::<SceneBridge>() {
        Some(bridge) => bridge.try_iter().collect(),
        None => return,
    };

    for cmd in commands {
        debug!("Applying {:?}", cmd);
        match cmd {
            SceneCommand::SetPosition { actor, position } => world.set_position(actor, position),
            SceneCommand::SetRotation { actor, rotation } => world.set_rotation(actor, rotation),
            SceneCommand::SetScale { actor, scale } => world.set_scale(actor, scale),
            SceneCommand::SetActive { actor, active } => world.set_active(actor, active),
            SceneCommand::Destroy { actor } => world.destroy_actor(actor),
        }
    }
}
