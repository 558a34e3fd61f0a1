//! Channel for mutating the scene from outside the frame thread.
//!
//! Actors, transforms and components are only ever touched on the frame
//! thread. Other threads (decoders, loaders, tools) clone a [`Sender`] from
//! [`SceneBridge::sender`] and queue [`SceneCommand`]s; the
//! [`apply_scene_commands`](crate::systems::scenebridge::apply_scene_commands)
//! system drains the queue at the start of every frame.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, TryIter, unbounded};

use crate::math::{Quat, Vec3};

/// Deferred scene mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    SetPosition { actor: Entity, position: Vec3 },
    SetRotation { actor: Entity, rotation: Quat },
    SetScale { actor: Entity, scale: Vec3 },
    SetActive { actor: Entity, active: bool },
    Destroy { actor: Entity },
}

#[derive(Resource)]
pub struct SceneBridge {
    tx: Sender<SceneCommand>,
    rx: Receiver<SceneCommand>,
}

impl Default for SceneBridge {
    fn default() -> Self {
        let (tx, rx) = unbounded::<SceneCommand>();
        Self { tx, rx }
    }
}

impl SceneBridge {
    /// A sender that can be moved to another thread.
    pub fn sender(&self) -> Sender<SceneCommand> {
        self.tx.clone()
    }

    pub(crate) fn try_iter(&self) -> TryIter<'_, SceneCommand> {
        self.rx.try_iter()
    }
}
