//! Listener pose published for the audio layer.
//!
//! Written by the [`AudioListener`](crate::components::audiolistener::AudioListener)
//! component during late update. The audio backend (not part of this crate)
//! reads it to position 3D sound.

use bevy_ecs::prelude::*;

use crate::math::{Quat, Vec3};

#[derive(Resource, Clone, Copy, Debug, PartialEq, Default)]
pub struct ListenerPose {
    /// Actor that published this pose, if any listener is active.
    pub actor: Option<Entity>,
    pub position: Vec3,
    pub rotation: Quat,
}
