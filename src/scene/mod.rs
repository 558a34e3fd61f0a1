//! The scene: an ECS world holding every actor, plus the per-frame schedule.
//!
//! Engine operations are extension traits on [`World`]:
//! - [`transform_ops::TransformOps`] – hierarchy and lazy world matrices
//! - [`rect_ops::RectTransformOps`] – anchor/pivot layout for UI nodes
//! - [`actor_ops::ActorOps`] – spawning, activity, components, destruction
//!
//! [`Scene`] derefs to its [`World`], so these are available directly on it.

pub mod actor_ops;
pub mod rect_ops;
pub mod transform_ops;

use std::ops::{Deref, DerefMut};

use bevy_ecs::prelude::*;
use log::info;

use crate::resources::actorregistry::ActorRegistry;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::listenerpose::ListenerPose;
use crate::resources::scenebridge::SceneBridge;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::actors::{late_update_actors, sweep_destroyed_actors, update_actors};
use crate::systems::scenebridge::apply_scene_commands;
use crate::systems::sheep::run_sheep_threads;
use crate::systems::time::update_world_time;

pub struct Scene {
    world: World,
    frame: Schedule,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EngineConfig::new())
    }
}

impl Scene {
    /// Build an empty scene. The config is stored as a resource and seeds
    /// the viewport and the global time scale.
    pub fn new(config: EngineConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
        world.insert_resource(Viewport {
            w: config.viewport_width as i32,
            h: config.viewport_height as i32,
        });
        world.insert_resource(ActorRegistry::default());
        world.insert_resource(SceneBridge::default());
        world.insert_resource(ListenerPose::default());
        info!(
            "Scene created: viewport {}x{}, time scale {}",
            config.viewport_width, config.viewport_height, config.time_scale
        );
        world.insert_resource(config);

        let mut frame = Schedule::default();
        frame.add_systems(
            (
                apply_scene_commands,
                run_sheep_threads,
                update_actors,
                late_update_actors,
                sweep_destroyed_actors,
            )
                .chain(),
        );

        Scene { world, frame }
    }

    /// Advance one frame by `dt` unscaled seconds.
    pub fn update(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.frame.run(&mut self.world);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Deref for Scene {
    type Target = World;

    fn deref(&self) -> &World {
        &self.world
    }
}

impl DerefMut for Scene {
    fn deref_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
