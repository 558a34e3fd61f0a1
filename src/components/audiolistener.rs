//! Ears of the scene.
//!
//! Each late update the enabled listener on an active actor publishes its
//! actor's world pose into the [`ListenerPose`] resource, after every actor
//! has moved for the frame. With several listeners, the last one updated
//! wins.

use crate::components::actorcomponent::{ActorComponent, ComponentContext};
use crate::resources::listenerpose::ListenerPose;
use crate::scene::transform_ops::TransformOps;

#[derive(Debug, Default, Clone, Copy)]
pub struct AudioListener;

impl ActorComponent for AudioListener {
    fn on_late_update(&mut self, ctx: &mut ComponentContext<'_>, _dt: f32) {
        let actor = ctx.actor;
        let (Some(position), Some(rotation)) = (
            ctx.world.world_position(actor),
            ctx.world.world_rotation(actor),
        ) else {
            return;
        };
        ctx.world.insert_resource(ListenerPose {
            actor: Some(actor),
            position,
            rotation,
        });
    }

    fn on_disable(&mut self, ctx: &mut ComponentContext<'_>) {
        let owned = ctx
            .world
            .get_resource::<ListenerPose>()
            .is_some_and(|pose| pose.actor == Some(ctx.actor));
        if owned {
            ctx.world.insert_resource(ListenerPose::default());
        }
    }
}
