//! System functions every script can call.
//!
//! Actors are addressed by name (case-insensitive). An unknown actor is
//! logged and treated as a no-op; getters return zero.

use bevy_ecs::world::World;
use log::{info, warn};

use super::error::SheepError;
use super::sysfunc::{SysFuncRegistry, SysReturn, WaitHandle};
use super::value::{SheepValue, ValueKind};
use crate::components::mover::Mover;
use crate::math::Vec3;
use crate::scene::actor_ops::ActorOps;
use crate::scene::transform_ops::TransformOps;

use ValueKind::{Float, Int, String as Str};

fn str_arg<'a>(args: &'a [SheepValue], index: usize) -> &'a str {
    args.get(index).and_then(SheepValue::as_str).unwrap_or_default()
}

fn int_arg(args: &[SheepValue], index: usize) -> i32 {
    args.get(index).and_then(SheepValue::to_int).unwrap_or_default()
}

fn float_arg(args: &[SheepValue], index: usize) -> f32 {
    args.get(index).and_then(SheepValue::to_float).unwrap_or_default()
}

fn vec3_args(args: &[SheepValue], first: usize) -> Vec3 {
    Vec3::new(
        float_arg(args, first),
        float_arg(args, first + 1),
        float_arg(args, first + 2),
    )
}

fn named_actor(world: &World, func: &str, name: &str) -> Option<bevy_ecs::entity::Entity> {
    let found = world.find_actor(name);
    if found.is_none() {
        warn!("{}: no actor named '{}'", func, name);
    }
    found
}

fn world_axis(world: &mut World, args: &[SheepValue], func: &str, axis: usize) -> SysReturn {
    let position = named_actor(world, func, str_arg(args, 0)).and_then(|a| world.world_position(a));
    SysReturn::float(position.map_or(0.0, |p| p[axis]))
}

/// Start (or retarget) a [`Mover`] on the actor and hand its completion
/// handle back to the script. The target is a world position. An inactive
/// actor cannot animate, so it is placed at the target at once and there is
/// nothing to wait for.
fn move_actor_to(world: &mut World, args: &[SheepValue]) -> Result<SysReturn, SheepError> {
    let Some(actor) = named_actor(world, "MoveActorTo", str_arg(args, 0)) else {
        return Ok(SysReturn::void());
    };
    let target = vec3_args(args, 1);
    let duration = float_arg(args, 4);
    if !world.is_active(actor) {
        world.set_world_position(actor, target);
        return Ok(SysReturn::void());
    }
    let handle = WaitHandle::new();

    if let Some(mover) = world.actor_component_mut::<Mover>(actor) {
        mover.retarget(target, duration, Some(handle.clone()));
        world.set_component_enabled::<Mover>(actor, true);
    } else {
        world.add_actor_component(actor, Mover::new(target, duration).with_wait_handle(handle.clone()));
    }
    Ok(SysReturn::waiting(handle))
}

pub fn register_builtins(registry: &mut SysFuncRegistry) {
    registry.register("PrintString", &[Str], None, |_, args| {
        info!("[sheep] {}", str_arg(args, 0));
        Ok(SysReturn::void())
    });
    registry.register("PrintInt", &[Int], None, |_, args| {
        info!("[sheep] {}", int_arg(args, 0));
        Ok(SysReturn::void())
    });
    registry.register("PrintFloat", &[Float], None, |_, args| {
        info!("[sheep] {}", float_arg(args, 0));
        Ok(SysReturn::void())
    });

    // Random(max) -> int in [0, max)
    registry.register("Random", &[Int], Some(Int), |_, args| {
        let max = int_arg(args, 0);
        Ok(SysReturn::int(if max > 0 { fastrand::i32(0..max) } else { 0 }))
    });

    registry.register("GetActorCount", &[], Some(Int), |world, _| {
        let count = world
            .actors()
            .into_iter()
            .filter(|&a| world.actor(a).is_some_and(|a| !a.is_destroyed()))
            .count();
        Ok(SysReturn::int(count as i32))
    });

    registry.register("IsActorActive", &[Str], Some(Int), |world, args| {
        let active = named_actor(world, "IsActorActive", str_arg(args, 0))
            .is_some_and(|a| world.is_active(a));
        Ok(SysReturn::int(active as i32))
    });

    registry.register("SetActorActive", &[Str, Int], None, |world, args| {
        if let Some(actor) = named_actor(world, "SetActorActive", str_arg(args, 0)) {
            world.set_active(actor, int_arg(args, 1) != 0);
        }
        Ok(SysReturn::void())
    });

    registry.register("DestroyActor", &[Str], None, |world, args| {
        if let Some(actor) = named_actor(world, "DestroyActor", str_arg(args, 0)) {
            world.destroy_actor(actor);
        }
        Ok(SysReturn::void())
    });

    registry.register(
        "SetActorPosition",
        &[Str, Float, Float, Float],
        None,
        |world, args| {
            if let Some(actor) = named_actor(world, "SetActorPosition", str_arg(args, 0)) {
                world.set_world_position(actor, vec3_args(args, 1));
            }
            Ok(SysReturn::void())
        },
    );

    registry.register("GetActorPositionX", &[Str], Some(Float), |world, args| {
        Ok(world_axis(world, args, "GetActorPositionX", 0))
    });
    registry.register("GetActorPositionY", &[Str], Some(Float), |world, args| {
        Ok(world_axis(world, args, "GetActorPositionY", 1))
    });
    registry.register("GetActorPositionZ", &[Str], Some(Float), |world, args| {
        Ok(world_axis(world, args, "GetActorPositionZ", 2))
    });

    registry.register(
        "MoveActorTo",
        &[Str, Float, Float, Float, Float],
        None,
        move_actor_to,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::actor_ops::ActorBuilder;

    fn call(registry: &SysFuncRegistry, world: &mut World, name: &str, args: &[SheepValue]) -> SysReturn {
        registry.get(name).unwrap().call(world, args).unwrap()
    }

    #[test]
    fn actor_queries_by_name() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        let grace = world.spawn_actor(ActorBuilder::new("Grace").with_position(Vec3::new(1.0, 2.0, 3.0)));

        let ret = call(&registry, &mut world, "getactorpositiony", &["grace".into()]);
        assert_eq!(ret.value, Some(SheepValue::Float(2.0)));

        let ret = call(&registry, &mut world, "GetActorCount", &[]);
        assert_eq!(ret.value, Some(SheepValue::Int(1)));

        call(&registry, &mut world, "SetActorActive", &["Grace".into(), 0.into()]);
        assert!(!world.is_active(grace));
        let ret = call(&registry, &mut world, "IsActorActive", &["Grace".into()]);
        assert_eq!(ret.value, Some(SheepValue::Int(0)));
    }

    #[test]
    fn unknown_actor_is_a_no_op() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        let ret = call(&registry, &mut world, "GetActorPositionX", &["Nobody".into()]);
        assert_eq!(ret.value, Some(SheepValue::Float(0.0)));
        let ret = call(
            &registry,
            &mut world,
            "MoveActorTo",
            &["Nobody".into(), SheepValue::Float(1.0), SheepValue::Float(0.0), SheepValue::Float(0.0), SheepValue::Float(1.0)],
        );
        assert!(ret.wait.is_none());
    }

    #[test]
    fn random_stays_in_range() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        for _ in 0..32 {
            let ret = call(&registry, &mut world, "Random", &[10.into()]);
            let v = ret.value.and_then(|v| v.as_int()).unwrap();
            assert!((0..10).contains(&v));
        }
        let ret = call(&registry, &mut world, "Random", &[0.into()]);
        assert_eq!(ret.value, Some(SheepValue::Int(0)));
    }

    #[test]
    fn move_actor_to_attaches_a_mover() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        let gabe = world.spawn_actor(ActorBuilder::new("Gabriel"));
        let args = [
            "Gabriel".into(),
            SheepValue::Float(4.0),
            SheepValue::Float(0.0),
            SheepValue::Float(0.0),
            SheepValue::Float(1.0),
        ];
        let ret = call(&registry, &mut world, "MoveActorTo", &args);
        let handle = ret.wait.unwrap();
        assert!(!handle.is_complete());
        assert!(world.actor_component::<Mover>(gabe).is_some());

        // A second move reuses the same component.
        call(&registry, &mut world, "MoveActorTo", &args);
        assert_eq!(world.get::<crate::components::actorcomponent::ActorComponents>(gabe).unwrap().len(), 1);
        // The superseded move counts as done.
        assert!(handle.is_complete());
    }

    fn move_args(name: &str, x: f32, secs: f32) -> [SheepValue; 5] {
        [
            name.into(),
            SheepValue::Float(x),
            SheepValue::Float(0.0),
            SheepValue::Float(0.0),
            SheepValue::Float(secs),
        ]
    }

    #[test]
    fn move_target_matches_position_queries_under_a_parent() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        let rig = world.spawn_actor(ActorBuilder::new("Rig").with_position(Vec3::new(100.0, 0.0, 0.0)));
        let grace = world.spawn_actor(ActorBuilder::new("Grace").with_parent(rig));

        call(&registry, &mut world, "MoveActorTo", &move_args("Grace", 5.0, 0.0));
        world.update_actor(grace, 0.016);

        let ret = call(&registry, &mut world, "GetActorPositionX", &["Grace".into()]);
        let x = ret.value.and_then(|v| v.as_float()).unwrap();
        assert!((x - 5.0).abs() < 1e-4, "got {x}");
    }

    #[test]
    fn inactive_actor_is_placed_without_waiting() {
        let registry = SysFuncRegistry::with_builtins();
        let mut world = World::new();
        let estelle = world.spawn_actor(ActorBuilder::new("Estelle").inactive());

        let ret = call(&registry, &mut world, "MoveActorTo", &move_args("Estelle", 3.0, 2.0));
        assert!(ret.wait.is_none());
        assert!(world.actor_component::<Mover>(estelle).is_none());
        assert_eq!(world.world_position(estelle), Some(Vec3::new(3.0, 0.0, 0.0)));
    }
}
