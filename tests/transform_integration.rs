//! Integration tests for the transform hierarchy and rect-transform layout.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test transform_integration
//! ```

use std::f32::consts::FRAC_PI_2;

use bevy_ecs::prelude::*;

use gengine::components::recttransform::RectTransform;
use gengine::math::{Mat4, Quat, Rect, Space, Vec2, Vec3};
use gengine::resources::engineconfig::EngineConfig;
use gengine::scene::Scene;
use gengine::scene::actor_ops::{ActorBuilder, ActorOps};
use gengine::scene::rect_ops::RectTransformOps;
use gengine::scene::transform_ops::TransformOps;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| approx_eq(*x, *y))
}

/// Local-to-world recomputed from scratch, ignoring every cache.
fn direct_local_to_world(world: &World, entity: Entity) -> Mat4 {
    let t = world.transform(entity).unwrap();
    let local = t.local_matrix();
    match t.parent() {
        Some(parent) => direct_local_to_world(world, parent) * local,
        None => local,
    }
}

fn chain(world: &mut World) -> (Entity, Entity, Entity) {
    let a = world.spawn_actor(
        ActorBuilder::new("A")
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_z(0.3))
            .with_scale(Vec3::new(2.0, 1.0, 1.0)),
    );
    let b = world.spawn_actor(
        ActorBuilder::new("B")
            .with_parent(a)
            .with_position(Vec3::new(0.0, 4.0, 0.0))
            .with_rotation(Quat::from_rotation_x(-0.7)),
    );
    let c = world.spawn_actor(
        ActorBuilder::new("C")
            .with_parent(b)
            .with_position(Vec3::new(-1.0, 0.5, 2.0))
            .with_scale(Vec3::new(1.0, 3.0, 0.5)),
    );
    (a, b, c)
}

// =============================================================================
// Dirty propagation
// =============================================================================

#[test]
fn no_stale_cache_after_mutations() {
    let mut world = World::new();
    let (a, b, c) = chain(&mut world);

    // Prime every cache.
    for e in [a, b, c] {
        world.local_to_world(e);
    }

    world.set_position(a, Vec3::new(-5.0, 0.0, 1.0));
    world.set_rotation(b, Quat::from_rotation_y(1.1));
    world.set_scale(a, Vec3::splat(0.5));

    for e in [a, b, c] {
        let cached = world.local_to_world(e).unwrap();
        assert!(mat_approx_eq(cached, direct_local_to_world(&world, e)));
    }
}

#[test]
fn mutating_a_parent_dirties_every_descendant() {
    let mut world = World::new();
    let (a, b, c) = chain(&mut world);
    world.local_to_world(c);
    assert!(!world.transform(c).unwrap().is_dirty());

    world.set_position(a, Vec3::ZERO);
    assert!(world.transform(a).unwrap().is_dirty());
    assert!(world.transform(b).unwrap().is_dirty());
    assert!(world.transform(c).unwrap().is_dirty());
}

#[test]
fn reparenting_updates_world_matrix() {
    let mut world = World::new();
    let (a, _b, c) = chain(&mut world);
    world.local_to_world(c);

    assert!(world.set_parent(c, Some(a)));
    assert_eq!(world.transform(c).unwrap().parent(), Some(a));
    assert!(world.transform(a).unwrap().children().contains(&c));
    let cached = world.local_to_world(c).unwrap();
    assert!(mat_approx_eq(cached, direct_local_to_world(&world, c)));

    assert!(world.set_parent(c, None));
    let cached = world.local_to_world(c).unwrap();
    assert!(mat_approx_eq(cached, world.transform(c).unwrap().local_matrix()));
}

// =============================================================================
// Inverses and round trips
// =============================================================================

#[test]
fn world_to_local_inverts_local_to_world() {
    let mut world = World::new();
    let (a, b, c) = chain(&mut world);
    for e in [a, b, c] {
        let l2w = world.local_to_world(e).unwrap();
        let w2l = world.world_to_local(e).unwrap();
        assert!(mat_approx_eq(w2l * l2w, Mat4::IDENTITY));
    }
}

#[test]
fn set_world_position_of_current_value_is_idempotent() {
    let mut world = World::new();
    let (_a, _b, c) = chain(&mut world);
    let before = world.transform(c).unwrap().position();
    let world_pos = world.world_position(c).unwrap();
    world.set_world_position(c, world_pos);
    let after = world.transform(c).unwrap().position();
    assert!(vec_approx_eq(before, after));
}

#[test]
fn set_world_rotation_respects_parent() {
    let mut world = World::new();
    let (_a, b, c) = chain(&mut world);
    let target = Quat::from_rotation_y(0.4);
    world.set_world_rotation(c, target);
    let got = world.world_rotation(c).unwrap();
    assert!(got.dot(target).abs() > 1.0 - EPSILON);
    // Parent untouched.
    assert!(world.world_rotation(b).is_some());
}

#[test]
fn world_scale_multiplies_down_the_chain() {
    let mut world = World::new();
    let (_a, _b, c) = chain(&mut world);
    let scale = world.world_scale(c).unwrap();
    assert!(vec_approx_eq(scale, Vec3::new(2.0, 3.0, 0.5)));
}

#[test]
fn points_round_trip_through_world_space() {
    let mut world = World::new();
    let (_a, _b, c) = chain(&mut world);
    let p = Vec3::new(0.3, -2.0, 7.0);
    let w = world.local_to_world_point(c, p).unwrap();
    let back = world.world_to_local_point(c, w).unwrap();
    assert!(vec_approx_eq(p, back));
}

// =============================================================================
// Translate / Rotate / RotateAround
// =============================================================================

#[test]
fn rotate_around_preserves_distance() {
    let mut world = World::new();
    let e = world.spawn_actor(ActorBuilder::new("Orbiter").with_position(Vec3::new(10.0, 0.0, 0.0)));

    world.rotate_around(e, Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));

    let pos = world.world_position(e).unwrap();
    assert!(vec_approx_eq(pos, Vec3::new(0.0, 0.0, -10.0)), "got {pos}");
    assert!(approx_eq(pos.length(), 10.0));
    let forward = world.forward(e).unwrap();
    assert!(vec_approx_eq(forward, Vec3::new(1.0, 0.0, 0.0)), "got {forward}");
}

#[test]
fn translate_in_local_space_follows_rotation() {
    let mut world = World::new();
    let e = world.spawn_actor(
        ActorBuilder::new("Walker").with_rotation(Quat::from_rotation_y(FRAC_PI_2)),
    );
    world.translate(e, Vec3::new(0.0, 0.0, 1.0), Space::Local);
    assert!(vec_approx_eq(world.world_position(e).unwrap(), Vec3::new(1.0, 0.0, 0.0)));

    world.translate(e, Vec3::new(0.0, 0.0, 1.0), Space::World);
    assert!(vec_approx_eq(world.world_position(e).unwrap(), Vec3::new(1.0, 0.0, 1.0)));
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn parent_cycles_are_rejected() {
    let mut world = World::new();
    let (a, b, c) = chain(&mut world);

    assert!(!world.set_parent(a, Some(c)));
    assert!(!world.set_parent(b, Some(b)));
    assert_eq!(world.transform(a).unwrap().parent(), None);
    assert!(world.is_ancestor_of(a, c));
    assert!(!world.is_ancestor_of(c, a));
}

// =============================================================================
// RectTransform
// =============================================================================

fn hud_scene() -> (Scene, Entity, Entity) {
    let mut scene = Scene::new(EngineConfig::new());
    let root = scene.spawn_actor(ActorBuilder::new("Root").with_rect(RectTransform::stretched()));
    let bar = scene.spawn_actor(
        ActorBuilder::new("Bar").with_parent(root).with_rect(
            RectTransform::default()
                .with_anchors(Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0))
                .with_pivot(Vec2::new(0.5, 1.0))
                .with_size_delta(Vec2::new(0.0, 200.0))
                .with_anchored_position(Vec2::ZERO),
        ),
    );
    (scene, root, bar)
}

#[test]
fn top_anchored_bar_spans_the_viewport() {
    let (mut scene, root, bar) = hud_scene();

    assert_eq!(scene.rect(root), Some(Rect::new(0.0, 0.0, 1024.0, 768.0)));
    assert_eq!(scene.rect(bar), Some(Rect::new(-512.0, -200.0, 1024.0, 200.0)));
    assert_eq!(scene.derived_local_position(bar), Some(Vec2::new(512.0, 768.0)));

    let world_rect = scene.world_rect(bar).unwrap();
    assert!(approx_eq(world_rect.x, 0.0));
    assert!(approx_eq(world_rect.y, 568.0));
    assert!(approx_eq(world_rect.width, 1024.0));
    assert!(approx_eq(world_rect.height, 200.0));
    assert!(approx_eq(world_rect.max().y, 768.0));
}

#[test]
fn derived_position_lands_in_transform() {
    let (mut scene, _root, bar) = hud_scene();
    let pos = scene.world_position(bar).unwrap();
    assert!(vec_approx_eq(pos, Vec3::new(512.0, 768.0, 0.0)));
    assert!(vec_approx_eq(scene.transform(bar).unwrap().position(), pos));
}

#[test]
fn viewport_resize_relayouts() {
    let (mut scene, _root, bar) = hud_scene();
    scene.world_rect(bar);

    scene.set_viewport_size(800, 600);
    let rect = scene.world_rect(bar).unwrap();
    assert!(approx_eq(rect.width, 800.0));
    assert!(approx_eq(rect.max().y, 600.0));
}

#[test]
fn setters_invalidate_layout() {
    let (mut scene, _root, bar) = hud_scene();
    scene.world_rect(bar);

    scene.set_size_delta_y(bar, 50.0);
    scene.set_anchored_position(bar, Vec2::new(0.0, -10.0));
    let rect = scene.world_rect(bar).unwrap();
    assert!(approx_eq(rect.height, 50.0));
    assert!(approx_eq(rect.max().y, 758.0));

    assert!(scene.rect_contains_world_point(bar, Vec2::new(100.0, 730.0)));
    assert!(!scene.rect_contains_world_point(bar, Vec2::new(100.0, 600.0)));
}

#[test]
fn pixel_perfect_from_config() {
    let mut config = EngineConfig::new();
    config.viewport_width = 1001;
    config.pixel_perfect = true;
    let mut scene = Scene::new(config);
    let centered = scene.spawn_actor(ActorBuilder::new("Badge").with_rect(RectTransform::default()));

    assert!(scene.rect_transform(centered).unwrap().pixel_perfect());
    let pos = scene.derived_local_position(centered).unwrap();
    assert_eq!(pos, Vec2::new(500.0, 384.0));
    assert_eq!(scene.rect(centered), Some(Rect::new(-50.0, -50.0, 100.0, 100.0)));
}
