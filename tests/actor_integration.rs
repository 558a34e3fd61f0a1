//! Integration tests for actors, their behavior components and the frame loop.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test actor_integration
//! ```

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;

use gengine::components::actor::{Actor, ActorState};
use gengine::components::actorcomponent::{ActorComponent, ComponentContext};
use gengine::events::actor::{ActorActivated, ActorDeactivated, ActorDestroyed, ActorUpdated};
use gengine::math::Vec3;
use gengine::resources::engineconfig::EngineConfig;
use gengine::resources::scenebridge::{SceneBridge, SceneCommand};
use gengine::scene::Scene;
use gengine::scene::actor_ops::{ActorBuilder, ActorOps};
use gengine::scene::transform_ops::TransformOps;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Records every hook it receives. `N` only exists to make distinct types.
struct Probe<const N: u8> {
    tag: String,
    log: Log,
}

impl<const N: u8> Probe<N> {
    fn new(tag: &str, log: &Log) -> Self {
        Self {
            tag: tag.to_string(),
            log: Arc::clone(log),
        }
    }

    fn record(&self, what: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.tag, what));
    }
}

impl<const N: u8> ActorComponent for Probe<N> {
    fn on_enable(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.record("enable");
    }

    fn on_disable(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.record("disable");
    }

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {
        self.record("update");
    }

    fn on_late_update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {
        self.record("late");
    }
}

struct DeltaProbe(Arc<Mutex<Vec<f32>>>);

impl ActorComponent for DeltaProbe {
    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>, dt: f32) {
        self.0.lock().unwrap().push(dt);
    }
}

/// Turns itself off on its first update.
struct OneShot(Log);

impl ActorComponent for OneShot {
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, _dt: f32) {
        self.0.lock().unwrap().push("fire".to_string());
        ctx.world.set_component_enabled::<OneShot>(ctx.actor, false);
        self.0.lock().unwrap().push("after-request".to_string());
    }

    fn on_disable(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.0.lock().unwrap().push("disable".to_string());
    }
}

/// Deactivates its own actor when updated.
struct Sleeper;

impl ActorComponent for Sleeper {
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, _dt: f32) {
        ctx.world.set_active(ctx.actor, false);
    }
}

fn chain(world: &mut World) -> (Entity, Entity, Entity) {
    let a = world.spawn_actor(ActorBuilder::new("A"));
    let b = world.spawn_actor(ActorBuilder::new("B").with_parent(a));
    let c = world.spawn_actor(ActorBuilder::new("C").with_parent(b));
    (a, b, c)
}

// =============================================================================
// Activity
// =============================================================================

#[test]
fn activity_is_hierarchical() {
    let mut world = World::new();
    let (a, b, c) = chain(&mut world);
    assert!(world.is_active(c));

    world.set_active(a, false);
    assert!(!world.is_active(b));
    assert!(!world.is_active(c));
    assert_eq!(world.actor_state(c), Some(ActorState::Active));

    world.set_active(a, true);
    assert!(world.is_active(c));
}

#[test]
fn toggling_an_actor_fires_each_hook_once() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Grace"));
    world.add_actor_component(actor, Probe::<1>::new("one", &log));
    world.add_actor_component(actor, Probe::<2>::new("two", &log));
    assert!(entries(&log).is_empty(), "adding does not fire enable");

    world.set_active(actor, false);
    world.set_active(actor, false);
    world.set_active(actor, true);
    world.set_active(actor, true);

    assert_eq!(
        entries(&log),
        vec!["one:disable", "two:disable", "one:enable", "two:enable"]
    );
    assert_eq!(world.is_component_enabled::<Probe<1>>(actor), Some(true));
    assert_eq!(world.is_component_enabled::<Probe<2>>(actor), Some(true));
}

#[test]
fn disabled_component_is_skipped_by_actor_toggle() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Mosely"));
    world.add_actor_component(actor, Probe::<1>::new("one", &log));
    world.add_actor_component(actor, Probe::<2>::new("two", &log));

    world.set_component_enabled::<Probe<2>>(actor, false);
    world.set_component_enabled::<Probe<2>>(actor, false);
    log.lock().unwrap().clear();

    world.set_active(actor, false);
    world.set_active(actor, true);
    assert_eq!(entries(&log), vec!["one:disable", "one:enable"]);
    assert!(!world.is_active_and_enabled::<Probe<2>>(actor));
    assert!(world.is_active_and_enabled::<Probe<1>>(actor));
}

#[test]
fn component_enable_transitions_fire_once() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Buthane"));
    world.add_actor_component(actor, Probe::<1>::new("p", &log));

    world.set_component_enabled::<Probe<1>>(actor, true);
    world.set_component_enabled::<Probe<1>>(actor, false);
    world.set_component_enabled::<Probe<1>>(actor, false);
    world.set_component_enabled::<Probe<1>>(actor, true);
    assert_eq!(entries(&log), vec!["p:disable", "p:enable"]);
}

#[test]
fn destroyed_actor_cannot_be_reactivated() {
    let mut world = World::new();
    let actor = world.spawn_actor(ActorBuilder::new("Wilkes"));
    world.destroy_actor(actor);
    world.set_active(actor, true);
    world.set_active(actor, false);
    assert_eq!(world.actor_state(actor), Some(ActorState::Destroyed));
    assert!(!world.is_active(actor));
}

#[test]
fn activation_events_reach_observers() {
    let mut world = World::new();
    let log = new_log();
    let (a, _b, _c) = chain(&mut world);

    let on = Arc::clone(&log);
    world.add_observer(move |event: On<ActorActivated>, actors: Query<&Actor>| {
        let name = actors.get(event.actor).map(|a| a.name().to_string()).unwrap_or_default();
        on.lock().unwrap().push(format!("{}:activated", name));
    });
    let off = Arc::clone(&log);
    world.add_observer(move |event: On<ActorDeactivated>, actors: Query<&Actor>| {
        let name = actors.get(event.actor).map(|a| a.name().to_string()).unwrap_or_default();
        off.lock().unwrap().push(format!("{}:deactivated", name));
    });

    world.set_active(a, false);
    world.set_active(a, true);
    // Only the actor whose own state changed is notified.
    assert_eq!(entries(&log), vec!["A:deactivated", "A:activated"]);
}

// =============================================================================
// Components
// =============================================================================

#[test]
fn component_lookup_is_by_exact_type() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Gabriel"));
    assert!(world.actor_component::<Probe<1>>(actor).is_none());

    let added = world.add_actor_component(actor, Probe::<1>::new("first", &log));
    assert_eq!(added.map(|p| p.tag.clone()), Some("first".to_string()));
    world.add_actor_component(actor, Probe::<1>::new("second", &log));

    assert_eq!(world.actor_component::<Probe<1>>(actor).unwrap().tag, "first");
    assert!(world.actor_component::<Probe<2>>(actor).is_none());
    world.actor_component_mut::<Probe<1>>(actor).unwrap().tag = "renamed".to_string();
    assert_eq!(world.actor_component::<Probe<1>>(actor).unwrap().tag, "renamed");
}

#[test]
fn self_disable_during_update_is_deferred_and_fires_once() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Estelle"));
    world.add_actor_component(actor, OneShot(Arc::clone(&log)));

    world.update_actor(actor, 0.1);
    world.update_actor(actor, 0.1);

    assert_eq!(entries(&log), vec!["fire", "after-request", "disable"]);
    assert_eq!(world.is_component_enabled::<OneShot>(actor), Some(false));
}

#[test]
fn deactivating_mid_update_stops_remaining_components() {
    let mut world = World::new();
    let log = new_log();
    let actor = world.spawn_actor(ActorBuilder::new("Lady Howard"));
    world.add_actor_component(actor, Probe::<1>::new("before", &log));
    world.add_actor_component(actor, Sleeper);
    world.add_actor_component(actor, Probe::<2>::new("after", &log));

    world.update_actor(actor, 0.1);
    assert_eq!(
        entries(&log),
        vec!["before:update", "before:disable", "after:disable"]
    );
}

// =============================================================================
// Frame loop
// =============================================================================

#[test]
fn frame_runs_updates_then_late_updates_in_creation_order() {
    let mut scene = Scene::default();
    let log = new_log();
    let x = scene.spawn_actor(ActorBuilder::new("X"));
    let y = scene.spawn_actor(ActorBuilder::new("Y"));
    scene.add_actor_component(x, Probe::<1>::new("X1", &log));
    scene.add_actor_component(x, Probe::<2>::new("X2", &log));
    scene.add_actor_component(y, Probe::<1>::new("Y1", &log));

    let own = Arc::clone(&log);
    scene.add_observer(move |event: On<ActorUpdated>, actors: Query<&Actor>| {
        let name = actors.get(event.actor).map(|a| a.name().to_string()).unwrap_or_default();
        own.lock().unwrap().push(format!("{}:self", name));
    });

    scene.update(0.016);
    assert_eq!(
        entries(&log),
        vec![
            "X:self", "X1:update", "X2:update", "Y:self", "Y1:update", "X1:late", "X2:late",
            "Y1:late",
        ]
    );
}

#[test]
fn delta_is_scaled_by_global_and_actor_time_scale() {
    let mut config = EngineConfig::new();
    config.time_scale = 0.5;
    let mut scene = Scene::new(config);
    let deltas = Arc::new(Mutex::new(Vec::new()));

    let fast = scene.spawn_actor(ActorBuilder::new("Fast").with_time_scale(4.0));
    scene.add_actor_component(fast, DeltaProbe(Arc::clone(&deltas)));
    let frozen = scene.spawn_actor(ActorBuilder::new("Frozen"));
    scene.add_actor_component(frozen, DeltaProbe(Arc::clone(&deltas)));
    scene.set_time_scale(frozen, 0.0);

    scene.update(0.1);
    let got = deltas.lock().unwrap().clone();
    assert_eq!(got.len(), 2);
    assert!(approx_eq(got[0], 0.2));
    assert!(approx_eq(got[1], 0.0));
}

#[test]
fn inactive_or_update_disabled_actors_are_skipped() {
    let mut scene = Scene::default();
    let log = new_log();
    let parent = scene.spawn_actor(ActorBuilder::new("Parent").inactive());
    let child = scene.spawn_actor(ActorBuilder::new("Child").with_parent(parent));
    scene.add_actor_component(child, Probe::<1>::new("child", &log));
    let idle = scene.spawn_actor(ActorBuilder::new("Idle"));
    scene.add_actor_component(idle, Probe::<1>::new("idle", &log));
    scene.set_update_enabled(idle, false);

    scene.update(0.016);
    assert!(entries(&log).is_empty());
}

#[test]
fn destroy_cascades_and_is_swept_at_end_of_frame() {
    let mut scene = Scene::default();
    let log = new_log();
    let (a, b, c) = chain(&mut scene);
    let survivor = scene.spawn_actor(ActorBuilder::new("Survivor"));

    let sink = Arc::clone(&log);
    scene.add_observer(move |event: On<ActorDestroyed>| {
        sink.lock().unwrap().push(event.name.clone());
    });

    scene.destroy_actor(a);
    for e in [a, b, c] {
        assert_eq!(scene.actor_state(e), Some(ActorState::Destroyed));
    }
    // Flagged but not yet reclaimed.
    assert!(scene.actor(c).is_some());
    assert_eq!(scene.find_actor("b"), None);
    assert!(entries(&log).is_empty());

    scene.update(0.016);
    assert_eq!(entries(&log), vec!["A", "B", "C"]);
    for e in [a, b, c] {
        assert!(scene.actor(e).is_none());
    }
    assert_eq!(scene.actors(), vec![survivor]);
    assert_eq!(scene.find_actor("SURVIVOR"), Some(survivor));
}

#[test]
fn reclaimed_parent_leaves_no_dangling_links() {
    let mut scene = Scene::default();
    let parent = scene.spawn_actor(ActorBuilder::new("Parent").with_position(Vec3::new(5.0, 0.0, 0.0)));
    let child = scene.spawn_actor(ActorBuilder::new("Child"));
    scene.set_parent(child, Some(parent));

    scene.destroy_actor(child);
    scene.update(0.016);
    assert!(scene.transform(parent).unwrap().children().is_empty());
}

#[test]
fn commands_sent_through_the_bridge_apply_next_frame() {
    let mut scene = Scene::default();
    let actor = scene.spawn_actor(ActorBuilder::new("Loader target"));
    let tx = scene.resource::<SceneBridge>().sender();

    std::thread::spawn(move || {
        tx.send(SceneCommand::SetPosition {
            actor,
            position: Vec3::new(0.0, 9.0, 0.0),
        })
        .unwrap();
        tx.send(SceneCommand::Destroy { actor }).unwrap();
    })
    .join()
    .unwrap();

    assert!(scene.actor(actor).is_some());
    scene.update(0.016);
    assert!(scene.actor(actor).is_none());
}
