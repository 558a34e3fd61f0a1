//! Actor lifecycle operations on the ECS [`World`].
//!
//! Actors are entities; the [`ActorRegistry`] resource remembers their
//! creation order. Activity is hierarchical: an actor is active only when its
//! own state is [`ActorState::Active`] and every ancestor actor (found through
//! the transform parent chain) is active too.
//!
//! Destruction is two-phase. [`ActorOps::destroy_actor`] only flags the actor
//! and its descendants; the end-of-frame sweep
//! ([`sweep_destroyed_actors`](crate::systems::actors::sweep_destroyed_actors))
//! unlinks and despawns them, so handles stay valid for the rest of the frame.

use std::any::Any;

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::actor::{Actor, ActorState, TransformKind};
use crate::components::actorcomponent::{
    ActorComponent, ActorComponents, ComponentContext, ComponentSlot, Hook,
};
use crate::components::recttransform::RectTransform;
use crate::components::transform::Transform;
use crate::events::actor::{ActorActivated, ActorDeactivated, ActorUpdated};
use crate::math::{Quat, Vec3};
use crate::resources::actorregistry::ActorRegistry;
use crate::resources::engineconfig::EngineConfig;
use crate::scene::transform_ops::TransformOps;

/// Construction parameters for [`ActorOps::spawn_actor`].
#[derive(Debug, Clone)]
pub struct ActorBuilder {
    name: String,
    kind: TransformKind,
    rect: RectTransform,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    parent: Option<Entity>,
    time_scale: f32,
    active: bool,
}

impl ActorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TransformKind::Transform,
            rect: RectTransform::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
            time_scale: 1.0,
            active: true,
        }
    }

    /// Build the actor with a rect transform using this layout.
    pub fn with_rect(mut self, rect: RectTransform) -> Self {
        self.kind = TransformKind::RectTransform;
        self.rect = rect;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Spawn in the inactive state.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

pub trait ActorOps {
    fn spawn_actor(&mut self, builder: ActorBuilder) -> Entity;
    fn actor(&self, actor: Entity) -> Option<&Actor>;
    fn actor_state(&self, actor: Entity) -> Option<ActorState>;
    fn find_actor(&self, name: &str) -> Option<Entity>;
    /// Live actors in creation order, including ones flagged for destruction.
    fn actors(&self) -> Vec<Entity>;

    fn add_actor_component<T: ActorComponent>(&mut self, actor: Entity, component: T)
    -> Option<&mut T>;
    fn actor_component<T: ActorComponent>(&self, actor: Entity) -> Option<&T>;
    fn actor_component_mut<T: ActorComponent>(&mut self, actor: Entity) -> Option<&mut T>;
    fn set_component_enabled<T: ActorComponent>(&mut self, actor: Entity, enabled: bool);
    fn is_component_enabled<T: ActorComponent>(&self, actor: Entity) -> Option<bool>;
    fn is_active_and_enabled<T: ActorComponent>(&self, actor: Entity) -> bool;

    fn set_active(&mut self, actor: Entity, active: bool);
    fn is_active(&self, actor: Entity) -> bool;
    fn set_time_scale(&mut self, actor: Entity, time_scale: f32);
    fn set_update_enabled(&mut self, actor: Entity, update_enabled: bool);
    fn destroy_actor(&mut self, actor: Entity);

    fn update_actor(&mut self, actor: Entity, dt: f32);
    fn late_update_actor(&mut self, actor: Entity, dt: f32);
}

/// Run one hook on the component at `index`.
///
/// The component is taken out of its slot for the duration of the call. If it
/// is already out (the hook was requested from inside one of its own hooks),
/// the request is queued and replayed when the running hook returns.
pub(crate) fn run_component_hook(world: &mut World, actor: Entity, index: usize, hook: Hook) {
    let mut component = {
        let Some(mut comps) = world.get_mut::<ActorComponents>(actor) else {
            return;
        };
        let Some(slot) = comps.slots.get_mut(index) else {
            return;
        };
        match slot.component.take() {
            Some(component) => component,
            None => {
                slot.deferred.push(hook);
                return;
            }
        }
    };

    let mut next = Some(hook);
    while let Some(hook) = next {
        hook.dispatch(
            &mut *component,
            &mut ComponentContext {
                world: &mut *world,
                actor,
            },
        );

        // The actor may have been despawned from inside the hook.
        let Some(mut comps) = world.get_mut::<ActorComponents>(actor) else {
            return;
        };
        let slot = &mut comps.slots[index];
        if slot.deferred.is_empty() {
            slot.component = Some(component);
            return;
        }
        next = Some(slot.deferred.remove(0));
    }
}

fn component_enabled(world: &World, actor: Entity, index: usize) -> bool {
    world
        .get::<ActorComponents>(actor)
        .and_then(|comps| comps.is_enabled(index))
        .unwrap_or(false)
}

fn component_count(world: &World, actor: Entity) -> usize {
    world.get::<ActorComponents>(actor).map_or(0, ActorComponents::len)
}

impl ActorOps for World {
    fn spawn_actor(&mut self, builder: ActorBuilder) -> Entity {
        let pixel_perfect = self
            .get_resource::<EngineConfig>()
            .is_some_and(|c| c.pixel_perfect);

        let mut actor = Actor::new(builder.name);
        actor.time_scale = builder.time_scale;
        if !builder.active {
            actor.state = ActorState::Inactive;
        }
        let name = actor.name.clone();
        let transform = Transform::new(builder.position, builder.rotation, builder.scale);

        let id = self
            .spawn((actor, transform, ActorComponents::default()))
            .id();
        if builder.kind == TransformKind::RectTransform {
            let mut rect = builder.rect;
            rect.pixel_perfect |= pixel_perfect;
            self.entity_mut(id).insert(rect);
        }

        if !self.contains_resource::<ActorRegistry>() {
            self.init_resource::<ActorRegistry>();
        }
        self.resource_mut::<ActorRegistry>().register(id);

        if let Some(parent) = builder.parent {
            self.set_parent(id, Some(parent));
        }
        debug!("Spawned actor '{}' as {:?}", name, id);
        id
    }

    fn actor(&self, actor: Entity) -> Option<&Actor> {
        self.get::<Actor>(actor)
    }

    fn actor_state(&self, actor: Entity) -> Option<ActorState> {
        self.get::<Actor>(actor).map(|a| a.state)
    }

    fn find_actor(&self, name: &str) -> Option<Entity> {
        let registry = self.get_resource::<ActorRegistry>()?;
        registry.actors().iter().copied().find(|e| {
            self.get::<Actor>(*e)
                .is_some_and(|a| !a.is_destroyed() && a.name.eq_ignore_ascii_case(name))
        })
    }

    fn actors(&self) -> Vec<Entity> {
        self.get_resource::<ActorRegistry>()
            .map(|r| r.actors().to_vec())
            .unwrap_or_default()
    }

    fn add_actor_component<T: ActorComponent>(
        &mut self,
        actor: Entity,
        component: T,
    ) -> Option<&mut T> {
        let Some(comps) = self.get_mut::<ActorComponents>(actor) else {
            warn!("add_actor_component: {:?} is not an actor", actor);
            return None;
        };
        let comps = comps.into_inner();
        comps.slots.push(ComponentSlot::new(component));
        comps
            .slots
            .last_mut()?
            .component
            .as_deref_mut()
            .and_then(|c| (c as &mut dyn Any).downcast_mut::<T>())
    }

    fn actor_component<T: ActorComponent>(&self, actor: Entity) -> Option<&T> {
        self.get::<ActorComponents>(actor)?.get::<T>()
    }

    fn actor_component_mut<T: ActorComponent>(&mut self, actor: Entity) -> Option<&mut T> {
        self.get_mut::<ActorComponents>(actor)?
            .into_inner()
            .get_mut::<T>()
    }

    fn set_component_enabled<T: ActorComponent>(&mut self, actor: Entity, enabled: bool) {
        let index = {
            let Some(mut comps) = self.get_mut::<ActorComponents>(actor) else {
                return;
            };
            let Some(index) = comps.index_of::<T>() else {
                return;
            };
            let slot = &mut comps.slots[index];
            if slot.enabled == enabled {
                return;
            }
            slot.enabled = enabled;
            index
        };
        let hook = if enabled { Hook::Enable } else { Hook::Disable };
        run_component_hook(self, actor, index, hook);
    }

    fn is_component_enabled<T: ActorComponent>(&self, actor: Entity) -> Option<bool> {
        let comps = self.get::<ActorComponents>(actor)?;
        comps.is_enabled(comps.index_of::<T>()?)
    }

    fn is_active_and_enabled<T: ActorComponent>(&self, actor: Entity) -> bool {
        self.is_component_enabled::<T>(actor).unwrap_or(false) && self.is_active(actor)
    }

    fn set_active(&mut self, actor: Entity, active: bool) {
        let transition = {
            let Some(mut a) = self.get_mut::<Actor>(actor) else {
                return;
            };
            match (a.state, active) {
                (ActorState::Inactive, true) => {
                    a.state = ActorState::Active;
                    Hook::Enable
                }
                (ActorState::Active, false) => {
                    a.state = ActorState::Inactive;
                    Hook::Disable
                }
                _ => return,
            }
        };

        if transition == Hook::Enable {
            self.trigger(ActorActivated { actor });
        } else {
            self.trigger(ActorDeactivated { actor });
        }
        for index in 0..component_count(self, actor) {
            if component_enabled(self, actor, index) {
                run_component_hook(self, actor, index, transition);
            }
        }
    }

    fn is_active(&self, actor: Entity) -> bool {
        if self.get::<Actor>(actor).is_none() {
            return false;
        }
        let mut current = Some(actor);
        while let Some(node) = current {
            if let Some(a) = self.get::<Actor>(node)
                && a.state != ActorState::Active
            {
                return false;
            }
            current = self.get::<Transform>(node).and_then(|t| t.parent);
        }
        true
    }

    fn set_time_scale(&mut self, actor: Entity, time_scale: f32) {
        if let Some(mut a) = self.get_mut::<Actor>(actor) {
            a.time_scale = time_scale;
        }
    }

    fn set_update_enabled(&mut self, actor: Entity, update_enabled: bool) {
        if let Some(mut a) = self.get_mut::<Actor>(actor) {
            a.update_enabled = update_enabled;
        }
    }

    fn destroy_actor(&mut self, actor: Entity) {
        let mut pending = vec![actor];
        while let Some(node) = pending.pop() {
            if let Some(mut a) = self.get_mut::<Actor>(node)
                && a.state != ActorState::Destroyed
            {
                a.state = ActorState::Destroyed;
                debug!("Destroyed actor '{}' {:?}", a.name, node);
            }
            if let Some(t) = self.get::<Transform>(node) {
                pending.extend(t.children.iter().copied());
            }
        }
    }

    fn update_actor(&mut self, actor: Entity, dt: f32) {
        let Some(a) = self.get::<Actor>(actor) else {
            return;
        };
        if !a.update_enabled || !self.is_active(actor) {
            return;
        }
        let local_dt = dt * a.time_scale;

        self.trigger(ActorUpdated {
            actor,
            dt: local_dt,
        });
        for index in 0..component_count(self, actor) {
            if !self.is_active(actor) {
                break;
            }
            if component_enabled(self, actor, index) {
                run_component_hook(self, actor, index, Hook::Update(local_dt));
            }
        }
    }

    fn late_update_actor(&mut self, actor: Entity, dt: f32) {
        let Some(a) = self.get::<Actor>(actor) else {
            return;
        };
        if !a.update_enabled || !self.is_active(actor) {
            return;
        }
        let local_dt = dt * a.time_scale;
        for index in 0..component_count(self, actor) {
            if !self.is_active(actor) {
                break;
            }
            if component_enabled(self, actor, index) {
                run_component_hook(self, actor, index, Hook::LateUpdate(local_dt));
            }
        }
    }
}
