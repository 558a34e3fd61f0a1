//! Behavior units attached to actors.
//!
//! A behavior is any type implementing [`ActorComponent`]. Actors own their
//! behaviors in an [`ActorComponents`] list, in insertion order. Lookups by
//! type use [`Any`] downcasting, so `T` must be the exact concrete type.
//!
//! Hooks receive a [`ComponentContext`] with mutable access to the whole
//! [`World`], which lets a behavior move its own transform, look up other
//! actors, or add components. While a behavior is executing it is taken out of
//! its slot; hooks requested on it during that time are queued and run as soon
//! as it returns.

use std::any::{Any, TypeId};
use std::fmt;

use bevy_ecs::prelude::*;
use smallvec::SmallVec;

/// Lifecycle hooks of a behavior. Every hook defaults to a no-op.
pub trait ActorComponent: Any + Send + Sync {
    /// Called when the component becomes enabled, or its actor becomes active.
    fn on_enable(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the component becomes disabled, or its actor becomes inactive.
    fn on_disable(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Per-frame update. `dt` is already scaled by the actor's time scale.
    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {}

    /// Runs after every actor has been updated this frame.
    fn on_late_update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {}
}

/// Access handed to component hooks.
pub struct ComponentContext<'w> {
    pub world: &'w mut World,
    pub actor: Entity,
}

impl fmt::Debug for ComponentContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Hook {
    Enable,
    Disable,
    Update(f32),
    LateUpdate(f32),
}

impl Hook {
    pub(crate) fn dispatch(self, component: &mut dyn ActorComponent, ctx: &mut ComponentContext<'_>) {
        match self {
            Hook::Enable => component.on_enable(ctx),
            Hook::Disable => component.on_disable(ctx),
            Hook::Update(dt) => component.on_update(ctx, dt),
            Hook::LateUpdate(dt) => component.on_late_update(ctx, dt),
        }
    }
}

pub(crate) struct ComponentSlot {
    pub(crate) type_id: TypeId,
    pub(crate) enabled: bool,
    /// `None` while the component is executing one of its hooks.
    pub(crate) component: Option<Box<dyn ActorComponent>>,
    pub(crate) deferred: SmallVec<[Hook; 2]>,
}

impl ComponentSlot {
    pub(crate) fn new<T: ActorComponent>(component: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            enabled: true,
            component: Some(Box::new(component)),
            deferred: SmallVec::new(),
        }
    }

    pub(crate) fn is<T: ActorComponent>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Owned behaviors of an actor, in insertion order.
#[derive(Component, Default)]
pub struct ActorComponents {
    pub(crate) slots: Vec<ComponentSlot>,
}

impl fmt::Debug for ActorComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorComponents")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl ActorComponents {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the first component of type `T`, executing or not.
    pub fn index_of<T: ActorComponent>(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is::<T>())
    }

    /// First component of type `T`, unless it is currently executing.
    pub fn get<T: ActorComponent>(&self) -> Option<&T> {
        self.slots.iter().find_map(|slot| {
            slot.component
                .as_deref()
                .and_then(|c| (c as &dyn Any).downcast_ref::<T>())
        })
    }

    pub fn get_mut<T: ActorComponent>(&mut self) -> Option<&mut T> {
        self.slots.iter_mut().find_map(|slot| {
            slot.component
                .as_deref_mut()
                .and_then(|c| (c as &mut dyn Any).downcast_mut::<T>())
        })
    }

    pub fn is_enabled(&self, index: usize) -> Option<bool> {
        self.slots.get(index).map(|slot| slot.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);
    impl ActorComponent for Counter {}

    struct Other;
    impl ActorComponent for Other {}

    #[test]
    fn lookup_by_exact_type() {
        let mut comps = ActorComponents::default();
        comps.slots.push(ComponentSlot::new(Other));
        comps.slots.push(ComponentSlot::new(Counter(7)));
        assert_eq!(comps.len(), 2);
        assert_eq!(comps.index_of::<Counter>(), Some(1));
        assert_eq!(comps.get::<Counter>().map(|c| c.0), Some(7));
        comps.get_mut::<Counter>().unwrap().0 = 9;
        assert_eq!(comps.get::<Counter>().map(|c| c.0), Some(9));
    }

    #[test]
    fn missing_type_is_none() {
        let mut comps = ActorComponents::default();
        comps.slots.push(ComponentSlot::new(Other));
        assert!(comps.get::<Counter>().is_none());
        assert!(comps.index_of::<Counter>().is_none());
    }

    #[test]
    fn executing_component_is_hidden() {
        let mut comps = ActorComponents::default();
        comps.slots.push(ComponentSlot::new(Counter(1)));
        let taken = comps.slots[0].component.take();
        assert!(comps.get::<Counter>().is_none());
        assert_eq!(comps.index_of::<Counter>(), Some(0));
        comps.slots[0].component = taken;
        assert!(comps.get::<Counter>().is_some());
    }
}
