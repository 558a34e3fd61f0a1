//! Timed movement of an actor in world space.
//!
//! A [`Mover`] interpolates from wherever its actor stands when the move
//! starts to a world-space target over a fixed duration, so the result does
//! not depend on how the actor is parented. On arrival it signals its
//! [`WaitHandle`] (so a script blocked in a wait block can resume) and
//! disables itself. Re-enabling it, or [`Mover::retarget`], starts a new move.
//!
//! Disabling an unfinished move, directly or by deactivating the actor,
//! places the actor at the target and completes the move.

use crate::components::actorcomponent::{ActorComponent, ComponentContext};
use crate::math::Vec3;
use crate::scene::actor_ops::ActorOps;
use crate::scene::transform_ops::TransformOps;
use crate::sheep::sysfunc::WaitHandle;

/// Interpolation curve applied to normalized progress.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
}

pub(crate) fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
    }
}

#[derive(Debug)]
pub struct Mover {
    /// World position captured on the first update of a move.
    from: Option<Vec3>,
    /// World-space destination.
    target: Vec3,
    /// Seconds; zero or less snaps on the first update.
    duration: f32,
    elapsed: f32,
    easing: Easing,
    finished: bool,
    done: Option<WaitHandle>,
}

impl Mover {
    pub fn new(target: Vec3, duration: f32) -> Self {
        Mover {
            from: None,
            target,
            duration,
            elapsed: 0.0,
            easing: Easing::Linear,
            finished: false,
            done: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_wait_handle(mut self, handle: WaitHandle) -> Self {
        self.done = Some(handle);
        self
    }

    /// Start a new move from the current position. A handle belonging to an
    /// unfinished previous move is completed, since that move will never
    /// arrive.
    pub fn retarget(&mut self, target: Vec3, duration: f32, handle: Option<WaitHandle>) {
        if let Some(previous) = self.done.take() {
            previous.complete();
        }
        self.from = None;
        self.target = target;
        self.duration = duration;
        self.elapsed = 0.0;
        self.finished = false;
        self.done = handle;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(handle) = self.done.take() {
            handle.complete();
        }
    }

    /// Normalized progress of the current move.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            if self.from.is_some() { 1.0 } else { 0.0 }
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

impl ActorComponent for Mover {
    fn on_enable(&mut self, _ctx: &mut ComponentContext<'_>) {
        if self.finished {
            let target = self.target;
            let duration = self.duration;
            self.retarget(target, duration, None);
        }
    }

    fn on_disable(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.finished {
            return;
        }
        ctx.world.set_world_position(ctx.actor, self.target);
        self.finish();
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {
        if self.finished {
            return;
        }
        let Some(start) = ctx.world.world_position(ctx.actor) else {
            return;
        };
        let from = *self.from.get_or_insert(start);
        self.elapsed += dt;
        let t = self.progress();
        ctx.world
            .set_world_position(ctx.actor, from.lerp(self.target, ease(self.easing, t)));

        if t >= 1.0 {
            self.finish();
            ctx.world.set_component_enabled::<Mover>(ctx.actor, false);
        }
    }
}

impl Drop for Mover {
    fn drop(&mut self) {
        // Release any script still waiting on this move.
        if let Some(handle) = self.done.take() {
            handle.complete();
        }
    }
}
