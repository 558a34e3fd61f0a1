//! ECS components for actors.
//!
//! An actor entity carries [`actor::Actor`], a [`transform::Transform`], an
//! optional [`recttransform::RectTransform`] and an
//! [`actorcomponent::ActorComponents`] list of behaviors.
//!
//! Submodules overview:
//! - [`actor`] – actor name, lifecycle state and time scale
//! - [`actorcomponent`] – the behavior trait, its hooks and per-actor storage
//! - [`audiolistener`] – publishes the actor's world pose for 3D audio
//! - [`mover`] – timed movement toward a target, waitable from scripts
//! - [`recttransform`] – anchor/pivot layout against the parent rect
//! - [`transform`] – local position/rotation/scale and cached world matrices

pub mod actor;
pub mod actorcomponent;
pub mod audiolistener;
pub mod mover;
pub mod recttransform;
pub mod transform;
