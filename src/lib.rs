//! gengine library.
//!
//! Core runtime of a 3D adventure engine: a transform hierarchy with lazily
//! computed world matrices, anchor/pivot UI layout, actors with pluggable
//! behavior components, and the Sheep scripting VM. Everything lives in a
//! `bevy_ecs` world; see [`scene::Scene`] for the frame loop.

pub mod components;
pub mod events;
pub mod math;
pub mod resources;
pub mod scene;
pub mod sheep;
pub mod systems;
