//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution.
//!
//! Overview
//! - `actorregistry` – live actors in creation (update) order
//! - `engineconfig` – settings loaded from `config.ini`
//! - `listenerpose` – world pose of the active audio listener
//! - `scenebridge` – channel for scene commands sent from other threads
//! - `viewport` – root rect for UI layout
//! - `worldtime` – simulation time and delta
pub mod actorregistry;
pub mod engineconfig;
pub mod listenerpose;
pub mod scenebridge;
pub mod viewport;
pub mod worldtime;
