//! Engine systems.
//!
//! Exclusive systems (`fn(&mut World)`) that advance the scene one frame.
//! [`Scene`](crate::scene::Scene) chains them in this order:
//!
//! - [`scenebridge`] – apply mutations queued from other threads
//! - [`sheep`] – resume script threads
//! - [`actors`] – update, then late-update, every actor in creation order,
//!   then reclaim actors destroyed during the frame
//!
//! [`time`] runs before the schedule, since it needs the raw frame delta.

pub mod actors;
pub mod scenebridge;
pub mod sheep;
pub mod time;
