//! Event types used by the engine.
//!
//! Submodules:
//! - [`actor`] – actor lifecycle notifications (activation, update, destruction)
pub mod actor;
