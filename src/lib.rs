//! Backtrack library.
//!
//! This module exposes the stage controller, the resource loader, the ECS
//! systems and events that connect them, and the session wiring, for use in
//! integration tests and by the `backtrack` binary.

pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
