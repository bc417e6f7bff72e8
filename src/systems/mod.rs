//! Session systems.
//!
//! Submodules overview
//! - [`assets`] – loader worker threads and the per-tick loader poll
//! - [`input`] – turn text commands into [`crate::events::stage::StageInput`]
//! - [`screens`] – observers for stage changes and effects, world and overlay updates
//! - [`stage`] – feed input into the controller and drain its outputs
//! - [`time`] – advance [`crate::resources::worldtime::WorldTime`]

pub mod assets;
pub mod input;
pub mod screens;
pub mod stage;
pub mod time;
