//! Event types exchanged across systems.
//!
//! Submodules:
//! - [`assets`] – jobs and completions of the loader workers, loader notifications
//! - [`stage`] – controller outputs (state changes, effects) and user input messages
pub mod assets;
pub mod stage;
