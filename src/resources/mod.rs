//! ECS resources made available to systems.
//!
//! Overview
//! - `assets` – declared assets, sub-loaders and the resource loader
//! - `audio` – menu track playback state
//! - `gameconfig` – INI-backed session configuration
//! - `input` – text input source and its active flag
//! - `navigation` – the view the application was navigated to
//! - `overlay` – loading overlay progress and fade
//! - `scene` – the rendered world
//! - `screens` – screen visibility per stage
//! - `stage` – the stage controller and its bridge to the world
//! - `worldtime` – session time and tick count
pub mod assets;
pub mod audio;
pub mod gameconfig;
pub mod input;
pub mod navigation;
pub mod overlay;
pub mod scene;
pub mod screens;
pub mod stage;
pub mod worldtime;
