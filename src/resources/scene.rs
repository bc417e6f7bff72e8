//! The rendered world.
//!
//! The world is rendered once, by the `RenderWorld` effect when loading
//! completes. After that it advances one frame per tick while the level
//! screen is visible.

use bevy_ecs::prelude::*;
use log::{info, warn};

#[derive(Resource, Debug, Clone, Default)]
pub struct SceneWorld {
    rendered: bool,
    frames: u64,
}

impl SceneWorld {
    /// Returns false if the world was already rendered.
    pub fn render(&mut self) -> bool {
        if self.rendered {
            warn!("World already rendered");
            return false;
        }
        info!("Rendering world");
        self.rendered = true;
        true
    }

    pub fn update(&mut self) {
        if self.rendered {
            self.frames += 1;
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
