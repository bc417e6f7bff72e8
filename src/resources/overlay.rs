//! Loading overlay shown while the loading stage runs.

use bevy_ecs::prelude::*;

/// Duration of the fade out once the overlay is hidden.
pub const FADE_SECONDS: f32 = 1.8;

#[derive(Resource, Debug, Clone)]
pub struct LoadingOverlay {
    alpha: f32,
    progress: f32,
    visible: bool,
    fade_elapsed: Option<f32>,
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            progress: 0.0,
            visible: true,
            fade_elapsed: None,
        }
    }
}

impl LoadingOverlay {
    /// Start fading out. Does nothing if already fading or hidden.
    pub fn hide(&mut self) {
        if self.visible && self.fade_elapsed.is_none() {
            self.fade_elapsed = Some(0.0);
        }
    }

    /// Advance the fade by `dt` seconds, easing out.
    pub fn advance(&mut self, dt: f32) {
        let Some(elapsed) = self.fade_elapsed.as_mut() else {
            return;
        };
        *elapsed += dt;
        let t = (*elapsed / FADE_SECONDS).clamp(0.0, 1.0);
        // 1 - ease_out(t), with ease_out(t) = 1 - (1 - t)^2
        self.alpha = (1.0 - t) * (1.0 - t);
        if t >= 1.0 {
            self.alpha = 0.0;
            self.visible = false;
            self.fade_elapsed = None;
        }
    }

    pub fn set_progress(&mut self, fraction: f32) {
        self.progress = fraction.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_fading(&self) -> bool {
        self.fade_elapsed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_eases_out_then_hides() {
        let mut overlay = LoadingOverlay::default();
        overlay.advance(1.0);
        assert_eq!(overlay.alpha(), 1.0);

        overlay.hide();
        overlay.advance(0.9);
        assert!((overlay.alpha() - 0.25).abs() < 1e-5);
        assert!(overlay.is_visible());

        overlay.advance(1.0);
        assert_eq!(overlay.alpha(), 0.0);
        assert!(!overlay.is_visible());
        assert!(!overlay.is_fading());
    }
}
