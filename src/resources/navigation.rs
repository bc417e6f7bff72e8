//! Navigation collaborator: records which view the application was sent to.

use bevy_ecs::prelude::*;
use log::info;

/// Target of the `NavigateToErrorView` effect.
pub const ERROR_VIEW: &str = "error";

#[derive(Resource, Debug, Clone, Default)]
pub struct Navigator {
    history: Vec<String>,
}

impl Navigator {
    pub fn navigate(&mut self, target: &str) {
        info!("Navigating to '{}'", target);
        self.history.push(target.to_string());
    }

    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Number of times `target` was navigated to.
    pub fn visits(&self, target: &str) -> usize {
        self.history.iter().filter(|t| *t == target).count()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}
