//! Screen visibility.
//!
//! Screens are shown and hidden by pattern-matching on the stage the
//! controller settled in (see [`ScreenId::for_state`]). The start screen is
//! available from the beginning and stays up while background assets load.
//! With phased loading the other screens only exist once the
//! `SetUpRemainingScreens` effect ran; a screen that is not set up is never
//! shown.

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashSet;
use std::fmt;

use crate::resources::stage::{LoadingMode, StageState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Start,
    Menu,
    Tutorial,
    Leaderboard,
    Level,
    Pause,
    Score,
}

impl ScreenId {
    pub const ALL: [ScreenId; 7] = [
        ScreenId::Start,
        ScreenId::Menu,
        ScreenId::Tutorial,
        ScreenId::Leaderboard,
        ScreenId::Level,
        ScreenId::Pause,
        ScreenId::Score,
    ];

    /// The screen visible while the controller is in `state`.
    pub fn for_state(state: StageState) -> Option<ScreenId> {
        match state {
            StageState::Start | StageState::LoadingBackground => Some(ScreenId::Start),
            StageState::Menu => Some(ScreenId::Menu),
            StageState::Tutorial => Some(ScreenId::Tutorial),
            StageState::Leaderboard => Some(ScreenId::Leaderboard),
            StageState::Level => Some(ScreenId::Level),
            StageState::Pause => Some(ScreenId::Pause),
            StageState::Score | StageState::SavingScore => Some(ScreenId::Score),
            StageState::Loading | StageState::LoadingError => None,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Screens {
    set_up: FxHashSet<ScreenId>,
    visible: Option<ScreenId>,
}

impl Default for Screens {
    fn default() -> Self {
        Self::new()
    }
}

impl Screens {
    /// Only the start screen is set up.
    pub fn new() -> Self {
        let mut set_up = FxHashSet::default();
        set_up.insert(ScreenId::Start);
        Self {
            set_up,
            visible: None,
        }
    }

    /// Single-phase loading has no step that sets the remaining screens up,
    /// so they are all ready from the start.
    pub fn for_mode(mode: LoadingMode) -> Self {
        let mut screens = Self::new();
        if mode == LoadingMode::Single {
            screens.set_up_remaining();
        }
        screens
    }

    /// Set up every screen besides the start screen.
    pub fn set_up_remaining(&mut self) {
        for screen in ScreenId::ALL {
            if self.set_up.insert(screen) {
                debug!("Screen {} set up", screen);
            }
        }
    }

    /// Show the screen belonging to `state` and hide every other one.
    pub fn show_for(&mut self, state: StageState) {
        let wanted = ScreenId::for_state(state).filter(|screen| {
            let ready = self.set_up.contains(screen);
            if !ready {
                warn!("Screen {} is not set up; nothing shown in {}", screen, state);
            }
            ready
        });
        if self.visible != wanted {
            debug!("Showing {:?} instead of {:?}", wanted, self.visible);
        }
        self.visible = wanted;
    }

    pub fn is_visible(&self, screen: ScreenId) -> bool {
        self.visible == Some(screen)
    }

    pub fn is_set_up(&self, screen: ScreenId) -> bool {
        self.set_up.contains(&screen)
    }

    pub fn visible(&self) -> &[ScreenId] {
        self.visible.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_the_matching_screen_is_visible() {
        let mut screens = Screens::for_mode(LoadingMode::Single);
        screens.show_for(StageState::Menu);
        assert_eq!(screens.visible(), &[ScreenId::Menu]);
        screens.show_for(StageState::SavingScore);
        assert!(screens.is_visible(ScreenId::Score));
        assert!(!screens.is_visible(ScreenId::Menu));
        screens.show_for(StageState::LoadingError);
        assert!(screens.visible().is_empty());
    }

    #[test]
    fn test_start_screen_stays_up_while_background_assets_load() {
        let mut screens = Screens::for_mode(LoadingMode::Phased);
        screens.show_for(StageState::Loading);
        assert!(screens.visible().is_empty());
        screens.show_for(StageState::LoadingBackground);
        assert_eq!(screens.visible(), &[ScreenId::Start]);
    }

    #[test]
    fn test_screens_are_not_shown_before_they_are_set_up() {
        let mut screens = Screens::for_mode(LoadingMode::Phased);
        assert!(screens.is_set_up(ScreenId::Start));
        assert!(!screens.is_set_up(ScreenId::Menu));

        screens.show_for(StageState::Menu);
        assert!(screens.visible().is_empty());
        assert!(!screens.is_set_up(ScreenId::Menu));

        screens.set_up_remaining();
        screens.show_for(StageState::Menu);
        assert_eq!(screens.visible(), &[ScreenId::Menu]);
        assert!(ScreenId::ALL.iter().all(|s| screens.is_set_up(*s)));
    }
}
