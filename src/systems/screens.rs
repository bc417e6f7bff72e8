//! Observer collaborators of the stage controller.
//!
//! Each observer reacts to [`StageChangedEvent`] on its own, by matching on
//! the state the controller settled in:
//! - [`observe_stage_screens`] shows the screens of that state
//! - [`observe_stage_audio`] plays the menu track on the menu, pauses it elsewhere
//! - [`observe_stage_input`] accepts input outside the loading stages
//!
//! [`observe_stage_effect`] performs the effects transitions ask for. The
//! per-tick systems at the bottom advance the rendered world and the loading
//! overlay.

use crate::events::stage::{StageChangedEvent, StageEffectEvent};
use crate::resources::assets::{AssetKind, AssetLookup, ResourceLoader};
use crate::resources::audio::MenuTrack;
use crate::resources::input::InputState;
use crate::resources::navigation::{ERROR_VIEW, Navigator};
use crate::resources::overlay::LoadingOverlay;
use crate::resources::scene::SceneWorld;
use crate::resources::screens::{ScreenId, Screens};
use crate::resources::stage::{StageAction, StageState};
use crate::resources::worldtime::WorldTime;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

pub fn observe_stage_screens(trigger: On<StageChangedEvent>, mut screens: ResMut<Screens>) {
    screens.show_for(trigger.event().state);
}

pub fn observe_stage_audio(
    trigger: On<StageChangedEvent>,
    mut track: ResMut<MenuTrack>,
    loader: Option<Res<ResourceLoader>>,
) {
    if trigger.event().state != StageState::Menu {
        track.pause();
        return;
    }
    if !track.has_clip() {
        let lookup = loader
            .as_deref()
            .map(|loader| loader.get_asset(&track.asset, AssetKind::Audio));
        match lookup {
            Some(AssetLookup::Ready(clip)) => track.attach(clip),
            Some(AssetLookup::KindMismatch { actual, .. }) => {
                warn!("Menu track '{}' is a {} asset", track.asset, actual);
            }
            Some(AssetLookup::NotLoaded) | None => {}
        }
    }
    track.play_from_start();
}

pub fn observe_stage_input(trigger: On<StageChangedEvent>, mut input: ResMut<InputState>) {
    let state = trigger.event().state;
    let active = !state.is_loading() && state != StageState::LoadingError;
    if input.active != active {
        debug!("[input] {} in {}", if active { "enabled" } else { "disabled" }, state);
    }
    input.active = active;
}

pub fn observe_stage_effect(
    trigger: On<StageEffectEvent>,
    mut scene: ResMut<SceneWorld>,
    mut overlay: ResMut<LoadingOverlay>,
    mut screens: ResMut<Screens>,
    mut navigator: ResMut<Navigator>,
) {
    match trigger.event().action {
        StageAction::RenderWorld => {
            scene.render();
        }
        StageAction::HideLoadingOverlay => overlay.hide(),
        StageAction::SetUpRemainingScreens => screens.set_up_remaining(),
        StageAction::NavigateToErrorView => navigator.navigate(ERROR_VIEW),
        action @ (StageAction::RecordScore | StageAction::RecordName) => {
            warn!("{:?} is applied by the controller, not the shell", action);
        }
    }
}

/// Advance the rendered world while the level is on screen.
pub fn update_scene(mut scene: ResMut<SceneWorld>, screens: Res<Screens>) {
    if screens.is_visible(ScreenId::Level) {
        scene.update();
    }
}

/// Mirror loader progress on the overlay.
pub fn track_loading_progress(mut overlay: ResMut<LoadingOverlay>, loader: Res<ResourceLoader>) {
    overlay.set_progress(loader.progress().fraction());
}

pub fn advance_loading_overlay(time: Res<WorldTime>, mut overlay: ResMut<LoadingOverlay>) {
    overlay.advance(time.delta);
}
