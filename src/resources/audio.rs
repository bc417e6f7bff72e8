//! Menu music playback state.
//!
//! Audio output itself is not part of this crate; [`MenuTrack`] tracks what
//! the audio collaborator is asked to do. The clip is taken from the loader
//! the first time the menu is entered.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::resources::assets::LoadedAsset;

#[derive(Resource, Debug, Clone)]
pub struct MenuTrack {
    /// Name of the audio asset to play.
    pub asset: String,
    clip: Option<LoadedAsset>,
    playing: bool,
    looped: bool,
    starts: u32,
}

impl MenuTrack {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            clip: None,
            playing: false,
            looped: false,
            starts: 0,
        }
    }

    pub fn attach(&mut self, clip: LoadedAsset) {
        self.clip = Some(clip);
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    /// Play from the beginning, looping. Returns false without a clip.
    pub fn play_from_start(&mut self) -> bool {
        if self.clip.is_none() {
            warn!("Menu track '{}' is not loaded", self.asset);
            return false;
        }
        debug!("[audio] play start id='{}' looped=true", self.asset);
        self.playing = true;
        self.looped = true;
        self.starts += 1;
        true
    }

    pub fn pause(&mut self) {
        if self.playing {
            debug!("[audio] pause id='{}'", self.asset);
            self.playing = false;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// How many times playback was started from the beginning.
    pub fn starts(&self) -> u32 {
        self.starts
    }
}
