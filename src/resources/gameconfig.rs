//! Game configuration resource.
//!
//! Manages session settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [assets]
//! manifest = ./assets/manifest.json
//! root = ./assets
//! menu_track = menuTrack
//!
//! [loader]
//! workers = 4
//! phased = true
//!
//! [session]
//! tick_ms = 16
//! max_ticks = 0
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::resources::stage::LoadingMode;

/// Default safe values for startup
const DEFAULT_MANIFEST: &str = "./assets/manifest.json";
const DEFAULT_ASSET_ROOT: &str = "./assets";
const DEFAULT_MENU_TRACK: &str = "menuTrack";
const DEFAULT_WORKERS: u32 = 4;
const DEFAULT_PHASED: bool = true;
const DEFAULT_TICK_MS: u64 = 16;
const DEFAULT_MAX_TICKS: u64 = 0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Game configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// JSON asset manifest.
    pub manifest: PathBuf,
    /// Directory asset locators are relative to.
    pub asset_root: PathBuf,
    /// Name of the audio asset played on the menu.
    pub menu_track: String,
    /// Loader worker threads.
    pub workers: u32,
    /// Load in two phases (high priority, then the rest in the background).
    pub phased: bool,
    /// Milliseconds between ticks.
    pub tick_ms: u64,
    /// Stop after this many ticks; 0 runs until input ends.
    pub max_ticks: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            menu_track: DEFAULT_MENU_TRACK.to_string(),
            workers: DEFAULT_WORKERS,
            phased: DEFAULT_PHASED,
            tick_ms: DEFAULT_TICK_MS,
            max_ticks: DEFAULT_MAX_TICKS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [assets] section
        if let Some(manifest) = config.get("assets", "manifest") {
            self.manifest = PathBuf::from(manifest);
        }
        if let Some(root) = config.get("assets", "root") {
            self.asset_root = PathBuf::from(root);
        }
        if let Some(track) = config.get("assets", "menu_track") {
            self.menu_track = track;
        }

        // [loader] section
        if let Some(workers) = config.getuint("loader", "workers").ok().flatten() {
            self.workers = (workers as u32).max(1);
        }
        if let Some(phased) = config.getbool("loader", "phased").ok().flatten() {
            self.phased = phased;
        }

        // [session] section
        if let Some(tick_ms) = config.getuint("session", "tick_ms").ok().flatten() {
            self.tick_ms = tick_ms;
        }
        if let Some(max_ticks) = config.getuint("session", "max_ticks").ok().flatten() {
            self.max_ticks = max_ticks;
        }

        info!(
            "Loaded config: manifest={:?}, root={:?}, workers={}, phased={}, tick={}ms, max_ticks={}",
            self.manifest, self.asset_root, self.workers, self.phased, self.tick_ms, self.max_ticks
        );
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [assets] section
        config.set(
            "assets",
            "manifest",
            Some(self.manifest.display().to_string()),
        );
        config.set("assets", "root", Some(self.asset_root.display().to_string()));
        config.set("assets", "menu_track", Some(self.menu_track.clone()));

        // [loader] section
        config.set("loader", "workers", Some(self.workers.to_string()));
        config.set("loader", "phased", Some(self.phased.to_string()));

        // [session] section
        config.set("session", "tick_ms", Some(self.tick_ms.to_string()));
        config.set("session", "max_ticks", Some(self.max_ticks.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn loading_mode(&self) -> LoadingMode {
        if self.phased {
            LoadingMode::Phased
        } else {
            LoadingMode::Single
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[loader]\nphased = false\n\n[session]\nmax_ticks = 300\n")
            .unwrap();
        assert_eq!(config.loading_mode(), LoadingMode::Single);
        assert_eq!(config.max_ticks, 300);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.manifest, PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(config.tick(), Duration::from_millis(16));
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[loader]\nworkers = 0\n[assets]\nroot = /srv/assets\n")
            .unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(config.asset_root, PathBuf::from("/srv/assets"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = GameConfig::with_path("/nonexistent/backtrack/config.ini");
        assert!(config.load_from_file().is_err());
        assert!(config.phased);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("backtrack-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ini");

        let mut saved = GameConfig::with_path(&path);
        saved.workers = 2;
        saved.menu_track = "theme".into();
        saved.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.workers, 2);
        assert_eq!(loaded.menu_track, "theme");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
