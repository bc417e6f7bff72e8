//! Session integration tests: the full bevy schedule wiring the stage
//! controller, the resource loader and the observer collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, bounded};

use backtrack::game::Session;
use backtrack::resources::assets::handle::AudioClip;
use backtrack::resources::assets::{
    AssetData, AssetDescriptor, AssetKind, AssetSet, LoadError, ResourceLoader, SubLoader, Tier,
};
use backtrack::resources::audio::MenuTrack;
use backtrack::resources::gameconfig::GameConfig;
use backtrack::resources::input::InputState;
use backtrack::resources::navigation::{ERROR_VIEW, Navigator};
use backtrack::resources::overlay::LoadingOverlay;
use backtrack::resources::scene::SceneWorld;
use backtrack::resources::screens::{ScreenId, Screens};
use backtrack::resources::stage::{StageController, StageEvent, StageState, Transition};
use backtrack::resources::worldtime::WorldTime;

const MAX_TICKS: u64 = 5000;

fn fixture_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("backtrack-session-{}-{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(root: &PathBuf, phased: bool) -> GameConfig {
    GameConfig {
        asset_root: root.clone(),
        phased,
        tick_ms: 1,
        workers: 2,
        ..GameConfig::new()
    }
}

fn write_assets(root: &PathBuf) -> AssetSet {
    std::fs::write(root.join("menu.ogg"), b"OggS\0\0").unwrap();
    std::fs::write(root.join("logo.svg"), "<svg><path d=\"M0 0\"/></svg>").unwrap();
    std::fs::write(root.join("ground.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    AssetSet::from_manifest_str(
        r#"{
            "logo": { "kind": "svg", "path": "logo.svg" },
            "menuTrack": { "kind": "audio", "path": "menu.ogg", "tier": "low" },
            "ground": { "kind": "texture", "path": "ground.jpg", "tier": "low" }
        }"#,
    )
    .unwrap()
}

#[test]
fn loading_failure_navigates_to_the_error_view_once() {
    let root = fixture_dir("failure");
    let assets = AssetSet::from_manifest_str(
        r#"{ "ground": { "kind": "texture", "path": "missing.png" } }"#,
    )
    .unwrap();
    let mut session = Session::new(
        &config(&root, true),
        assets,
        InputState::scripted(["play", "play"]),
    )
    .unwrap();
    session.start().unwrap();

    session.run(MAX_TICKS, Duration::from_millis(1));
    assert_eq!(session.state(), Some(StageState::LoadingError));
    assert!(session.is_finished());

    let moved = session
        .world_mut()
        .resource_mut::<StageController>()
        .send(StageEvent::Play)
        .unwrap();
    assert_eq!(moved, Transition::Ignored);
    for _ in 0..5 {
        session.tick();
    }

    assert_eq!(session.state(), Some(StageState::LoadingError));
    let navigator = session.world().resource::<Navigator>();
    assert_eq!(navigator.visits(ERROR_VIEW), 1);
    assert_eq!(navigator.history().len(), 1);
    assert!(session.world().resource::<Screens>().visible().is_empty());
    assert!(!session.world().resource::<InputState>().active);

    session.teardown();
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn scripted_session_reaches_the_leaderboard() {
    let root = fixture_dir("happy");
    let assets = write_assets(&root);
    let mut session = Session::new(
        &config(&root, true),
        assets,
        InputState::from_script("play,play,play,end:20720,save:ada,next"),
    )
    .unwrap();
    session.start().unwrap();

    let ticks = session.run(MAX_TICKS, Duration::from_millis(1));
    assert!(ticks < MAX_TICKS);

    assert_eq!(session.state(), Some(StageState::Leaderboard));
    assert_eq!(session.context().score, Some(20720));
    assert_eq!(session.context().player_name.as_deref(), Some("ada"));

    let world = session.world();
    let scene = world.resource::<SceneWorld>();
    assert!(scene.is_rendered());
    assert!(scene.frames() >= 1);

    let track = world.resource::<MenuTrack>();
    assert_eq!(track.starts(), 1);
    assert!(track.is_looped());
    assert!(!track.is_playing());

    let screens = world.resource::<Screens>();
    assert_eq!(screens.visible(), &[ScreenId::Leaderboard]);
    assert!(ScreenId::ALL.iter().all(|s| screens.is_set_up(*s)));

    let overlay = world.resource::<LoadingOverlay>();
    assert!(overlay.is_fading() || !overlay.is_visible());

    assert!(world.resource::<ResourceLoader>().is_done());
    assert_eq!(world.resource::<Navigator>().visits(ERROR_VIEW), 0);
    assert_eq!(world.resource::<WorldTime>().ticks, ticks);

    session.teardown();
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn single_phase_loading_goes_straight_to_start() {
    let root = fixture_dir("single");
    let assets = write_assets(&root);
    let mut session =
        Session::new(&config(&root, false), assets, InputState::scripted(["space"])).unwrap();
    session.start().unwrap();

    session.run(MAX_TICKS, Duration::from_millis(1));

    assert_eq!(session.state(), Some(StageState::Menu));
    let world = session.world();
    assert!(world.resource::<MenuTrack>().is_playing());
    assert!(world.resource::<Screens>().is_visible(ScreenId::Menu));

    session.teardown();
    let _ = std::fs::remove_dir_all(&root);
}

/// Audio sub-loader that holds every load until the test lets it through.
struct HeldAudio {
    release: Receiver<()>,
}

impl SubLoader for HeldAudio {
    fn load(&self, descriptor: &AssetDescriptor) -> Result<AssetData, LoadError> {
        self.release.recv().map_err(|_| LoadError::Failed {
            name: descriptor.name.clone(),
            reason: "released without loading".into(),
        })?;
        Ok(AssetData::Audio(AudioClip::from_bytes(b"OggS".to_vec())))
    }
}

#[test]
fn start_screen_is_shown_while_background_assets_load() {
    let root = fixture_dir("background");
    std::fs::write(root.join("logo.svg"), "<svg><path d=\"M0 0\"/></svg>").unwrap();
    let assets = AssetSet::new([
        AssetDescriptor::new("logo", AssetKind::VectorGraphic, "logo.svg", Tier::High),
        AssetDescriptor::new("menuTrack", AssetKind::Audio, "menu.ogg", Tier::Low),
    ])
    .unwrap();
    let config = config(&root, true);
    let (release, held) = bounded(1);
    let mut loader = ResourceLoader::new(assets, &root).unwrap().with_workers(2);
    let held = Arc::new(HeldAudio { release: held });
    loader.register_sub_loader(AssetKind::Audio, move |_root: &Path| {
        held.clone() as Arc<dyn SubLoader>
    });
    let mut session = Session::with_loader(&config, loader, InputState::scripted(["play"]));
    session.start().unwrap();

    for _ in 0..MAX_TICKS {
        if session.state() == Some(StageState::LoadingBackground) {
            break;
        }
        session.tick();
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(session.state(), Some(StageState::LoadingBackground));
    for _ in 0..5 {
        session.tick();
    }

    {
        let world = session.world();
        let screens = world.resource::<Screens>();
        assert_eq!(screens.visible(), &[ScreenId::Start]);
        assert!(!screens.is_set_up(ScreenId::Menu));
        let overlay = world.resource::<LoadingOverlay>();
        assert!(overlay.is_fading() || !overlay.is_visible());
        assert!(world.resource::<SceneWorld>().is_rendered());
        // The queued command waits for the background load instead of being dropped.
        assert!(!world.resource::<InputState>().active);
        assert!(!world.resource::<InputState>().is_exhausted());
    }
    assert_eq!(session.state(), Some(StageState::LoadingBackground));

    release.send(()).unwrap();
    session.run(MAX_TICKS, Duration::from_millis(1));

    assert_eq!(session.state(), Some(StageState::Menu));
    let screens = session.world().resource::<Screens>();
    assert_eq!(screens.visible(), &[ScreenId::Menu]);
    assert!(ScreenId::ALL.iter().all(|s| screens.is_set_up(*s)));
    assert!(session.world().resource::<MenuTrack>().is_playing());

    session.teardown();
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn nothing_moves_after_teardown() {
    let root = fixture_dir("teardown");
    let assets = write_assets(&root);
    let mut session =
        Session::new(&config(&root, true), assets, InputState::scripted(["play"])).unwrap();
    session.start().unwrap();
    session.teardown();

    for _ in 0..20 {
        session.tick();
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(session.state(), Some(StageState::Loading));
    assert!(session.is_finished());
    assert!(!session.world().resource::<SceneWorld>().is_rendered());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_asset_root_is_rejected() {
    let root = std::env::temp_dir().join("backtrack-session-no-such-root");
    let result = Session::new(
        &config(&root, true),
        AssetSet::default(),
        InputState::scripted(Vec::<String>::new()),
    );
    assert!(result.is_err());
}
