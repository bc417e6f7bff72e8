//! Backtrack main entry point.
//!
//! Runs one application session driven by:
//! - a **stage controller** sequencing loading, menu, level, pause, score
//!   and error stages
//! - a **resource loader** fetching the asset manifest on worker threads,
//!   high priority assets first
//! - **bevy_ecs** observers standing in for screens, audio, input and
//!   navigation
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --script play,play,play,end:20720,save:ada,next
//! ```
//!
//! Without `--script`, commands are read from stdin one per line.

use backtrack::game::Session;
use backtrack::resources::assets::AssetSet;
use backtrack::resources::gameconfig::GameConfig;
use backtrack::resources::input::InputState;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

/// Backtrack stage runner
#[derive(Parser)]
#[command(version, about = "Runs the stage controller and asset loader of a Backtrack session.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Asset manifest (overrides the configuration).
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Asset root directory (overrides the configuration).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Comma-separated commands to feed instead of reading stdin,
    /// e.g. `play,play,play,end:20720,save:ada,next`.
    #[arg(long, value_name = "EVENTS")]
    script: Option<String>,

    /// Stop after this many ticks (0 runs until input ends).
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Load everything in a single loading stage.
    #[arg(long)]
    single_phase: bool,

    /// Validate and list the asset manifest, then exit.
    #[arg(long)]
    print_manifest: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(manifest) = cli.manifest {
        config.manifest = manifest;
    }
    if let Some(root) = cli.root {
        config.asset_root = root;
    }
    if let Some(max_ticks) = cli.max_ticks {
        config.max_ticks = max_ticks;
    }
    if cli.single_phase {
        config.phased = false;
    }

    let assets = match AssetSet::from_manifest_file(&config.manifest) {
        Ok(assets) => assets,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Early-exit: list the manifest and quit (no session needed)
    if cli.print_manifest {
        for descriptor in assets.iter() {
            let paths: Vec<String> = descriptor
                .locator
                .paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            println!(
                "{:<24} {:<16} {:<5} {}",
                descriptor.name,
                descriptor.kind,
                format!("{:?}", descriptor.tier).to_lowercase(),
                paths.join(", ")
            );
        }
        return;
    }

    let input = match cli.script.as_deref() {
        Some(script) => InputState::from_script(script),
        None => InputState::stdin(),
    };

    let mut session = match Session::new(&config, assets, input) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = session.start() {
        error!("{}", e);
        std::process::exit(1);
    }

    // --------------- Main loop ---------------
    let ticks = session.run(config.max_ticks, config.tick());

    let state = session.state();
    let context = session.context().clone();
    info!(
        "Session ended after {} ticks in {:?} (score {:?}, player {:?})",
        ticks, state, context.score, context.player_name
    );
    session.teardown();
}
