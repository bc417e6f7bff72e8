//! Session wiring.
//!
//! A [`Session`] owns the ECS [`World`] holding the [`StageController`], the
//! [`ResourceLoader`] and the observer collaborators, plus the per-tick
//! [`Schedule`] that connects them:
//!
//! 1. user input is read and forwarded to the controller
//! 2. the loader applies worker completions and settles loading tasks
//! 3. the controller applies task outcomes (`Done`/`Error`)
//! 4. controller outputs become observer triggers
//! 5. the rendered world and the loading overlay advance
//!
//! The session is started once and torn down once. After
//! [`Session::teardown`] late completions and task outcomes are discarded.

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::{info, warn};
use std::time::{Duration, Instant};

use crate::resources::assets::{AssetSet, EnvironmentError, ResourceLoader};
use crate::resources::audio::MenuTrack;
use crate::resources::gameconfig::GameConfig;
use crate::resources::input::InputState;
use crate::resources::navigation::Navigator;
use crate::resources::overlay::LoadingOverlay;
use crate::resources::scene::SceneWorld;
use crate::resources::screens::Screens;
use crate::resources::stage::{
    StageContext, StageController, StageError, StageState, setup_stage,
};
use crate::resources::worldtime::WorldTime;
use crate::systems::assets::poll_resource_loader;
use crate::systems::input::read_input_lines;
use crate::systems::screens::{
    advance_loading_overlay, observe_stage_audio, observe_stage_effect, observe_stage_input,
    observe_stage_screens, track_loading_progress, update_scene,
};
use crate::systems::stage::{
    drain_stage_outputs, forward_stage_inputs, poll_stage_tasks, stage_is_level, stage_is_loading,
    update_bevy_stage_inputs,
};
use crate::systems::time::update_world_time;

pub struct Session {
    world: World,
    schedule: Schedule,
    tick_seconds: f32,
}

impl Session {
    /// Build a session loading `assets` from the configured asset root.
    pub fn new(
        config: &GameConfig,
        assets: AssetSet,
        input: InputState,
    ) -> Result<Self, EnvironmentError> {
        let loader = ResourceLoader::new(assets, &config.asset_root)?
            .with_workers(config.workers as usize);
        Ok(Self::with_loader(config, loader, input))
    }

    /// Build a session around an already configured loader.
    pub fn with_loader(config: &GameConfig, loader: ResourceLoader, input: InputState) -> Self {
        let mut world = World::new();

        world.insert_resource(config.clone());
        world.insert_resource(WorldTime::default());
        world.insert_resource(Screens::for_mode(config.loading_mode()));
        world.insert_resource(LoadingOverlay::default());
        world.insert_resource(Navigator::default());
        world.insert_resource(SceneWorld::default());
        world.insert_resource(MenuTrack::new(config.menu_track.clone()));
        world.insert_resource(input);

        setup_stage(&mut world, config.loading_mode(), loader.task_invoker());
        world.insert_resource(loader);

        world.spawn(Observer::new(observe_stage_screens));
        world.spawn(Observer::new(observe_stage_audio));
        world.spawn(Observer::new(observe_stage_input));
        world.spawn(Observer::new(observe_stage_effect));
        // Observers must exist before the first trigger.
        world.flush();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                update_bevy_stage_inputs,
                read_input_lines,
                forward_stage_inputs,
                poll_resource_loader,
                poll_stage_tasks,
                drain_stage_outputs,
            )
                .chain(),
        );
        schedule.add_systems(
            (
                track_loading_progress.run_if(stage_is_loading),
                advance_loading_overlay,
                update_scene.run_if(stage_is_level),
            )
                .after(drain_stage_outputs),
        );

        Self {
            world,
            schedule,
            tick_seconds: config.tick().as_secs_f32(),
        }
    }

    /// Start the controller in its initial loading stage.
    pub fn start(&mut self) -> Result<(), StageError> {
        self.world
            .resource_mut::<StageController>()
            .start(StageContext::default())
    }

    /// Run one tick of the schedule.
    pub fn tick(&mut self) {
        update_world_time(&mut self.world, self.tick_seconds);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Tick until the session is finished, `max_ticks` ticks ran (0 means
    /// no limit) or the controller is torn down. Returns the ticks run.
    pub fn run(&mut self, max_ticks: u64, period: Duration) -> u64 {
        let mut ticks = 0;
        while !self.is_finished() && (max_ticks == 0 || ticks < max_ticks) {
            let began = Instant::now();
            self.tick();
            ticks += 1;
            if let Some(rest) = period.checked_sub(began.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        if max_ticks != 0 && ticks >= max_ticks && !self.is_finished() {
            warn!("Stopping after {} ticks in {:?}", ticks, self.state());
        }
        ticks
    }

    /// Nothing more can happen: loading failed, or input ran out after
    /// loading.
    pub fn is_finished(&self) -> bool {
        let stage = self.world.resource::<StageController>();
        if !stage.is_alive() {
            return true;
        }
        match stage.current_state() {
            Some(StageState::LoadingError) => true,
            Some(state) => {
                !state.is_loading() && self.world.resource::<InputState>().is_exhausted()
            }
            None => false,
        }
    }

    pub fn state(&self) -> Option<StageState> {
        self.world.resource::<StageController>().current_state()
    }

    pub fn context(&self) -> &StageContext {
        self.world.resource::<StageController>().context()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Shut the controller and the loader down together.
    pub fn teardown(&mut self) {
        info!("Tearing down session in {:?}", self.state());
        self.world.resource_mut::<StageController>().shutdown();
        self.world.resource_mut::<ResourceLoader>().teardown();
    }
}
