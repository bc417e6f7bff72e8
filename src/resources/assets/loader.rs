//! The priority-aware resource loader.
//!
//! [`ResourceLoader`] owns the immutable [`AssetSet`], the cache of loaded
//! handles and the readiness bookkeeping. [`ResourceLoader::load`] hands
//! one [`LoadJob`] per asset to a small pool of worker threads, high tier
//! first. Workers never touch the loader: each job's [`Completion`] comes
//! back over a channel and is applied by [`ResourceLoader::poll`] on the
//! thread that owns the loader, one at a time.
//!
//! Applying a completion caches the handle, emits
//! [`LoaderEvent::Loaded`] to every handler, and only then re-evaluates tier
//! readiness. `HighReady` and `Done` are each emitted at most once.
//!
//! A failed asset produces a single [`LoaderEvent::Failed`]. Assets that
//! still succeed afterwards are cached and announced, but neither readiness
//! event fires for the rest of this loader's life.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use super::descriptor::{AssetKind, AssetSet, Tier};
use super::handle::{
    AssetLookup, AudioClip, CubeTexture, FontFace, LoadedAsset, Model, TextureImage,
    VectorGraphic,
};
use super::subloader::{SubLoader, SubLoaders};
use crate::events::assets::{Completion, LoadJob, LoaderEvent, LoaderSignal};
use crate::resources::stage::{StageTask, TaskInvoker, TaskToken};
use crate::systems::assets::load_worker;
use bevy_ecs::prelude::Resource;

/// Why an asset could not be loaded.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("asset '{name}': cannot read {path:?}: {source}")]
    Io {
        name: String,
        path: PathBuf,
        source: Arc<std::io::Error>,
    },
    #[error("asset '{name}': {reason}")]
    Parse { name: String, reason: String },
    #[error("asset '{name}': locator does not fit a {kind} asset")]
    UnsupportedLocator { name: String, kind: AssetKind },
    #[error("asset '{name}' failed: {reason}")]
    Failed { name: String, reason: String },
}

impl LoadError {
    pub fn asset_name(&self) -> &str {
        match self {
            LoadError::Io { name, .. }
            | LoadError::Parse { name, .. }
            | LoadError::UnsupportedLocator { name, .. }
            | LoadError::Failed { name, .. } => name,
        }
    }
}

/// The loader cannot run in this environment.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("asset root {0:?} is not a directory")]
    MissingRoot(PathBuf),
}

/// Loaded versus declared counts, per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub high_loaded: usize,
    pub high_total: usize,
    pub low_loaded: usize,
    pub low_total: usize,
}

impl LoadProgress {
    pub fn loaded(&self) -> usize {
        self.high_loaded + self.low_loaded
    }

    pub fn total(&self) -> usize {
        self.high_total + self.low_total
    }

    /// Overall completion in `0.0..=1.0`. An empty set counts as complete.
    pub fn fraction(&self) -> f32 {
        match self.total() {
            0 => 1.0,
            total => self.loaded() as f32 / total as f32,
        }
    }
}

type Handler = Box<dyn FnMut(&LoaderEvent) + Send + Sync>;

/// Invoker that lets the stage controller run loader-backed tasks.
///
/// Tokens are parked in the loader and settled by [`ResourceLoader::poll`]
/// once the readiness they wait for is reached, or failed if loading fails.
/// The first `LoadAll` or `LoadHighPriority` token starts the load.
#[derive(Clone)]
pub struct LoaderTasks {
    tx: Sender<TaskToken>,
}

impl TaskInvoker for LoaderTasks {
    fn invoke(&mut self, token: TaskToken) {
        debug!("Loader task {:?} requested", token.task());
        // A dropped loader means the token is dropped too, which fails it.
        let _ = self.tx.send(token);
    }
}

#[derive(Resource)]
pub struct ResourceLoader {
    assets: AssetSet,
    sub_loaders: SubLoaders,
    workers: usize,
    cache: FxHashMap<String, LoadedAsset>,
    high_loaded: usize,
    low_loaded: usize,
    high_ready: bool,
    done: bool,
    failure: Option<LoadError>,
    started: bool,
    readiness_pending: bool,
    alive: Arc<AtomicBool>,
    tx_done: Sender<Completion>,
    rx_done: Receiver<Completion>,
    tx_tasks: Sender<TaskToken>,
    rx_tasks: Receiver<TaskToken>,
    watchers: Vec<TaskToken>,
    handlers: Vec<(LoaderSignal, Handler)>,
}

impl ResourceLoader {
    pub const DEFAULT_WORKERS: usize = 4;

    /// Store the asset set. Nothing is loaded until [`Self::load`].
    pub fn new(assets: AssetSet, root: impl Into<PathBuf>) -> Result<Self, EnvironmentError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(EnvironmentError::MissingRoot(root));
        }
        let (tx_done, rx_done) = unbounded();
        let (tx_tasks, rx_tasks) = unbounded();
        Ok(Self {
            assets,
            sub_loaders: SubLoaders::new(root),
            workers: Self::DEFAULT_WORKERS,
            cache: FxHashMap::default(),
            high_loaded: 0,
            low_loaded: 0,
            high_ready: false,
            done: false,
            failure: None,
            started: false,
            readiness_pending: false,
            alive: Arc::new(AtomicBool::new(true)),
            tx_done,
            rx_done,
            tx_tasks,
            rx_tasks,
            watchers: Vec::new(),
            handlers: Vec::new(),
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn assets(&self) -> &AssetSet {
        &self.assets
    }

    pub fn root(&self) -> &Path {
        self.sub_loaders.root()
    }

    /// Replace the sub-loader factory for `kind`. Must happen before loading
    /// dispatches an asset of that kind.
    pub fn register_sub_loader(
        &mut self,
        kind: AssetKind,
        factory: impl Fn(&Path) -> Arc<dyn SubLoader> + Send + Sync + 'static,
    ) {
        self.sub_loaders.register(kind, factory);
    }

    pub fn sub_loaders(&self) -> &SubLoaders {
        &self.sub_loaders
    }

    /// Invoker to hand to the stage controller.
    pub fn task_invoker(&self) -> LoaderTasks {
        LoaderTasks {
            tx: self.tx_tasks.clone(),
        }
    }

    /// Register `handler` for one kind of loader event.
    pub fn on(
        &mut self,
        signal: LoaderSignal,
        handler: impl FnMut(&LoaderEvent) + Send + Sync + 'static,
    ) {
        self.handlers.push((signal, Box::new(handler)));
    }

    /// Start loading every declared asset. Returns immediately.
    ///
    /// Only the first call dispatches anything.
    pub fn load(&mut self) {
        if !self.is_alive() {
            warn!("load() called on a torn down loader");
            return;
        }
        if self.started {
            debug!("load() called again; assets are already dispatched");
            return;
        }
        self.started = true;
        self.readiness_pending = true;

        info!(
            "Loading {} assets ({} high, {} low) on up to {} workers",
            self.assets.len(),
            self.assets.count(Tier::High),
            self.assets.count(Tier::Low),
            self.workers
        );
        if self.assets.is_empty() {
            return;
        }

        let (tx_job, rx_job) = unbounded::<LoadJob>();
        for descriptor in self.assets.by_priority() {
            let sub_loader = self.sub_loaders.get_or_create(descriptor.kind);
            let _ = tx_job.send(LoadJob {
                descriptor: descriptor.clone(),
                sub_loader,
            });
        }
        // Workers exit once the queue is drained and this sender is gone.
        drop(tx_job);

        for index in 0..self.workers.min(self.assets.len()) {
            let rx_job = rx_job.clone();
            let tx_done = self.tx_done.clone();
            let alive = self.alive.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("asset-loader-{index}"))
                .spawn(move || load_worker(rx_job, tx_done, alive));
            if let Err(e) = spawned {
                error!("Failed to spawn asset loader worker {}: {}", index, e);
            }
        }
    }

    /// Apply everything that arrived since the last call: new task tokens,
    /// worker completions, readiness, and parked tokens that can settle.
    ///
    /// Returns the number of completions applied.
    pub fn poll(&mut self) -> usize {
        if !self.is_alive() {
            return 0;
        }
        let new_tokens: Vec<TaskToken> = self.rx_tasks.try_iter().collect();
        for token in new_tokens {
            if matches!(token.task(), StageTask::LoadAll | StageTask::LoadHighPriority) {
                self.load();
            }
            self.watchers.push(token);
        }

        let completions: Vec<Completion> = self.rx_done.try_iter().collect();
        let applied = completions.len();
        for completion in completions {
            self.handle_completion(completion);
        }

        if self.readiness_pending {
            self.readiness_pending = false;
            self.check_readiness();
        }
        self.settle_watchers();
        applied
    }

    /// Apply one completion.
    ///
    /// The first successful result for a name is cached; anything after it,
    /// success or failure, is ignored. Runs the `loaded` handlers before
    /// looking at readiness.
    pub fn handle_completion(&mut self, completion: Completion) {
        if !self.is_alive() {
            warn!(
                "Dropping completion for '{}' after teardown",
                completion.name
            );
            return;
        }
        let Completion { name, result } = completion;
        let Some(descriptor) = self.assets.get(&name) else {
            warn!("Completion for undeclared asset '{}' ignored", name);
            return;
        };
        let (kind, tier) = (descriptor.kind, descriptor.tier);
        if self.cache.contains_key(&name) {
            warn!("Asset '{}' already loaded; duplicate completion ignored", name);
            return;
        }

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        if data.kind() != kind {
            self.fail(LoadError::Failed {
                reason: format!("expected a {} asset, got {}", kind, data.kind()),
                name,
            });
            return;
        }

        debug!("Asset '{}' ({}, {:?} tier) loaded", name, kind, tier);
        self.cache.insert(name.clone(), LoadedAsset::new(&name, data));
        match tier {
            Tier::High => self.high_loaded += 1,
            Tier::Low => self.low_loaded += 1,
        }
        self.emit(&LoaderEvent::Loaded { name });
        self.check_readiness();
    }

    fn fail(&mut self, e: LoadError) {
        if self.failure.is_some() {
            warn!("Further load failure ignored: {}", e);
            return;
        }
        error!("Loading failed: {}", e);
        self.failure = Some(e.clone());
        self.emit(&LoaderEvent::Failed(e));
    }

    fn check_readiness(&mut self) {
        if self.failure.is_some() {
            return;
        }
        if !self.high_ready && self.high_loaded == self.assets.count(Tier::High) {
            self.high_ready = true;
            info!("High priority assets ready");
            self.emit(&LoaderEvent::HighReady);
        }
        if !self.done && self.high_loaded + self.low_loaded == self.assets.len() {
            self.done = true;
            info!("All {} assets loaded", self.assets.len());
            self.emit(&LoaderEvent::Done);
        }
    }

    fn emit(&mut self, event: &LoaderEvent) {
        let signal = event.signal();
        for (wanted, handler) in self.handlers.iter_mut() {
            if *wanted == signal {
                handler(event);
            }
        }
    }

    fn settle_watchers(&mut self) {
        if self.watchers.is_empty() {
            return;
        }
        let parked = std::mem::take(&mut self.watchers);
        for token in parked {
            if let Some(e) = &self.failure {
                token.fail(e.to_string());
                continue;
            }
            let ready = match token.task() {
                StageTask::LoadHighPriority => self.high_ready,
                StageTask::LoadAll | StageTask::AwaitLowPriority => self.done,
            };
            if ready {
                debug!("Loader task {:?} complete", token.task());
                token.succeed();
            } else {
                self.watchers.push(token);
            }
        }
    }

    /// Look up a loaded asset. Never blocks.
    pub fn get_asset(&self, name: &str, kind: AssetKind) -> AssetLookup {
        match self.cache.get(name) {
            None => AssetLookup::NotLoaded,
            Some(asset) if asset.kind() != kind => AssetLookup::KindMismatch {
                expected: kind,
                actual: asset.kind(),
            },
            Some(asset) => AssetLookup::Ready(asset.clone()),
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    pub fn audio(&self, name: &str) -> Option<&AudioClip> {
        self.cache.get(name)?.as_audio()
    }

    pub fn font(&self, name: &str) -> Option<&FontFace> {
        self.cache.get(name)?.as_font()
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.cache.get(name)?.as_model()
    }

    pub fn vector_graphic(&self, name: &str) -> Option<&VectorGraphic> {
        self.cache.get(name)?.as_vector_graphic()
    }

    pub fn texture(&self, name: &str) -> Option<&TextureImage> {
        self.cache.get(name)?.as_texture()
    }

    pub fn cube_texture(&self, name: &str) -> Option<&CubeTexture> {
        self.cache.get(name)?.as_cube_texture()
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress {
            high_loaded: self.high_loaded,
            high_total: self.assets.count(Tier::High),
            low_loaded: self.low_loaded,
            low_total: self.assets.count(Tier::Low),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_high_ready(&self) -> bool {
        self.high_ready
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn failure(&self) -> Option<&LoadError> {
        self.failure.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Stop reacting to completions. In-flight loads keep running but their
    /// results are discarded, and workers skip jobs they have not started.
    pub fn teardown(&mut self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(
            "Loader torn down with {}/{} assets loaded",
            self.cache.len(),
            self.assets.len()
        );
        self.handlers.clear();
        self.watchers.clear();
    }
}

impl Drop for ResourceLoader {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}
