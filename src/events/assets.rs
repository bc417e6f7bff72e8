//! Messages exchanged with the asset loader.
//!
//! - [`LoadJob`] goes *to* a loader worker thread.
//! - [`Completion`] comes *back* from a worker, one per job.
//! - [`LoaderEvent`] is what the loader emits to its subscribers while it
//!   processes completions on the main thread.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::resources::assets::descriptor::AssetDescriptor;
use crate::resources::assets::handle::AssetData;
use crate::resources::assets::loader::LoadError;
use crate::resources::assets::subloader::SubLoader;

/// One asset to load, with the sub-loader of its kind.
pub struct LoadJob {
    pub descriptor: AssetDescriptor,
    pub sub_loader: Arc<dyn SubLoader>,
}

/// Outcome of one [`LoadJob`].
#[derive(Debug)]
pub struct Completion {
    pub name: String,
    pub result: Result<AssetData, LoadError>,
}

/// Notifications emitted by the loader.
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// The named asset is now cached.
    Loaded { name: String },
    /// Every high-tier asset is loaded. Emitted at most once.
    HighReady,
    /// Every declared asset is loaded. Emitted at most once.
    Done,
    /// Loading failed. Emitted at most once; no readiness follows.
    Failed(LoadError),
}

impl LoaderEvent {
    pub fn signal(&self) -> LoaderSignal {
        match self {
            LoaderEvent::Loaded { .. } => LoaderSignal::Loaded,
            LoaderEvent::HighReady => LoaderSignal::HighReady,
            LoaderEvent::Done => LoaderSignal::Done,
            LoaderEvent::Failed(_) => LoaderSignal::Failed,
        }
    }
}

/// Event names handlers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderSignal {
    Loaded,
    HighReady,
    Done,
    Failed,
}

impl LoaderSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderSignal::Loaded => "loaded",
            LoaderSignal::HighReady => "high-ready",
            LoaderSignal::Done => "done",
            LoaderSignal::Failed => "failed",
        }
    }
}

impl fmt::Display for LoaderSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoaderSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loaded" => Ok(LoaderSignal::Loaded),
            "high-ready" => Ok(LoaderSignal::HighReady),
            "done" => Ok(LoaderSignal::Done),
            "failed" => Ok(LoaderSignal::Failed),
            other => Err(format!("unknown loader event '{other}'")),
        }
    }
}
