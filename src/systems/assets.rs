//! Asset loading off the main thread.
//!
//! [`load_worker`] is the body of each loader worker thread spawned by
//! [`ResourceLoader::load`]. Workers pull [`LoadJob`]s from a shared queue,
//! run the job's sub-loader and send one [`Completion`] back per job. They
//! never touch the loader itself.
//!
//! [`poll_resource_loader`] runs every tick on the main thread and applies
//! whatever completions arrived.

use crate::events::assets::{Completion, LoadJob};
use crate::resources::assets::loader::{LoadError, ResourceLoader};
use bevy_ecs::prelude::ResMut;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Apply pending loader completions and settle loader-backed stage tasks.
pub fn poll_resource_loader(mut loader: ResMut<ResourceLoader>) {
    loader.poll();
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("sub-loader panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("sub-loader panicked: {s}")
    } else {
        "sub-loader panicked".to_string()
    }
}

/// Entry point of a loader worker thread.
///
/// Returns when the job queue is closed and empty, when the loader has been
/// torn down, or when nobody listens for completions any more. A panicking
/// sub-loader is reported as a failed load.
pub fn load_worker(rx_job: Receiver<LoadJob>, tx_done: Sender<Completion>, alive: Arc<AtomicBool>) {
    debug!("[loader] worker starting (id={:?})", std::thread::current().id());
    for job in rx_job.iter() {
        if !alive.load(Ordering::Acquire) {
            debug!("[loader] loader torn down; skipping remaining jobs");
            break;
        }
        let name = job.descriptor.name.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            job.sub_loader.load(&job.descriptor)
        }))
        .unwrap_or_else(|payload| {
            let reason = panic_reason(payload.as_ref());
            warn!("[loader] '{}': {}", name, reason);
            Err(LoadError::Failed {
                name: name.clone(),
                reason,
            })
        });
        if tx_done.send(Completion { name, result }).is_err() {
            break;
        }
    }
    debug!("[loader] worker exiting (id={:?})", std::thread::current().id());
}
