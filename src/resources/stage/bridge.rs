//! Bridge between the [`StageController`] and the ECS world.
//!
//! Use [`setup_stage`] once during initialization. It creates the output
//! channel, builds the controller with a [`ShellEffects`] collaborator and a
//! subscriber that both write into that channel, and inserts the
//! [`StageController`], [`StageBridge`] and `Messages<StageInput>` resources.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use super::controller::{Mailbox, StageContext, StageController, StageEffects};
use super::machine::{LoadingMode, StageAction};
use super::task::TaskInvoker;
use crate::events::stage::{StageChangedEvent, StageEffectEvent, StageInput, StageOutput};

/// Receiving end of everything the controller emitted.
#[derive(Resource)]
pub struct StageBridge {
    pub rx_output: Receiver<StageOutput>,
}

/// Effect collaborator that defers every action to the world's observers.
pub struct ShellEffects {
    tx: Sender<StageOutput>,
}

impl ShellEffects {
    pub fn new(tx: Sender<StageOutput>) -> Self {
        Self { tx }
    }
}

impl StageEffects for ShellEffects {
    fn perform(&mut self, action: StageAction, _context: &StageContext, _mailbox: &mut Mailbox) {
        debug!("Queueing effect {:?}", action);
        let _ = self.tx.send(StageOutput::Effect(StageEffectEvent { action }));
    }
}

/// Build the controller and register the bridge resources.
///
/// The controller is not started; call [`StageController::start`] once the
/// observers are in place.
pub fn setup_stage(world: &mut World, mode: LoadingMode, invoker: impl TaskInvoker + 'static) {
    let (tx_output, rx_output) = unbounded::<StageOutput>();

    let mut stage = StageController::new(mode, invoker, ShellEffects::new(tx_output.clone()));
    stage.subscribe(move |state, context| {
        let _ = tx_output.send(StageOutput::Changed(StageChangedEvent {
            state,
            context: context.clone(),
        }));
    });

    world.insert_resource(stage);
    world.insert_resource(StageBridge { rx_output });
    world.insert_resource(Messages::<StageInput>::default());
}
