//! Systems driving the [`StageController`] from the ECS schedule.
//!
//! Per tick, in order:
//! - [`update_bevy_stage_inputs`] advances the [`StageInput`] queue
//! - [`forward_stage_inputs`] sends each input into the controller
//! - [`poll_stage_tasks`] applies outcomes of invoked tasks (`Done`/`Error`)
//! - [`drain_stage_outputs`] triggers observer events for whatever the
//!   controller produced

use crate::events::stage::{StageInput, StageOutput};
use crate::resources::stage::{StageBridge, StageController, StageState};
use bevy_ecs::prelude::*;
use log::{debug, error};

/// Advance the ECS message queue for [`StageInput`].
pub fn update_bevy_stage_inputs(mut msgs: ResMut<Messages<StageInput>>) {
    msgs.update();
}

/// Forward user input messages to the controller, one at a time.
pub fn forward_stage_inputs(
    mut stage: ResMut<StageController>,
    mut reader: MessageReader<StageInput>,
) {
    for input in reader.read() {
        match stage.send(input.event.clone()) {
            Ok(transition) => debug!("{:?} -> {:?}", input.event, transition),
            Err(e) => error!("Rejected {:?}: {}", input.event, e),
        }
    }
}

/// Apply finished invoked tasks.
pub fn poll_stage_tasks(mut stage: ResMut<StageController>) {
    stage.poll_tasks();
}

/// Turn the controller's queued outputs into observer triggers.
///
/// Triggers are queued as commands and applied in the order the controller
/// produced them.
pub fn drain_stage_outputs(bridge: Res<StageBridge>, mut commands: Commands) {
    for output in bridge.rx_output.try_iter() {
        match output {
            StageOutput::Changed(event) => commands.trigger(event),
            StageOutput::Effect(event) => commands.trigger(event),
        }
    }
}

/// Run condition: the controller is waiting on a loading task.
pub fn stage_is_loading(stage: Res<StageController>) -> bool {
    stage.current_state().is_some_and(|state| state.is_loading())
}

/// Run condition: a level is being played.
pub fn stage_is_level(stage: Res<StageController>) -> bool {
    stage.matches(StageState::Level)
}
