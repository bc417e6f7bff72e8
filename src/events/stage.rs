//! Stage events exchanged between the controller and the rest of the world.
//!
//! The controller calls its subscribers and effect collaborator while it is
//! borrowed mutably, so it cannot reach into the ECS world itself. Instead
//! it pushes [`StageOutput`]s into a channel, in the order they happened.
//! [`crate::systems::stage::drain_stage_outputs`] turns them into
//! [`StageChangedEvent`] and [`StageEffectEvent`] triggers for observers.
//!
//! User input travels the other way as [`StageInput`] messages.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::*;

use crate::resources::stage::{StageAction, StageContext, StageEvent, StageState};

/// The controller settled in a new state (after its entry actions ran).
#[derive(Event, Debug, Clone)]
pub struct StageChangedEvent {
    pub state: StageState,
    pub context: StageContext,
}

/// A transition asked the shell to perform a side effect.
#[derive(Event, Debug, Clone, Copy)]
pub struct StageEffectEvent {
    pub action: StageAction,
}

/// A user-generated event to feed into the controller.
#[derive(Message, Debug, Clone)]
pub struct StageInput {
    pub event: StageEvent,
}

/// What the controller produced, in order, during one processing step.
#[derive(Debug, Clone)]
pub enum StageOutput {
    Changed(StageChangedEvent),
    Effect(StageEffectEvent),
}
