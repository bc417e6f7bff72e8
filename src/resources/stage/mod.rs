//! Stage controller: the application's top-level finite-state machine.
//!
//! - [`machine`] – states, events, actions and the exhaustive transition table
//! - [`controller`] – the [`StageController`] resource processing one trigger at a time
//! - [`task`] – tokens and invokers for the asynchronous task a state starts on entry
//! - [`bridge`] – channel from the controller's outputs to the ECS world
//!
//! The controller is a plain ECS resource. Systems in
//! [`crate::systems::stage`] forward user input into it and turn its
//! outputs into observer events.

pub mod bridge;
pub mod controller;
pub mod machine;
pub mod task;

pub use bridge::{ShellEffects, StageBridge, setup_stage};
pub use controller::{
    Mailbox, NoEffects, StageContext, StageController, StageEffects, StageError, SubscriptionId,
    Transition,
};
pub use machine::{
    EventTag, LoadingMode, StageAction, StageEvent, StageState, StageTask, Trigger,
};
pub use task::{InvocationId, TaskInvoker, TaskOutcome, TaskToken};
