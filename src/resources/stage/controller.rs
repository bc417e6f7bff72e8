//! The stage controller resource.
//!
//! Processing contract
//! - One trigger is processed at a time. Events sent from inside an action
//!   (through the [`Mailbox`]) are queued and drained in submission order
//!   once the current transition has fully completed.
//! - A transition runs exit actions of the old state, then the edge's
//!   actions, then entry actions of the new state, then starts the new
//!   state's invoked task, then notifies subscribers.
//! - An event without an edge is ignored: no actions, no notification.

use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use std::collections::VecDeque;
use thiserror::Error;

use super::machine::{
    LoadingMode, StageAction, StageEvent, StageState, StageTask, Trigger, entry_actions,
    exit_actions, invoked_task, transition,
};
use super::task::{InvocationId, TaskInvoker, TaskOutcome, TaskToken};

/// Programming errors in the use of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Machine-scoped data, only mutated by context actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageContext {
    /// Score of the last finished level.
    pub score: Option<i64>,
    /// Name entered to record the score.
    pub player_name: Option<String>,
}

/// Result of processing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No edge for the current state; nothing happened.
    Ignored,
    Moved {
        from: StageState,
        to: StageState,
        reenter: bool,
    },
}

/// Queue of events raised while a transition is running.
#[derive(Debug, Default)]
pub struct Mailbox {
    pending: VecDeque<StageEvent>,
}

impl Mailbox {
    /// Queue `event`; it is processed after the current transition.
    pub fn send(&mut self, event: StageEvent) {
        self.pending.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn pop(&mut self) -> Option<StageEvent> {
        self.pending.pop_front()
    }
}

/// Collaborator that performs the side-effecting actions.
pub trait StageEffects: Send + Sync {
    fn perform(&mut self, action: StageAction, context: &StageContext, mailbox: &mut Mailbox);
}

/// Effects sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEffects;

impl StageEffects for NoEffects {
    fn perform(&mut self, action: StageAction, _context: &StageContext, _mailbox: &mut Mailbox) {
        debug!("No effect handler for {:?}", action);
    }
}

/// Handle returned by [`StageController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(StageState, &StageContext) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ActiveTask {
    invocation: InvocationId,
    task: StageTask,
}

/// Finite-state controller sequencing the application's stages.
#[derive(Resource)]
pub struct StageController {
    mode: LoadingMode,
    current: Option<StageState>,
    context: StageContext,
    alive: bool,
    mailbox: Mailbox,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    invoker: Box<dyn TaskInvoker>,
    effects: Box<dyn StageEffects>,
    active_task: Option<ActiveTask>,
    next_invocation: InvocationId,
    tx_outcome: Sender<TaskOutcome>,
    rx_outcome: Receiver<TaskOutcome>,
}

impl StageController {
    /// Initial state entered by [`StageController::start`].
    pub const INITIAL: StageState = StageState::Loading;

    pub fn new(
        mode: LoadingMode,
        invoker: impl TaskInvoker + 'static,
        effects: impl StageEffects + 'static,
    ) -> Self {
        let (tx_outcome, rx_outcome) = unbounded();
        Self {
            mode,
            current: None,
            context: StageContext::default(),
            alive: true,
            mailbox: Mailbox::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            invoker: Box::new(invoker),
            effects: Box::new(effects),
            active_task: None,
            next_invocation: 0,
            tx_outcome,
            rx_outcome,
        }
    }

    pub fn mode(&self) -> LoadingMode {
        self.mode
    }

    /// Current state, `None` before [`StageController::start`].
    pub fn current_state(&self) -> Option<StageState> {
        self.current
    }

    pub fn matches(&self, state: StageState) -> bool {
        self.current == Some(state)
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// Task attached to the current state instance, if it has not settled yet.
    pub fn active_task(&self) -> Option<StageTask> {
        self.active_task.map(|active| active.task)
    }

    /// Enter the initial state. Allowed once per controller.
    pub fn start(&mut self, context: StageContext) -> Result<(), StageError> {
        self.ensure_alive()?;
        if self.current.is_some() {
            return Err(StageError::InvariantViolation(
                "start called on an already started controller".into(),
            ));
        }
        info!("Starting stage controller in {}", Self::INITIAL);
        self.context = context;
        self.current = Some(Self::INITIAL);
        self.enter(Self::INITIAL, None);
        self.notify();
        self.drain_mailbox();
        Ok(())
    }

    /// Process a user event, then anything it queued.
    ///
    /// Returns what happened to `event` itself.
    pub fn send(&mut self, event: StageEvent) -> Result<Transition, StageError> {
        self.ensure_alive()?;
        if self.current.is_none() {
            return Err(StageError::InvariantViolation(format!(
                "{:?} sent before start",
                event
            )));
        }
        let outcome = self.step(Trigger::Event(event));
        self.drain_mailbox();
        Ok(outcome)
    }

    /// Turn settled task outcomes into `Done`/`Error` triggers.
    ///
    /// Outcomes of tasks whose state instance was already exited are
    /// dropped. Returns the number of outcomes that caused a transition.
    pub fn poll_tasks(&mut self) -> usize {
        if !self.alive {
            return 0;
        }
        let outcomes: Vec<TaskOutcome> = self.rx_outcome.try_iter().collect();
        let mut applied = 0;
        for outcome in outcomes {
            let current = self.active_task.map(|active| active.invocation);
            if current != Some(outcome.invocation) {
                warn!(
                    "Dropping stale outcome of {:?} (invocation {})",
                    outcome.task, outcome.invocation
                );
                continue;
            }
            self.active_task = None;
            let trigger = match outcome.result {
                Ok(()) => Trigger::Done,
                Err(cause) => {
                    warn!("Task {:?} failed: {}", outcome.task, cause);
                    Trigger::Error { cause }
                }
            };
            if let Transition::Moved { .. } = self.step(trigger) {
                applied += 1;
            }
            self.drain_mailbox();
        }
        applied
    }

    /// Register a listener called after every transition, `start` included.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(StageState, &StageContext) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Stop reacting to anything. Outcomes arriving afterwards are ignored.
    pub fn shutdown(&mut self) {
        if !self.alive {
            return;
        }
        info!("Stage controller shut down in {:?}", self.current);
        self.alive = false;
        self.active_task = None;
        self.listeners.clear();
        self.mailbox = Mailbox::default();
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn ensure_alive(&self) -> Result<(), StageError> {
        if self.alive {
            Ok(())
        } else {
            Err(StageError::InvariantViolation(
                "controller used after shutdown".into(),
            ))
        }
    }

    fn drain_mailbox(&mut self) {
        while let Some(event) = self.mailbox.pop() {
            debug!("Processing queued {:?}", event);
            self.step(Trigger::Event(event));
        }
    }

    fn step(&mut self, trigger: Trigger) -> Transition {
        let Some(from) = self.current else {
            return Transition::Ignored;
        };
        let tag = trigger.tag();
        let Some(edge) = transition(self.mode, from, tag) else {
            debug!("No edge for {:?} in {}", tag, from);
            return Transition::Ignored;
        };

        info!(
            "Transitioning from {} to {} on {:?}{}",
            from,
            edge.target,
            tag,
            if edge.reenter { " (reenter)" } else { "" }
        );

        // Leaving the state instance retires its task, settled or not.
        self.active_task = None;
        for action in exit_actions(self.mode, from) {
            self.run_action(*action, Some(&trigger));
        }
        for action in edge.actions.iter() {
            self.run_action(*action, Some(&trigger));
        }
        self.current = Some(edge.target);
        self.enter(edge.target, Some(&trigger));
        self.notify();

        Transition::Moved {
            from,
            to: edge.target,
            reenter: edge.reenter,
        }
    }

    fn enter(&mut self, state: StageState, trigger: Option<&Trigger>) {
        for action in entry_actions(state) {
            self.run_action(*action, trigger);
        }
        if let Some(task) = invoked_task(self.mode, state) {
            let invocation = self.next_invocation;
            self.next_invocation += 1;
            self.active_task = Some(ActiveTask { invocation, task });
            debug!("Invoking {:?} (invocation {}) in {}", task, invocation, state);
            let token = TaskToken::new(invocation, task, self.tx_outcome.clone());
            self.invoker.invoke(token);
        }
    }

    fn run_action(&mut self, action: StageAction, trigger: Option<&Trigger>) {
        match (action, trigger) {
            (StageAction::RecordScore, Some(Trigger::Event(StageEvent::End { score }))) => {
                debug!("Recording score {}", score);
                self.context.score = Some(*score);
            }
            (StageAction::RecordName, Some(Trigger::Event(StageEvent::Save { name }))) => {
                debug!("Recording player name {:?}", name);
                self.context.player_name = Some(name.clone());
            }
            (StageAction::RecordScore | StageAction::RecordName, other) => {
                warn!("{:?} has no payload to record in {:?}", action, other);
            }
            (
                StageAction::RenderWorld
                | StageAction::HideLoadingOverlay
                | StageAction::SetUpRemainingScreens
                | StageAction::NavigateToErrorView,
                _,
            ) => {
                self.effects
                    .perform(action, &self.context, &mut self.mailbox);
            }
        }
    }

    fn notify(&mut self) {
        let Some(state) = self.current else {
            return;
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(state, &self.context);
        }
    }
}
