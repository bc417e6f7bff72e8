//! Stage states, events, actions and the transition table.
//!
//! The table is a plain function matched exhaustively on the state and on
//! the event tag, so adding a state or an event forces every arm below to be
//! revisited. An arm returning `None` is a defined no-op: the event is
//! ignored and nothing runs.

use smallvec::{SmallVec, smallvec};
use std::fmt;

/// Closed set of stages the application can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageState {
    /// Waiting for the very first user interaction (required to start audio).
    Start,
    /// Loading assets. Initial state.
    Loading,
    /// Second loading phase: high-priority assets are ready, waiting for the rest.
    LoadingBackground,
    /// Loading failed. Terminal.
    LoadingError,
    Menu,
    /// Displays the commands before a level.
    Tutorial,
    Leaderboard,
    Level,
    /// Offers to quit and displays the commands.
    Pause,
    /// Displays the score and asks for a name to record.
    Score,
    SavingScore,
}

impl StageState {
    /// Every state, in declaration order.
    pub const ALL: [StageState; 11] = [
        StageState::Start,
        StageState::Loading,
        StageState::LoadingBackground,
        StageState::LoadingError,
        StageState::Menu,
        StageState::Tutorial,
        StageState::Leaderboard,
        StageState::Level,
        StageState::Pause,
        StageState::Score,
        StageState::SavingScore,
    ];

    /// Human readable label, as shown in logs.
    pub fn label(&self) -> &'static str {
        match self {
            StageState::Start => "Start",
            StageState::Loading => "Loading",
            StageState::LoadingBackground => "Loading background",
            StageState::LoadingError => "Loading error",
            StageState::Menu => "Menu",
            StageState::Tutorial => "Tutorial",
            StageState::Leaderboard => "Leaderboard",
            StageState::Level => "Level",
            StageState::Pause => "Pause",
            StageState::Score => "Score",
            StageState::SavingScore => "Saving score",
        }
    }

    /// True for the states that only wait on an invoked loading task.
    pub fn is_loading(&self) -> bool {
        matches!(self, StageState::Loading | StageState::LoadingBackground)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-generated events accepted by [`StageController::send`].
///
/// [`StageController::send`]: crate::resources::stage::StageController::send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    Play,
    Back,
    Menu,
    Next,
    Quit,
    Pause,
    Resume,
    Leaderboard,
    Save { name: String },
    End { score: i64 },
}

impl StageEvent {
    pub fn tag(&self) -> EventTag {
        match self {
            StageEvent::Play => EventTag::Play,
            StageEvent::Back => EventTag::Back,
            StageEvent::Menu => EventTag::Menu,
            StageEvent::Next => EventTag::Next,
            StageEvent::Quit => EventTag::Quit,
            StageEvent::Pause => EventTag::Pause,
            StageEvent::Resume => EventTag::Resume,
            StageEvent::Leaderboard => EventTag::Leaderboard,
            StageEvent::Save { .. } => EventTag::Save,
            StageEvent::End { .. } => EventTag::End,
        }
    }
}

/// Payload-free discriminant of everything that can drive a transition,
/// including the two events synthesized from invoked tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    Play,
    Back,
    Menu,
    Next,
    Quit,
    Pause,
    Resume,
    Leaderboard,
    Save,
    End,
    Done,
    Error,
}

impl EventTag {
    pub const ALL: [EventTag; 12] = [
        EventTag::Play,
        EventTag::Back,
        EventTag::Menu,
        EventTag::Next,
        EventTag::Quit,
        EventTag::Pause,
        EventTag::Resume,
        EventTag::Leaderboard,
        EventTag::Save,
        EventTag::End,
        EventTag::Done,
        EventTag::Error,
    ];
}

/// What is being processed: a user event or the outcome of the active task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Event(StageEvent),
    Done,
    Error { cause: String },
}

impl Trigger {
    pub fn tag(&self) -> EventTag {
        match self {
            Trigger::Event(event) => event.tag(),
            Trigger::Done => EventTag::Done,
            Trigger::Error { .. } => EventTag::Error,
        }
    }
}

/// Side effects attached to exits, edges and entries.
///
/// `RecordScore` and `RecordName` only touch the machine context and are
/// applied by the controller itself; every other action is handed to the
/// [`StageEffects`](crate::resources::stage::StageEffects) collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageAction {
    RecordScore,
    RecordName,
    RenderWorld,
    HideLoadingOverlay,
    SetUpRemainingScreens,
    NavigateToErrorView,
}

impl StageAction {
    pub fn is_context_update(&self) -> bool {
        matches!(self, StageAction::RecordScore | StageAction::RecordName)
    }
}

/// Asynchronous operation a state invokes on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageTask {
    /// Load every declared asset; done when all tiers are loaded.
    LoadAll,
    /// Start loading; done once the high tier is loaded.
    LoadHighPriority,
    /// Done once every asset, low tier included, is loaded.
    AwaitLowPriority,
}

/// Shape of the loading phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadingMode {
    /// A single `Loading` state waiting on every asset.
    Single,
    /// `Loading` waits on the high tier, `LoadingBackground` on the rest.
    #[default]
    Phased,
}

/// Resolved transition edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub target: StageState,
    pub actions: SmallVec<[StageAction; 2]>,
    pub reenter: bool,
}

impl Edge {
    fn to(target: StageState) -> Self {
        Self {
            target,
            actions: SmallVec::new(),
            reenter: false,
        }
    }

    fn reenter(mut self) -> Self {
        self.reenter = true;
        self
    }

    fn with(mut self, actions: SmallVec<[StageAction; 2]>) -> Self {
        self.actions = actions;
        self
    }
}

use EventTag as T;
use StageState as S;

/// Look up the edge for `(state, tag)`.
pub fn transition(mode: LoadingMode, state: StageState, tag: EventTag) -> Option<Edge> {
    match state {
        S::Start => match tag {
            T::Play => Some(Edge::to(S::Menu).reenter()),
            T::Back | T::Menu | T::Next | T::Quit | T::Pause | T::Resume => None,
            T::Leaderboard | T::Save | T::End | T::Done | T::Error => None,
        },
        S::Loading => match tag {
            T::Done => Some(match mode {
                LoadingMode::Single => Edge::to(S::Start)
                    .reenter()
                    .with(smallvec![StageAction::RenderWorld]),
                LoadingMode::Phased => Edge::to(S::LoadingBackground)
                    .reenter()
                    .with(smallvec![StageAction::RenderWorld]),
            }),
            T::Error => Some(Edge::to(S::LoadingError).reenter()),
            T::Play | T::Back | T::Menu | T::Next | T::Quit | T::Pause => None,
            T::Resume | T::Leaderboard | T::Save | T::End => None,
        },
        S::LoadingBackground => match tag {
            T::Done => Some(Edge::to(S::Start).reenter()),
            T::Error => Some(Edge::to(S::LoadingError).reenter()),
            T::Play | T::Back | T::Menu | T::Next | T::Quit | T::Pause => None,
            T::Resume | T::Leaderboard | T::Save | T::End => None,
        },
        S::LoadingError => match tag {
            T::Play | T::Back | T::Menu | T::Next | T::Quit | T::Pause => None,
            T::Resume | T::Leaderboard | T::Save | T::End | T::Done | T::Error => None,
        },
        S::Menu => match tag {
            T::Play => Some(Edge::to(S::Tutorial)),
            T::Leaderboard => Some(Edge::to(S::Leaderboard)),
            T::Back | T::Menu | T::Next | T::Quit | T::Pause | T::Resume => None,
            T::Save | T::End | T::Done | T::Error => None,
        },
        S::Tutorial => match tag {
            T::Back => Some(Edge::to(S::Menu)),
            T::Play => Some(Edge::to(S::Level)),
            T::Menu | T::Next | T::Quit | T::Pause | T::Resume | T::Leaderboard => None,
            T::Save | T::End | T::Done | T::Error => None,
        },
        S::Leaderboard => match tag {
            T::Menu => Some(Edge::to(S::Menu)),
            T::Play | T::Back | T::Next | T::Quit | T::Pause | T::Resume => None,
            T::Leaderboard | T::Save | T::End | T::Done | T::Error => None,
        },
        S::Level => match tag {
            T::Pause => Some(Edge::to(S::Pause)),
            T::End => Some(Edge::to(S::Score).with(smallvec![StageAction::RecordScore])),
            T::Play | T::Back | T::Menu | T::Next | T::Quit | T::Resume => None,
            T::Leaderboard | T::Save | T::Done | T::Error => None,
        },
        S::Pause => match tag {
            T::Resume => Some(Edge::to(S::Level)),
            T::Quit => Some(Edge::to(S::Menu)),
            T::Play | T::Back | T::Menu | T::Next | T::Pause | T::Leaderboard => None,
            T::Save | T::End | T::Done | T::Error => None,
        },
        S::Score => match tag {
            T::Next => Some(Edge::to(S::Leaderboard)),
            T::Save => Some(Edge::to(S::SavingScore).with(smallvec![StageAction::RecordName])),
            T::Play | T::Back | T::Menu | T::Quit | T::Pause | T::Resume => None,
            T::Leaderboard | T::End | T::Done | T::Error => None,
        },
        S::SavingScore => match tag {
            T::Next => Some(Edge::to(S::Leaderboard)),
            T::Play | T::Back | T::Menu | T::Quit | T::Pause | T::Resume => None,
            T::Leaderboard | T::Save | T::End | T::Done | T::Error => None,
        },
    }
}

/// Actions run when leaving `state`.
pub fn exit_actions(mode: LoadingMode, state: StageState) -> &'static [StageAction] {
    match (mode, state) {
        (_, S::Loading) => &[StageAction::HideLoadingOverlay],
        (LoadingMode::Phased, S::LoadingBackground) => &[StageAction::SetUpRemainingScreens],
        (LoadingMode::Single, S::LoadingBackground) => &[],
        (_, S::Start | S::LoadingError | S::Menu | S::Tutorial | S::Leaderboard) => &[],
        (_, S::Level | S::Pause | S::Score | S::SavingScore) => &[],
    }
}

/// Actions run when entering `state`.
pub fn entry_actions(state: StageState) -> &'static [StageAction] {
    match state {
        S::LoadingError => &[StageAction::NavigateToErrorView],
        S::Start | S::Loading | S::LoadingBackground | S::Menu | S::Tutorial => &[],
        S::Leaderboard | S::Level | S::Pause | S::Score | S::SavingScore => &[],
    }
}

/// Task invoked on entry of `state`, if any.
pub fn invoked_task(mode: LoadingMode, state: StageState) -> Option<StageTask> {
    match (mode, state) {
        (LoadingMode::Single, S::Loading) => Some(StageTask::LoadAll),
        (LoadingMode::Phased, S::Loading) => Some(StageTask::LoadHighPriority),
        (LoadingMode::Phased, S::LoadingBackground) => Some(StageTask::AwaitLowPriority),
        (LoadingMode::Single, S::LoadingBackground) => None,
        (_, S::Start | S::LoadingError | S::Menu | S::Tutorial | S::Leaderboard) => None,
        (_, S::Level | S::Pause | S::Score | S::SavingScore) => None,
    }
}
