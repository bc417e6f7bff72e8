//! Stage controller integration tests: transition table, action ordering,
//! serialized processing, invoked tasks and teardown.

use std::sync::{Arc, Mutex};

use backtrack::resources::stage::{
    EventTag, LoadingMode, Mailbox, StageAction, StageContext, StageController, StageEffects,
    StageError, StageEvent, StageState, StageTask, TaskToken, Transition,
};
use backtrack::resources::stage::machine::transition;

type Tokens = Arc<Mutex<Vec<TaskToken>>>;
type Journal = Arc<Mutex<Vec<String>>>;

/// Records every effect, and optionally queues an event when one runs.
struct Recorder {
    journal: Journal,
    follow_up: Option<(StageAction, StageEvent)>,
}

impl StageEffects for Recorder {
    fn perform(&mut self, action: StageAction, _context: &StageContext, mailbox: &mut Mailbox) {
        self.journal.lock().unwrap().push(format!("{action:?}"));
        if let Some((trigger, event)) = &self.follow_up {
            if *trigger == action {
                mailbox.send(event.clone());
            }
        }
    }
}

struct Harness {
    stage: StageController,
    tokens: Tokens,
    journal: Journal,
}

impl Harness {
    fn new(mode: LoadingMode) -> Self {
        Self::with_follow_up(mode, None)
    }

    fn with_follow_up(mode: LoadingMode, follow_up: Option<(StageAction, StageEvent)>) -> Self {
        let tokens: Tokens = Arc::new(Mutex::new(Vec::new()));
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let sink = tokens.clone();
        let mut stage = StageController::new(
            mode,
            move |token: TaskToken| sink.lock().unwrap().push(token),
            Recorder {
                journal: journal.clone(),
                follow_up,
            },
        );
        let notes = journal.clone();
        stage.subscribe(move |state, _context| {
            notes.lock().unwrap().push(format!("notify:{state:?}"));
        });
        Self {
            stage,
            tokens,
            journal,
        }
    }

    fn take_token(&self) -> TaskToken {
        self.tokens.lock().unwrap().remove(0)
    }

    fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }

    /// Start, let loading succeed, and land in `Start`.
    fn loaded(mode: LoadingMode) -> Self {
        let mut harness = Self::new(mode);
        harness.stage.start(StageContext::default()).unwrap();
        harness.take_token().succeed();
        harness.stage.poll_tasks();
        if mode == LoadingMode::Phased {
            harness.take_token().succeed();
            harness.stage.poll_tasks();
        }
        assert_eq!(harness.stage.current_state(), Some(StageState::Start));
        harness.clear_journal();
        harness
    }

    fn send_all(&mut self, events: &[StageEvent]) {
        for event in events {
            self.stage.send(event.clone()).unwrap();
        }
    }
}

fn sample_event(tag: EventTag) -> Option<StageEvent> {
    Some(match tag {
        EventTag::Play => StageEvent::Play,
        EventTag::Back => StageEvent::Back,
        EventTag::Menu => StageEvent::Menu,
        EventTag::Next => StageEvent::Next,
        EventTag::Quit => StageEvent::Quit,
        EventTag::Pause => StageEvent::Pause,
        EventTag::Resume => StageEvent::Resume,
        EventTag::Leaderboard => StageEvent::Leaderboard,
        EventTag::Save => StageEvent::Save { name: "zoe".into() },
        EventTag::End => StageEvent::End { score: 7 },
        EventTag::Done | EventTag::Error => return None,
    })
}

fn path_to(state: StageState) -> Vec<StageEvent> {
    use StageEvent::*;
    match state {
        StageState::Start => vec![],
        StageState::Menu => vec![Play],
        StageState::Tutorial => vec![Play, Play],
        StageState::Leaderboard => vec![Play, Leaderboard],
        StageState::Level => vec![Play, Play, Play],
        StageState::Pause => vec![Play, Play, Play, Pause],
        StageState::Score => vec![Play, Play, Play, End { score: 100 }],
        StageState::SavingScore => vec![
            Play,
            Play,
            Play,
            End { score: 100 },
            Save { name: "ada".into() },
        ],
        StageState::Loading | StageState::LoadingBackground | StageState::LoadingError => {
            unreachable!("reached through tasks, not events")
        }
    }
}

fn assert_ignored_everywhere(harness: &mut Harness) {
    let state = harness.stage.current_state().unwrap();
    let context = harness.stage.context().clone();
    for tag in EventTag::ALL {
        if transition(harness.stage.mode(), state, tag).is_some() {
            continue;
        }
        let Some(event) = sample_event(tag) else {
            continue;
        };
        harness.clear_journal();
        assert_eq!(harness.stage.send(event).unwrap(), Transition::Ignored);
        assert_eq!(harness.stage.current_state(), Some(state));
        assert_eq!(harness.stage.context(), &context);
        assert!(harness.journal().is_empty(), "{tag:?} in {state:?}");
    }
}

#[test]
fn events_without_an_edge_change_nothing() {
    for state in [
        StageState::Start,
        StageState::Menu,
        StageState::Tutorial,
        StageState::Leaderboard,
        StageState::Level,
        StageState::Pause,
        StageState::Score,
        StageState::SavingScore,
    ] {
        let mut harness = Harness::loaded(LoadingMode::Single);
        harness.send_all(&path_to(state));
        assert_eq!(harness.stage.current_state(), Some(state));
        assert_ignored_everywhere(&mut harness);
    }
}

#[test]
fn user_events_are_ignored_while_loading() {
    let mut harness = Harness::new(LoadingMode::Phased);
    harness.stage.start(StageContext::default()).unwrap();
    assert_ignored_everywhere(&mut harness);
    assert_eq!(harness.stage.active_task(), Some(StageTask::LoadHighPriority));
}

#[test]
fn playing_through_to_score_records_it() {
    let mut harness = Harness::loaded(LoadingMode::Phased);
    harness.send_all(&[StageEvent::Play]);
    assert_eq!(harness.stage.current_state(), Some(StageState::Menu));

    harness.stage.send(StageEvent::Play).unwrap();
    assert_eq!(harness.stage.current_state(), Some(StageState::Tutorial));
    harness.stage.send(StageEvent::Play).unwrap();
    assert_eq!(harness.stage.current_state(), Some(StageState::Level));
    let moved = harness.stage.send(StageEvent::End { score: 20720 }).unwrap();

    assert_eq!(
        moved,
        Transition::Moved {
            from: StageState::Level,
            to: StageState::Score,
            reenter: false
        }
    );
    assert_eq!(harness.stage.context().score, Some(20720));
}

#[test]
fn subscribers_see_the_context_after_edge_actions() {
    let mut harness = Harness::loaded(LoadingMode::Single);
    let seen: Arc<Mutex<Vec<(StageState, Option<i64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = harness
        .stage
        .subscribe(move |state, context| sink.lock().unwrap().push((state, context.score)));

    harness.send_all(&path_to(StageState::Score));
    assert_eq!(
        seen.lock().unwrap().last(),
        Some(&(StageState::Score, Some(100)))
    );

    assert!(harness.stage.unsubscribe(id));
    assert!(!harness.stage.unsubscribe(id));
    let count = seen.lock().unwrap().len();
    harness.stage.send(StageEvent::Next).unwrap();
    assert_eq!(seen.lock().unwrap().len(), count);
}

#[test]
fn start_notifies_subscribers_and_invokes_the_loading_task() {
    let mut harness = Harness::new(LoadingMode::Single);
    harness.stage.start(StageContext::default()).unwrap();
    assert_eq!(harness.journal(), vec!["notify:Loading"]);
    assert_eq!(harness.take_token().task(), StageTask::LoadAll);
    assert!(matches!(
        harness.stage.start(StageContext::default()),
        Err(StageError::InvariantViolation(_))
    ));
}

#[test]
fn actions_run_exit_then_edge_then_entry_once_each() {
    let mut harness = Harness::new(LoadingMode::Phased);
    harness.stage.start(StageContext::default()).unwrap();
    harness.clear_journal();

    harness.take_token().succeed();
    assert_eq!(harness.stage.poll_tasks(), 1);
    assert_eq!(
        harness.journal(),
        vec!["HideLoadingOverlay", "RenderWorld", "notify:LoadingBackground"]
    );
    assert_eq!(harness.stage.active_task(), Some(StageTask::AwaitLowPriority));
    assert_eq!(harness.tokens.lock().unwrap().len(), 1);

    harness.clear_journal();
    harness.take_token().succeed();
    harness.stage.poll_tasks();
    assert_eq!(
        harness.journal(),
        vec!["SetUpRemainingScreens", "notify:Start"]
    );
}

#[test]
fn loading_failure_lands_in_the_terminal_error_stage() {
    let mut harness = Harness::new(LoadingMode::Single);
    harness.stage.start(StageContext::default()).unwrap();
    harness.clear_journal();

    harness.take_token().fail("disk on fire");
    harness.stage.poll_tasks();

    assert_eq!(harness.stage.current_state(), Some(StageState::LoadingError));
    assert_eq!(
        harness.journal(),
        vec![
            "HideLoadingOverlay",
            "NavigateToErrorView",
            "notify:LoadingError"
        ]
    );
    harness.clear_journal();
    assert_ignored_everywhere(&mut harness);
    assert!(harness.journal().is_empty());
}

#[test]
fn a_dropped_token_counts_as_a_failure() {
    let mut harness = Harness::new(LoadingMode::Single);
    harness.stage.start(StageContext::default()).unwrap();
    drop(harness.take_token());
    harness.stage.poll_tasks();
    assert_eq!(harness.stage.current_state(), Some(StageState::LoadingError));
}

#[test]
fn events_sent_from_actions_wait_for_the_current_step() {
    let mut harness = Harness::with_follow_up(
        LoadingMode::Single,
        Some((StageAction::RenderWorld, StageEvent::Play)),
    );
    harness.stage.start(StageContext::default()).unwrap();
    harness.clear_journal();

    harness.take_token().succeed();
    harness.stage.poll_tasks();

    assert_eq!(
        harness.journal(),
        vec![
            "HideLoadingOverlay",
            "RenderWorld",
            "notify:Start",
            "notify:Menu"
        ]
    );
    assert_eq!(harness.stage.current_state(), Some(StageState::Menu));
}

#[test]
fn late_outcomes_after_shutdown_are_dropped() {
    let mut harness = Harness::new(LoadingMode::Single);
    harness.stage.start(StageContext::default()).unwrap();
    let token = harness.take_token();
    harness.stage.shutdown();
    harness.clear_journal();

    token.succeed();
    assert_eq!(harness.stage.poll_tasks(), 0);
    assert_eq!(harness.stage.current_state(), Some(StageState::Loading));
    assert!(harness.journal().is_empty());
    assert!(harness.stage.send(StageEvent::Play).is_err());
}
