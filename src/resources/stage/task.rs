//! Invoked tasks: the asynchronous operations a stage starts on entry.
//!
//! When a state with an attached [`StageTask`] is entered, the controller
//! hands a [`TaskToken`] to its [`TaskInvoker`]. Whoever runs the task
//! settles the token exactly once, from any thread. The outcome travels
//! back over a channel and is only acted upon by
//! [`StageController::poll_tasks`], on the controller's own thread.
//!
//! Tokens carry the id of the state instance that created them. Once that
//! instance has been exited, a late outcome is dropped instead of being
//! turned into a `Done`/`Error` event.
//!
//! [`StageController::poll_tasks`]: crate::resources::stage::StageController::poll_tasks

use crossbeam_channel::Sender;
use log::debug;

use super::machine::StageTask;

/// Identifier of one task invocation (one entry into a state).
pub type InvocationId = u64;

/// Result of an invoked task, as delivered to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub invocation: InvocationId,
    pub task: StageTask,
    pub result: Result<(), String>,
}

/// One-shot completion handle for an invoked task.
///
/// Dropping an unsettled token reports a failure, so a task that is lost
/// still ends up on the state's error edge instead of stalling silently.
#[derive(Debug)]
pub struct TaskToken {
    invocation: InvocationId,
    task: StageTask,
    tx: Sender<TaskOutcome>,
    settled: bool,
}

impl TaskToken {
    pub(crate) fn new(invocation: InvocationId, task: StageTask, tx: Sender<TaskOutcome>) -> Self {
        Self {
            invocation,
            task,
            tx,
            settled: false,
        }
    }

    pub fn task(&self) -> StageTask {
        self.task
    }

    pub fn invocation(&self) -> InvocationId {
        self.invocation
    }

    /// Report success; the controller will process a `Done` event.
    pub fn succeed(mut self) {
        self.settle(Ok(()));
    }

    /// Report failure; the controller will process an `Error` event.
    pub fn fail(mut self, cause: impl Into<String>) {
        self.settle(Err(cause.into()));
    }

    fn settle(&mut self, result: Result<(), String>) {
        self.settled = true;
        let outcome = TaskOutcome {
            invocation: self.invocation,
            task: self.task,
            result,
        };
        // The controller may already be gone; nothing left to notify then.
        if self.tx.send(outcome).is_err() {
            debug!(
                "Task {:?} (invocation {}) settled after its controller was dropped",
                self.task, self.invocation
            );
        }
    }
}

impl Drop for TaskToken {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(Err(format!("task {:?} was dropped unsettled", self.task)));
        }
    }
}

/// Runs the task attached to a state entry.
///
/// `invoke` must not block: start the work and keep the token until it
/// settles.
pub trait TaskInvoker: Send + Sync {
    fn invoke(&mut self, token: TaskToken);
}

/// Invoker for machines that never enter a state with a task, or for tests
/// that resolve tokens by hand.
impl<F> TaskInvoker for F
where
    F: FnMut(TaskToken) + Send + Sync,
{
    fn invoke(&mut self, token: TaskToken) {
        self(token)
    }
}
