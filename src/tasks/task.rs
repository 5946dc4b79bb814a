//! # Cyclic task: repeatable unit of work with an evaluate policy.
//!
//! A [`CyclicTask`] bundles a **cycle** function (one bounded unit of work,
//! performed as a fresh future per invocation) with an **evaluate** function
//! (pure policy deciding the next [`TaskState`] from the current state and
//! the cycle's [`ErrorCell`]). The scheduler drives the pair until a terminal
//! state is reached.
//!
//! ## State machine
//! ```text
//! Created ──first cycle──► Running ──evaluate──► Running   (keep going / retry)
//!                                      │
//!                                      ├────────► Done     (terminal)
//!                                      └────────► Error    (terminal)
//! ```
//!
//! Retry-vs-abort is entirely the evaluate policy's decision; the scheduler
//! applies no policy of its own.
//!
//! ## Example
//! ```rust
//! use runframe::{CyclicTask, ErrorCell, TaskState};
//!
//! let task = CyclicTask::arc(
//!     "pump",
//!     || async { Ok(()) },
//!     |_state: TaskState, cell: &ErrorCell| {
//!         if cell.has_error_occurred() { TaskState::Error } else { TaskState::Done }
//!     },
//! );
//! assert_eq!(task.state(), TaskState::Created);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::error::TaskError;
use crate::tasks::cell::ErrorCell;

/// Process-unique task identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

/// Lifecycle state of a cyclic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Not yet run.
    Created = 0,
    /// Driver loop active.
    Running = 1,
    /// Terminal, success.
    Done = 2,
    /// Terminal, failure.
    Error = 3,
}

impl TaskState {
    /// Returns true for [`TaskState::Done`] and [`TaskState::Error`].
    ///
    /// No transition leaves a terminal state; the driver stops cycling.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Error)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskState::Created,
            1 => TaskState::Running,
            2 => TaskState::Done,
            _ => TaskState::Error,
        }
    }
}

/// Future produced by one cycle invocation.
pub type CycleFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;

/// Shared handle to a cyclic task (`Arc<CyclicTask>`).
///
/// The creator keeps one for state inspection; after submission the
/// scheduler exclusively drives the state transitions.
pub type TaskRef = Arc<CyclicTask>;

type CycleFn = dyn Fn() -> CycleFuture + Send + Sync;
type EvaluateFn = dyn Fn(TaskState, &ErrorCell) -> TaskState + Send + Sync;

/// Repeatable unit of work driven by the
/// [`TaskScheduler`](crate::tasks::TaskScheduler).
///
/// ### Rules
/// - One in-flight cycle per task at any time; the driver loop is strictly
///   sequential.
/// - A fresh [`ErrorCell`] backs every cycle invocation.
/// - The evaluate function is pure policy: it may map a captured failure to
///   [`TaskState::Error`], or ignore it and stay [`TaskState::Running`].
pub struct CyclicTask {
    id: TaskId,
    name: Cow<'static, str>,
    cycle: Box<CycleFn>,
    evaluate: Box<EvaluateFn>,
    state: AtomicU8,
    cell: Mutex<ErrorCell>,
}

impl CyclicTask {
    /// Creates a new task in [`TaskState::Created`].
    ///
    /// `cycle` produces a fresh future per invocation; `evaluate` decides the
    /// next state after each cycle.
    pub fn new<C, Fut, E>(name: impl Into<Cow<'static, str>>, cycle: C, evaluate: E) -> Self
    where
        C: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
        E: Fn(TaskState, &ErrorCell) -> TaskState + Send + Sync + 'static,
    {
        Self {
            id: TaskId::generate(),
            name: name.into(),
            cycle: Box::new(move || -> CycleFuture { Box::pin(cycle()) }),
            evaluate: Box::new(evaluate),
            state: AtomicU8::new(TaskState::Created as u8),
            cell: Mutex::new(ErrorCell::new()),
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<C, Fut, E>(name: impl Into<Cow<'static, str>>, cycle: C, evaluate: E) -> TaskRef
    where
        C: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
        E: Fn(TaskState, &ErrorCell) -> TaskState + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, cycle, evaluate))
    }

    /// Process-unique identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Stable, human-readable task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state. Safe to call from any thread at any time.
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true once the task reached a terminal state.
    pub fn has_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Runs one cycle: swaps in a fresh cell, awaits the cycle future and
    /// captures its failure, if any. Driver-only.
    pub(crate) async fn run_cycle(&self) {
        if self.state() == TaskState::Created {
            self.set_state(TaskState::Running);
        }
        self.lock_cell().clear();

        let result = (self.cycle)().await;
        if let Err(failure) = result {
            self.lock_cell().record(failure);
        }
    }

    /// Applies the evaluate policy to the cycle just run and commits the
    /// next state. Driver-only.
    pub(crate) fn evaluate_next(&self) -> TaskState {
        let next = {
            let cell = self.lock_cell();
            (self.evaluate)(self.state(), &cell)
        };
        self.set_state(next);
        next
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn lock_cell(&self) -> std::sync::MutexGuard<'_, ErrorCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CyclicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyclicTask")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn done_when_clean(_state: TaskState, cell: &ErrorCell) -> TaskState {
        if cell.has_error_occurred() {
            TaskState::Error
        } else {
            TaskState::Done
        }
    }

    #[tokio::test]
    async fn test_first_cycle_moves_created_to_running() {
        let task = CyclicTask::new("probe", || async { Ok(()) }, done_when_clean);
        assert_eq!(task.state(), TaskState::Created);

        task.run_cycle().await;
        assert_eq!(task.state(), TaskState::Running);

        assert_eq!(task.evaluate_next(), TaskState::Done);
        assert!(task.has_finished());
    }

    #[tokio::test]
    async fn test_failed_cycle_reaches_error_through_policy() {
        let task = CyclicTask::new(
            "broken",
            || async { Err(TaskError::fail("cycle exploded")) },
            done_when_clean,
        );

        task.run_cycle().await;
        assert_eq!(task.evaluate_next(), TaskState::Error);
    }

    #[tokio::test]
    async fn test_cell_is_fresh_every_cycle() {
        let fail_once = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fail_once);
        let task = CyclicTask::new(
            "flaky",
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TaskError::fail("transient"))
                    } else {
                        Ok(())
                    }
                }
            },
            // Retry policy: ignore failures, finish on the first clean cycle.
            |_state: TaskState, cell: &ErrorCell| {
                if cell.has_error_occurred() {
                    TaskState::Running
                } else {
                    TaskState::Done
                }
            },
        );

        task.run_cycle().await;
        assert_eq!(task.evaluate_next(), TaskState::Running);

        // The transient failure must not leak into the second cycle's cell.
        task.run_cycle().await;
        assert_eq!(task.evaluate_next(), TaskState::Done);
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = CyclicTask::new("a", || async { Ok(()) }, done_when_clean);
        let b = CyclicTask::new("b", || async { Ok(()) }, done_when_clean);
        assert_ne!(a.id(), b.id());
    }
}
