//! # Task scheduler: drives cyclic tasks to their terminal state.
//!
//! [`TaskScheduler`] owns the set of not-yet-finished [`CyclicTask`]s. Each
//! submitted task gets its own driver unit on the scheduler's pool, running
//! the cycle/evaluate loop until the task reaches a terminal state; the
//! scheduler then publishes [`Event::TaskFinished`] and removes the task
//! from its live table.
//!
//! ## Architecture
//! ```text
//! schedule_task(t) ──► table: TaskId -> TaskRef          (single guard)
//!        │                 │ not started: pending queue
//!        │                 ▼
//! init() ───────────► submit driver per queued task, flip started flag
//!                          │
//!                          ▼  (one per task, WorkerPool)
//!                   loop {
//!                     run_cycle()        — fresh cell, capture failure
//!                     evaluate_next()    — policy decides next state
//!                   } until terminal
//!                          │
//!                          ├─► dispatcher.notify_event(TaskFinished(t))
//!                          └─► remove from table under the guard
//! ```
//!
//! ## Rules
//! - Submission never blocks; before `init` tasks queue, after `init` they
//!   start immediately.
//! - The guard is never held across cycle or evaluate invocations.
//! - No retry, no backoff: when a cycle should run again is entirely the
//!   evaluate policy's decision.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::RuntimeError;
use crate::events::{Event, EventDispatcher};
use crate::pool::{exit_process_hook, FatalHook, WorkerPool};
use crate::tasks::task::{TaskId, TaskRef};

/// Everything behind the scheduler's guard.
struct Table {
    /// Live tasks, keyed by identifier; entries leave only after their
    /// completion event has been published (or on forced shutdown).
    tasks: HashMap<TaskId, TaskRef>,
    /// Tasks accepted before `init`, waiting for their driver.
    queued: Vec<TaskRef>,
    started: bool,
}

/// Cooperative scheduler for long-lived, interruptible background work.
pub struct TaskScheduler {
    table: RwLock<Table>,
    pool: WorkerPool,
    dispatcher: Arc<EventDispatcher>,
}

impl TaskScheduler {
    /// Creates a scheduler publishing completions on `dispatcher`, with the
    /// production fatal hook.
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self::with_fatal_hook(dispatcher, exit_process_hook())
    }

    /// Creates a scheduler with an injected last-resort action.
    pub fn with_fatal_hook(dispatcher: Arc<EventDispatcher>, fatal: FatalHook) -> Self {
        tracing::debug!("task scheduler created");
        Self {
            table: RwLock::new(Table {
                tasks: HashMap::new(),
                queued: Vec::new(),
                started: false,
            }),
            pool: WorkerPool::new("scheduler", fatal),
            dispatcher,
        }
    }

    /// Registers a task. Never blocks on task execution.
    ///
    /// If the scheduler has started, a driver is submitted immediately;
    /// otherwise the task waits for [`init`](TaskScheduler::init).
    pub async fn schedule_task(self: &Arc<Self>, task: TaskRef) {
        let mut table = self.table.write().await;
        tracing::info!(task = %task.id(), name = task.name(), "scheduling task");
        table.tasks.insert(task.id(), Arc::clone(&task));
        if table.started {
            self.submit(task);
        } else {
            table.queued.push(task);
        }
    }

    /// Starts the scheduler: submits a driver for every queued task and
    /// flips the started flag. Idempotent; tasks scheduled afterwards are
    /// submitted directly.
    pub async fn init(self: &Arc<Self>) {
        let mut table = self.table.write().await;
        tracing::info!(queued = table.queued.len(), "scheduler initialization");
        table.started = true;
        for task in table.queued.drain(..).collect::<Vec<_>>() {
            self.submit(task);
        }
    }

    /// Number of tasks not yet in a terminal state. Safe at any time.
    pub async fn tasks_in_queue(&self) -> usize {
        let table = self.table.read().await;
        tracing::trace!(count = table.tasks.len(), "tasks in scheduler");
        table.tasks.len()
    }

    /// Two-phase shutdown with the same semantics as the dispatcher's:
    /// stop accepting drivers, wait `soft`, cancel stragglers, wait `hard`.
    /// On return the live task table is empty.
    pub async fn gentle_shutdown(
        &self,
        soft: Duration,
        hard: Duration,
    ) -> Result<(), RuntimeError> {
        let res = self.pool.shutdown_graceful(soft, hard).await;
        // Drivers cancelled in the forced phase never ran their cleanup.
        let mut table = self.table.write().await;
        table.tasks.clear();
        table.queued.clear();
        res
    }

    /// Submits the driver unit for one task.
    fn submit(self: &Arc<Self>, task: TaskRef) {
        tracing::debug!(task = %task.id(), "submitting task driver");
        let scheduler = Arc::clone(self);
        if self.pool.spawn(scheduler.drive(task)).is_none() {
            tracing::warn!("task driver refused, scheduler is shutting down");
        }
    }

    /// Driver loop: one per task, strictly sequential cycles.
    async fn drive(self: Arc<Self>, task: TaskRef) {
        tracing::info!(task = %task.id(), name = task.name(), "starting task");
        let mut cycles: u64 = 0;
        while !task.state().is_terminal() {
            task.run_cycle().await;
            cycles += 1;
            tracing::trace!(task = %task.id(), cycles, "task finished cycle");
            task.evaluate_next();
        }

        tracing::info!(
            task = %task.id(),
            state = ?task.state(),
            cycles,
            "finalizing task"
        );
        let _blocker = self
            .dispatcher
            .notify_event(Event::TaskFinished(Arc::clone(&task)))
            .await;

        let mut table = self.table.write().await;
        table.tasks.remove(&task.id());
        tracing::debug!(task = %task.id(), "task cleanup finished");
    }
}
