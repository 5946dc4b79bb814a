//! # Worker pool: unbounded spawn tracking and two-phase shutdown.
//!
//! [`WorkerPool`] is the cached-growth execution abstraction shared by the
//! event dispatcher and the task scheduler (each owns an independent pool).
//! Every listener delivery and every task driver loop runs as one spawned
//! unit on its component's pool.
//!
//! ## Shutdown protocol
//! ```text
//! shutdown_graceful(soft, hard)
//!   ├─► close()                    → spawn() refuses new work
//!   ├─► wait up to `soft`          → all units drained? done.
//!   ├─► abort every live unit
//!   ├─► wait up to `hard`          → all units drained? done (forced).
//!   └─► fatal hook                 → default: severe log + process exit
//! ```
//!
//! The fatal hook is injectable so the last-resort path stays observable in
//! tests instead of killing the test process.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tokio::time;
use tokio_util::task::TaskTracker;

use crate::error::RuntimeError;

/// Action of last resort when both shutdown phases fail.
///
/// Receives the name of the component whose pool could not be drained.
pub type FatalHook = Arc<dyn Fn(&'static str) + Send + Sync>;

/// The production fatal hook: log at error level and terminate the process.
///
/// A permanently hung shutdown is worse than a crash; this path is a
/// documented part of the shutdown contract, not an accident.
pub fn exit_process_hook() -> FatalHook {
    Arc::new(|component| {
        tracing::error!(component, "shutdown failed past both budgets, terminating process");
        std::process::exit(1);
    })
}

/// Tracks every unit of asynchronous work spawned by one component.
///
/// ### Properties
/// - **Unbounded**: spawning never blocks and never queues behind a cap.
/// - **Close-once**: after [`close`](WorkerPool::close), `spawn` returns
///   `None` and the caller decides how to refuse the work.
/// - **Abortable**: live units keep an [`AbortHandle`] registered for the
///   forced shutdown phase.
pub(crate) struct WorkerPool {
    component: &'static str,
    tracker: TaskTracker,
    aborts: Mutex<Vec<AbortHandle>>,
    fatal: FatalHook,
}

impl WorkerPool {
    pub(crate) fn new(component: &'static str, fatal: FatalHook) -> Self {
        Self {
            component,
            tracker: TaskTracker::new(),
            aborts: Mutex::new(Vec::new()),
            fatal,
        }
    }

    /// Spawns a unit of work, or returns `None` once the pool is closed.
    ///
    /// Finished abort handles are pruned on each call, so the abort set
    /// stays proportional to the number of live units.
    pub(crate) fn spawn<F>(&self, fut: F) -> Option<JoinHandle<F::Output>>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.tracker.is_closed() {
            return None;
        }
        let handle = self.tracker.spawn(fut);
        let mut aborts = self.lock_aborts();
        aborts.retain(|a| !a.is_finished());
        aborts.push(handle.abort_handle());
        Some(handle)
    }

    /// Returns true once the pool refuses new work.
    pub(crate) fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Runs the two-phase shutdown protocol described in the module docs.
    pub(crate) async fn shutdown_graceful(
        &self,
        soft: Duration,
        hard: Duration,
    ) -> Result<(), RuntimeError> {
        tracing::info!(component = self.component, "gentle shutdown has begun");
        self.tracker.close();

        if time::timeout(soft, self.tracker.wait()).await.is_ok() {
            tracing::info!(component = self.component, "shutdown performed gracefully");
            return Ok(());
        }

        tracing::warn!(
            component = self.component,
            ?soft,
            "soft budget exceeded, cancelling outstanding work"
        );
        let outstanding: Vec<AbortHandle> = self.lock_aborts().drain(..).collect();
        for handle in outstanding {
            handle.abort();
        }

        if time::timeout(hard, self.tracker.wait()).await.is_ok() {
            tracing::info!(component = self.component, "shutdown completed after forced cancellation");
            return Ok(());
        }

        (self.fatal)(self.component);
        Err(RuntimeError::ShutdownStalled {
            component: self.component,
            soft,
            hard,
        })
    }

    fn lock_aborts(&self) -> std::sync::MutexGuard<'_, Vec<AbortHandle>> {
        self.aborts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Test hook: holds the pool open as if one unit never finished.
    #[cfg(test)]
    pub(crate) fn pin_unit(&self) -> tokio_util::task::task_tracker::TaskTrackerToken {
        self.tracker.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn noop_hook(flag: &Arc<AtomicBool>) -> FatalHook {
        let flag = Arc::clone(flag);
        Arc::new(move |_| flag.store(true, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_spawn_refused_after_close() {
        let pool = WorkerPool::new("test", exit_process_hook());
        assert!(pool.spawn(async {}).is_some());

        pool.shutdown_graceful(Duration::from_millis(100), Duration::from_millis(100))
            .await
            .expect("pool with finished work drains in soft phase");

        assert!(pool.is_closed());
        assert!(pool.spawn(async {}).is_none());
    }

    #[tokio::test]
    async fn test_forced_phase_cancels_stuck_unit() {
        let fatal_fired = Arc::new(AtomicBool::new(false));
        let pool = WorkerPool::new("test", noop_hook(&fatal_fired));
        pool.spawn(std::future::pending::<()>());

        let res = pool
            .shutdown_graceful(Duration::from_millis(20), Duration::from_secs(2))
            .await;

        assert!(res.is_ok(), "abort must drain a pending unit: {res:?}");
        assert!(!fatal_fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fatal_hook_fires_when_both_phases_fail() {
        let fatal_fired = Arc::new(AtomicBool::new(false));
        let pool = WorkerPool::new("test", noop_hook(&fatal_fired));
        let _pin = pool.pin_unit();

        let res = pool
            .shutdown_graceful(Duration::from_millis(10), Duration::from_millis(10))
            .await;

        assert!(fatal_fired.load(Ordering::SeqCst));
        match res {
            Err(RuntimeError::ShutdownStalled { component, .. }) => {
                assert_eq!(component, "test");
            }
            other => panic!("expected ShutdownStalled, got {other:?}"),
        }
    }
}
