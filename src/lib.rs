//! # runframe
//!
//! **runframe** is an in-process application runtime for programs assembled
//! from independently developed **domains**. Domains communicate through
//! asynchronous events, run long-lived interruptible background work on a
//! cooperative task scheduler, and terminate through a deterministic
//! two-phase shutdown protocol that never hangs the process indefinitely.
//!
//! ## Architecture
//! ```text
//!        ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!        │   Domain A   │   │   Domain B   │   │   Domain C   │
//!        └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!               │ setup / shutdown │                  │
//!               ▼                  ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                    │
//! │  - RuntimeContext (dispatcher + scheduler, dependency injection) │
//! │  - publishes Initialize, waits for ShutdownPerformed / signal    │
//! └──────┬────────────────────────────────────────────┬──────────────┘
//!        ▼                                            ▼
//! ┌─────────────────────────┐             ┌──────────────────────────┐
//! │  EventDispatcher        │◄────────────│  TaskScheduler           │
//! │  type -> [listeners]    │ TaskFinished│  id -> CyclicTask        │
//! │  fan-out per event,     │             │  one driver per task:    │
//! │  EventBlocker handle    │             │  cycle → evaluate loop   │
//! └─────────────────────────┘             └──────────────────────────┘
//!        │                                            │
//!        └─────────── WorkerPool (per component) ─────┘
//!                two-phase gentle shutdown, fatal hook
//! ```
//!
//! ## Lifecycle
//! ```text
//! Orchestrator::run()
//!   ├─► Domain::setup()              listeners registered, tasks prepared
//!   ├─► TaskScheduler::init()        queued tasks start
//!   ├─► notify_event(Initialize)     domains begin their work
//!   │        ...
//!   │   (scheduler publishes TaskFinished per completed task)
//!   │        ...
//!   ├─◄ ShutdownPerformed            published by a domain (or OS signal)
//!   ├─► Domain::shutdown()
//!   ├─► TaskScheduler::gentle_shutdown(soft, hard)
//!   └─► EventDispatcher::gentle_shutdown(soft, hard)
//! ```
//!
//! ## Features
//! | Area           | Description                                              | Key types                                  |
//! |----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Events**     | Typed publish/subscribe with per-publication wait handle | [`Event`], [`EventDispatcher`], [`EventBlocker`] |
//! | **Tasks**      | Cycle/evaluate loops driven to a terminal state          | [`CyclicTask`], [`TaskScheduler`], [`TaskState`] |
//! | **Lifecycle**  | Domain setup/shutdown around the event flow              | [`Domain`], [`Orchestrator`], [`RuntimeContext`] |
//! | **Shutdown**   | Soft wait, forced cancel, documented last resort         | [`Config`], [`FatalHook`]                  |
//! | **Errors**     | Typed errors per concern                                 | [`DispatchError`], [`TaskError`], [`RuntimeError`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use runframe::{CyclicTask, ErrorCell, EventDispatcher, TaskScheduler, TaskState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Arc::new(EventDispatcher::new());
//!     let scheduler = Arc::new(TaskScheduler::new(Arc::clone(&dispatcher)));
//!
//!     // One-shot task: a single cycle, then the policy declares it done.
//!     let task = CyclicTask::arc(
//!         "hello",
//!         || async {
//!             println!("hello from a cycle");
//!             Ok(())
//!         },
//!         |_state: TaskState, cell: &ErrorCell| {
//!             if cell.has_error_occurred() { TaskState::Error } else { TaskState::Done }
//!         },
//!     );
//!
//!     scheduler.schedule_task(Arc::clone(&task)).await;
//!     scheduler.init().await;
//!
//!     while !task.has_finished() {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!
//!     scheduler.gentle_shutdown(Duration::from_secs(1), Duration::from_secs(1)).await?;
//!     dispatcher.gentle_shutdown(Duration::from_secs(1), Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod pool;
mod runtime;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{DispatchError, RuntimeError, TaskError};
pub use events::{
    ConnectionId, Event, EventBlocker, EventDispatcher, EventType, Listener, ListenerFn,
    ListenerRef,
};
pub use pool::{exit_process_hook, FatalHook};
pub use runtime::{Domain, Orchestrator, OrchestratorBuilder, RuntimeContext};
pub use tasks::{CycleFuture, CyclicTask, ErrorCell, TaskId, TaskRef, TaskScheduler, TaskState};
