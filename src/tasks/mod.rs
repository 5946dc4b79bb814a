//! # Cyclic tasks and their scheduler.
//!
//! This module provides the background-work half of the runtime:
//! - [`ErrorCell`] - per-cycle accumulator of failure causes
//! - [`TaskState`] - lifecycle enumeration (`Created`/`Running`/`Done`/`Error`)
//! - [`CyclicTask`], [`TaskRef`] - repeatable unit of work with an evaluate policy
//! - [`TaskScheduler`] - drives each task's cycle/evaluate loop to completion

mod cell;
mod scheduler;
mod task;

pub use cell::ErrorCell;
pub use scheduler::TaskScheduler;
pub use task::{CycleFuture, CyclicTask, TaskId, TaskRef, TaskState};
