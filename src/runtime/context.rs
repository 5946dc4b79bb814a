//! # Runtime context handed to every domain.
//!
//! [`RuntimeContext`] replaces global singleton access with explicit
//! dependency injection: the orchestrator owns the dispatcher and the
//! scheduler, and every domain receives this handle at each lifecycle step.

use std::sync::Arc;

use crate::events::EventDispatcher;
use crate::tasks::TaskScheduler;

/// Shared handles to the two runtime components.
#[derive(Clone)]
pub struct RuntimeContext {
    dispatcher: Arc<EventDispatcher>,
    scheduler: Arc<TaskScheduler>,
}

impl RuntimeContext {
    /// Bundles the component handles; the caller keeps ownership of both.
    pub fn new(dispatcher: Arc<EventDispatcher>, scheduler: Arc<TaskScheduler>) -> Self {
        Self {
            dispatcher,
            scheduler,
        }
    }

    /// The event dispatcher.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// The task scheduler.
    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }
}
