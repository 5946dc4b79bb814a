//! Error types used by the runframe runtime and its units of work.
//!
//! This module defines three error enums:
//!
//! - [`DispatchError`] — errors surfaced by the event dispatcher and blocker.
//! - [`TaskError`] — failures raised by a single unit of work (a listener
//!   delivery, a task cycle, a domain lifecycle step).
//! - [`RuntimeError`] — errors raised by the orchestration runtime itself.
//!
//! All types provide `as_label` helpers for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::events::ConnectionId;

/// # Errors surfaced by the event dispatcher.
///
/// `NotFound` comes from the registry, `Timeout` and `Execution` from
/// blocking on an [`EventBlocker`](crate::events::EventBlocker).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No registration with this identifier exists for its event type.
    #[error("no listener registered under connection {connection}")]
    NotFound {
        /// The identifier that could not be resolved.
        connection: ConnectionId,
    },

    /// Waiting on event deliveries exceeded the given bound.
    #[error("event deliveries still pending after {timeout:?}")]
    Timeout {
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// A listener callback failed (error return or panic) during delivery.
    #[error("listener delivery failed: {error}")]
    Execution {
        /// The underlying failure message.
        error: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NotFound { .. } => "dispatch_not_found",
            DispatchError::Timeout { .. } => "dispatch_timeout",
            DispatchError::Execution { .. } => "dispatch_execution",
        }
    }
}

/// # Failure of a single unit of work.
///
/// Produced by listener callbacks, task cycle functions and domain lifecycle
/// steps. Cycle failures are accumulated in the task's
/// [`ErrorCell`](crate::tasks::ErrorCell); whether they are fatal to the task
/// is entirely the evaluate policy's decision.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The unit of work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying failure message.
        error: String,
    },

    /// The unit of work observed cancellation and exited early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from any displayable cause.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// # Errors produced by the orchestration runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Both shutdown phases elapsed with work still outstanding.
    ///
    /// In production the component's fatal hook terminates the process before
    /// this value is observed; it is returned only when an injected hook
    /// declines to do so.
    #[error("{component}: shutdown stalled past soft {soft:?} + hard {hard:?}")]
    ShutdownStalled {
        /// The component whose pool failed to drain.
        component: &'static str,
        /// Cooperative-phase budget.
        soft: Duration,
        /// Forced-phase budget.
        hard: Duration,
    },

    /// A domain failed its setup step; the runtime never reached `Initialize`.
    #[error("domain {domain} failed during setup: {error}")]
    DomainSetup {
        /// Name of the failing domain.
        domain: String,
        /// The underlying failure message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ShutdownStalled { .. } => "runtime_shutdown_stalled",
            RuntimeError::DomainSetup { .. } => "runtime_domain_setup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_labels_are_stable() {
        let not_found = DispatchError::NotFound {
            connection: ConnectionId::new(7, Uuid::new_v4()),
        };
        assert_eq!(not_found.as_label(), "dispatch_not_found");

        let stalled = RuntimeError::ShutdownStalled {
            component: "dispatcher",
            soft: Duration::from_secs(1),
            hard: Duration::from_secs(1),
        };
        assert_eq!(stalled.as_label(), "runtime_shutdown_stalled");
    }

    #[test]
    fn test_fail_helper_preserves_message() {
        let err = TaskError::fail("boom");
        assert!(matches!(err, TaskError::Fail { ref error } if error == "boom"));
    }
}
