//! # Runtime events exchanged between domains.
//!
//! [`Event`] is a tagged union keyed by an integer [`EventType`]. The three
//! well-known types drive the runtime lifecycle; domains define their own
//! kinds through [`Event::Custom`] with type values at or above
//! [`Event::USER_BASE`].
//!
//! Events are immutable once constructed and travel as `Arc<Event>`: one
//! allocation per publication, shared by every delivery.
//!
//! ## Example
//! ```rust
//! use runframe::Event;
//!
//! let ev = Event::custom(Event::USER_BASE + 3, "sheet-reloaded".to_string());
//! assert_eq!(ev.event_type(), Event::USER_BASE + 3);
//! assert_eq!(ev.payload::<String>().map(String::as_str), Some("sheet-reloaded"));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::tasks::TaskRef;

/// Integer discriminator identifying the logical kind of an event.
pub type EventType = u32;

/// A typed message dispatched through the
/// [`EventDispatcher`](crate::events::EventDispatcher).
#[derive(Clone)]
pub enum Event {
    /// Published once by the orchestrator; domains react by starting their
    /// cyclic tasks.
    Initialize,

    /// Published by the scheduler when a task reached a terminal state.
    /// Carries a shared reference to the finished task.
    TaskFinished(TaskRef),

    /// Published by a domain to tell the orchestrator it is safe to begin
    /// shutdown.
    ShutdownPerformed,

    /// Domain-defined event. `event_type` values below [`Event::USER_BASE`]
    /// are reserved for the runtime.
    Custom {
        /// Discriminator of the domain-defined kind.
        event_type: EventType,
        /// Opaque payload; handlers downcast via [`Event::payload`].
        payload: Arc<dyn Any + Send + Sync>,
    },
}

impl Event {
    /// Event type of [`Event::Initialize`].
    pub const INITIALIZE: EventType = 0;
    /// Event type of [`Event::TaskFinished`].
    pub const TASK_FINISHED: EventType = 1;
    /// Event type of [`Event::ShutdownPerformed`].
    pub const SHUTDOWN_PERFORMED: EventType = 2;
    /// First event type available to domain-defined events.
    pub const USER_BASE: EventType = 1024;

    /// Creates a domain-defined event from any sendable payload.
    pub fn custom(event_type: EventType, payload: impl Any + Send + Sync) -> Self {
        Event::Custom {
            event_type,
            payload: Arc::new(payload),
        }
    }

    /// Returns the integer discriminator of this event's kind.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Initialize => Self::INITIALIZE,
            Event::TaskFinished(_) => Self::TASK_FINISHED,
            Event::ShutdownPerformed => Self::SHUTDOWN_PERFORMED,
            Event::Custom { event_type, .. } => *event_type,
        }
    }

    /// Safe downcast of a [`Event::Custom`] payload.
    ///
    /// Returns `None` for the well-known variants and on type mismatch.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        match self {
            Event::Custom { payload, .. } => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the finished task for [`Event::TaskFinished`].
    pub fn finished_task(&self) -> Option<&TaskRef> {
        match self {
            Event::TaskFinished(task) => Some(task),
            _ => None,
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Initialize => f.write_str("Initialize"),
            Event::TaskFinished(task) => f.debug_tuple("TaskFinished").field(&task.id()).finish(),
            Event::ShutdownPerformed => f.write_str("ShutdownPerformed"),
            Event::Custom { event_type, .. } => f
                .debug_struct("Custom")
                .field("event_type", event_type)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_discriminators() {
        assert_eq!(Event::Initialize.event_type(), Event::INITIALIZE);
        assert_eq!(Event::ShutdownPerformed.event_type(), Event::SHUTDOWN_PERFORMED);
    }

    #[test]
    fn test_custom_payload_downcast() {
        let ev = Event::custom(Event::USER_BASE, 42u64);
        assert_eq!(ev.payload::<u64>(), Some(&42));
        assert_eq!(ev.payload::<String>(), None);
        assert_eq!(Event::Initialize.payload::<u64>(), None);
    }
}
