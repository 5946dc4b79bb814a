//! # Listener abstraction and function-backed implementation.
//!
//! This module defines the [`Listener`] trait (the dispatcher's extension
//! point), the [`ListenerFn`] closure adapter and the [`ConnectionId`]
//! returned at registration time.
//!
//! A listener receives each event as `Arc<Event>` on its own spawned
//! delivery unit; slow or failing listeners never affect other deliveries of
//! the same event.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TaskError;
use crate::events::event::{Event, EventType};

/// Identifier handed to the caller at registration time.
///
/// Opaque and `Copy`; the only thing a caller can do with it is pass it back
/// to [`unregister_listener`](crate::events::EventDispatcher::unregister_listener).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    event_type: EventType,
    key: Uuid,
}

impl ConnectionId {
    pub(crate) fn new(event_type: EventType, key: Uuid) -> Self {
        Self { event_type, key }
    }

    /// The event type this registration subscribes to.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub(crate) fn key(&self) -> Uuid {
        self.key
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_type, self.key)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({self})")
    }
}

/// Contract for event handlers.
///
/// Called on a delivery-dedicated unit of work; implementations may be slow
/// without blocking the publisher or other listeners. An `Err` return (or a
/// panic) is captured per delivery and surfaced through the publication's
/// [`EventBlocker`](crate::events::EventBlocker).
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: Arc<Event>) -> Result<(), TaskError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a listener (`Arc<dyn Listener>`).
pub type ListenerRef = Arc<dyn Listener>;

/// Function-backed listener implementation.
///
/// Wraps a closure that *creates* a fresh future per delivery, so no state is
/// shared between deliveries unless the closure captures it explicitly.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use runframe::{Event, ListenerFn, ListenerRef};
///
/// let l: ListenerRef = ListenerFn::arc("audit", |event: Arc<Event>| async move {
///     let _ = event.event_type();
///     Ok(())
/// });
/// assert_eq!(l.name(), "audit");
/// ```
pub struct ListenerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ListenerFn<F> {
    /// Creates a new function-backed listener.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Listener for ListenerFn<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn on_event(&self, event: Arc<Event>) -> Result<(), TaskError> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_fn_invokes_closure() {
        let l = ListenerFn::new("probe", |event: Arc<Event>| async move {
            match event.event_type() {
                Event::INITIALIZE => Ok(()),
                other => Err(TaskError::fail(format!("unexpected type {other}"))),
            }
        });

        assert!(l.on_event(Arc::new(Event::Initialize)).await.is_ok());
        assert!(l.on_event(Arc::new(Event::ShutdownPerformed)).await.is_err());
    }

    #[test]
    fn test_connection_id_display_includes_event_type() {
        let id = ConnectionId::new(7, Uuid::new_v4());
        assert!(id.to_string().starts_with("7/"));
        assert_eq!(id.event_type(), 7);
    }
}
