//! # Event dispatcher: keyed listener registry and asynchronous fan-out.
//!
//! [`EventDispatcher`] groups listeners by [`EventType`] and fans each
//! published event out to every listener registered for that type, one
//! spawned delivery unit per listener.
//!
//! ## Architecture
//! ```text
//! register_listener(type, l) ──► registry: EventType -> [Registration]
//!                                     ▲ (single guard, map ops only)
//! notify_event(event) ─────────► snapshot bucket (defensive copy)
//!        │                            │
//!        │          ┌─────────────────┼─────────────────┐
//!        │          ▼                 ▼                 ▼
//!        │     deliver(L1)       deliver(L2)       deliver(LN)     (WorkerPool)
//!        │          └────────── catch_unwind per delivery ─────────┘
//!        ▼
//!   EventBlocker over all spawned deliveries
//! ```
//!
//! ## Rules
//! - The guard is never held while caller-supplied code runs; dispatch works
//!   on a snapshot, so a slow listener cannot block (un)registration.
//! - A registration is visible to every snapshot taken after its insertion
//!   committed; in-flight deliveries are unaffected by later unregistration.
//! - No delivery order is guaranteed among the listeners of one event.
//! - An event with zero listeners is a warning-level diagnostic, not an
//!   error; the returned blocker is trivially finished.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DispatchError, RuntimeError, TaskError};
use crate::events::blocker::EventBlocker;
use crate::events::event::{Event, EventType};
use crate::events::listener::{ConnectionId, ListenerRef};
use crate::pool::{exit_process_hook, FatalHook, WorkerPool};

/// One committed listener registration.
struct Registration {
    key: Uuid,
    listener: ListenerRef,
}

/// Keyed registry of listeners with asynchronous fan-out delivery.
pub struct EventDispatcher {
    connections: RwLock<HashMap<EventType, Vec<Registration>>>,
    pool: WorkerPool,
}

impl EventDispatcher {
    /// Creates a dispatcher with the production fatal hook (process exit on
    /// a fully stalled shutdown).
    pub fn new() -> Self {
        Self::with_fatal_hook(exit_process_hook())
    }

    /// Creates a dispatcher with an injected last-resort action.
    pub fn with_fatal_hook(fatal: FatalHook) -> Self {
        tracing::debug!("event dispatcher created");
        Self {
            connections: RwLock::new(HashMap::new()),
            pool: WorkerPool::new("dispatcher", fatal),
        }
    }

    /// Registers a listener for one event type. Always succeeds; never
    /// blocks on in-flight dispatch.
    pub async fn register_listener(
        &self,
        event_type: EventType,
        listener: ListenerRef,
    ) -> ConnectionId {
        let id = ConnectionId::new(event_type, Uuid::new_v4());
        let mut connections = self.connections.write().await;
        connections.entry(event_type).or_default().push(Registration {
            key: id.key(),
            listener,
        });
        tracing::debug!(event_type, connection = %id, "listener registered");
        id
    }

    /// Removes a registration.
    ///
    /// Fails with [`DispatchError::NotFound`] when no registration for the
    /// identifier's event type carries it, including the case where the event
    /// type itself was never registered. Deliveries already dispatched are
    /// unaffected.
    pub async fn unregister_listener(&self, id: ConnectionId) -> Result<(), DispatchError> {
        let mut connections = self.connections.write().await;
        let bucket = connections
            .get_mut(&id.event_type())
            .ok_or(DispatchError::NotFound { connection: id })?;
        let before = bucket.len();
        bucket.retain(|reg| reg.key != id.key());
        if bucket.len() == before {
            return Err(DispatchError::NotFound { connection: id });
        }
        tracing::debug!(connection = %id, "listener unregistered");
        Ok(())
    }

    /// Publishes an event to all currently registered listeners of its type.
    ///
    /// Each delivery runs as an independent unit of work; the caller never
    /// blocks unless it calls [`EventBlocker::block`] on the returned handle.
    /// After shutdown has begun, publication is refused and the returned
    /// blocker is trivially finished.
    pub async fn notify_event(&self, event: Event) -> EventBlocker {
        let event = Arc::new(event);
        let snapshot: Vec<ListenerRef> = {
            let connections = self.connections.read().await;
            connections
                .get(&event.event_type())
                .map(|bucket| bucket.iter().map(|reg| Arc::clone(&reg.listener)).collect())
                .unwrap_or_default()
        };

        if snapshot.is_empty() {
            tracing::warn!(event_type = event.event_type(), "no listeners for event");
            return EventBlocker::finished();
        }
        if self.pool.is_closed() {
            tracing::warn!(
                event_type = event.event_type(),
                "event refused, dispatcher is shutting down"
            );
            return EventBlocker::finished();
        }

        let mut handles = Vec::with_capacity(snapshot.len());
        for listener in snapshot {
            let delivery = deliver(listener, Arc::clone(&event));
            // Lost race with a concurrent shutdown: the remaining deliveries
            // of this publication are refused as a unit.
            match self.pool.spawn(delivery) {
                Some(handle) => handles.push(handle),
                None => break,
            }
        }
        EventBlocker::new(handles)
    }

    /// Two-phase shutdown: stop accepting events, wait `soft` for in-flight
    /// deliveries, then cancel stragglers and wait `hard`. If work still
    /// remains, the fatal hook runs (default: process termination).
    pub async fn gentle_shutdown(
        &self,
        soft: Duration,
        hard: Duration,
    ) -> Result<(), RuntimeError> {
        self.pool.shutdown_graceful(soft, hard).await
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one listener callback with panic isolation, exactly one per spawned
/// delivery unit.
async fn deliver(listener: ListenerRef, event: Arc<Event>) -> Result<(), TaskError> {
    let fut = listener.on_event(event);
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => {
            let info = {
                let any = &*panic_err;
                if let Some(msg) = any.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = any.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                }
            };
            tracing::warn!(listener = listener.name(), %info, "listener panicked");
            Err(TaskError::Fail { error: info })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener::ListenerFn;
    use std::sync::Mutex;
    use tokio::time::sleep;

    const EVENT_TYPE: EventType = 7;
    const BLOCK_LIMIT: Duration = Duration::from_secs(10);

    /// Listener capturing the last received event.
    fn capturing(slot: &Arc<Mutex<Option<Arc<Event>>>>) -> ListenerRef {
        let slot = Arc::clone(slot);
        ListenerFn::arc("capture", move |event: Arc<Event>| {
            let slot = Arc::clone(&slot);
            async move {
                *slot.lock().expect("capture slot") = Some(event);
                Ok(())
            }
        })
    }

    fn sleepy(slot: &Arc<Mutex<Option<Arc<Event>>>>, delay: Duration) -> ListenerRef {
        let slot = Arc::clone(slot);
        ListenerFn::arc("sleepy", move |event: Arc<Event>| {
            let slot = Arc::clone(&slot);
            async move {
                sleep(delay).await;
                *slot.lock().expect("capture slot") = Some(event);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_registered_listener_receives_event() {
        let uut = EventDispatcher::new();
        let slot = Arc::new(Mutex::new(None));
        uut.register_listener(EVENT_TYPE, capturing(&slot)).await;

        let mut blocker = uut.notify_event(Event::custom(EVENT_TYPE, "ping")).await;
        blocker.block(BLOCK_LIMIT).await.expect("deliveries finish");

        let caught = slot.lock().expect("slot").clone().expect("event captured");
        assert_eq!(caught.event_type(), EVENT_TYPE);
        assert_eq!(caught.payload::<&str>(), Some(&"ping"));
    }

    #[tokio::test]
    async fn test_unregistered_listener_is_never_invoked() {
        let uut = EventDispatcher::new();
        let slot = Arc::new(Mutex::new(None));
        let conn = uut.register_listener(EVENT_TYPE, capturing(&slot)).await;
        uut.unregister_listener(conn).await.expect("registered");

        let mut blocker = uut.notify_event(Event::custom(EVENT_TYPE, "ping")).await;
        blocker.block(BLOCK_LIMIT).await.expect("no deliveries");

        assert!(slot.lock().expect("slot").is_none());
    }

    #[tokio::test]
    async fn test_unregister_unknown_connection_fails_on_empty_registry() {
        let uut = EventDispatcher::new();
        let stray = ConnectionId::new(EVENT_TYPE, Uuid::new_v4());

        match uut.unregister_listener(stray).await {
            Err(DispatchError::NotFound { connection }) => assert_eq!(connection, stray),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregister_unknown_connection_fails_among_unrelated_entries() {
        let uut = EventDispatcher::new();
        let slot = Arc::new(Mutex::new(None));
        uut.register_listener(EVENT_TYPE, capturing(&slot)).await;

        let stray = ConnectionId::new(EVENT_TYPE, Uuid::new_v4());
        assert!(matches!(
            uut.unregister_listener(stray).await,
            Err(DispatchError::NotFound { .. })
        ));
        // Removing twice reports NotFound the second time.
        let conn = uut.register_listener(EVENT_TYPE, capturing(&slot)).await;
        uut.unregister_listener(conn).await.expect("first removal");
        assert!(matches!(
            uut.unregister_listener(conn).await,
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_listeners_yields_finished_blocker() {
        let uut = EventDispatcher::new();
        let blocker = uut.notify_event(Event::Initialize).await;
        assert!(blocker.has_finished());
        assert_eq!(blocker.pending_deliveries(), 0);
    }

    #[tokio::test]
    async fn test_execution_is_asynchronous() {
        let uut = EventDispatcher::new();
        let slot = Arc::new(Mutex::new(None));
        uut.register_listener(EVENT_TYPE, sleepy(&slot, Duration::from_millis(200)))
            .await;

        let mut blocker = uut.notify_event(Event::custom(EVENT_TYPE, 1u8)).await;
        assert!(!blocker.has_finished());
        assert!(slot.lock().expect("slot").is_none());

        blocker.block(BLOCK_LIMIT).await.expect("delivery finishes");
        assert!(blocker.has_finished());
        assert!(slot.lock().expect("slot").is_some());
    }

    #[tokio::test]
    async fn test_listener_failure_is_isolated_and_surfaced() {
        let uut = EventDispatcher::new();
        let failing = ListenerFn::arc("failing", |_ev: Arc<Event>| async move {
            Err(TaskError::fail("handler broke"))
        });
        let slot = Arc::new(Mutex::new(None));
        uut.register_listener(EVENT_TYPE, failing).await;
        uut.register_listener(EVENT_TYPE, capturing(&slot)).await;

        let mut blocker = uut.notify_event(Event::custom(EVENT_TYPE, 1u8)).await;
        match blocker.block(BLOCK_LIMIT).await {
            Err(DispatchError::Execution { error }) => assert!(error.contains("handler broke")),
            other => panic!("expected Execution, got {other:?}"),
        }
        // The healthy listener still got its delivery.
        blocker.block(BLOCK_LIMIT).await.expect("rest drains clean");
        assert!(slot.lock().expect("slot").is_some());
    }

    #[tokio::test]
    async fn test_listener_panic_is_captured_as_execution_failure() {
        let uut = EventDispatcher::new();
        let panicking: ListenerRef =
            ListenerFn::arc("panicking", |_ev: Arc<Event>| async move { panic!("delivery panic") });
        uut.register_listener(EVENT_TYPE, panicking).await;

        let mut blocker = uut.notify_event(Event::custom(EVENT_TYPE, 1u8)).await;
        match blocker.block(BLOCK_LIMIT).await {
            Err(DispatchError::Execution { error }) => assert!(error.contains("delivery panic")),
            other => panic!("expected Execution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gentle_shutdown_always_completes() {
        let uut = EventDispatcher::new();
        let stuck = ListenerFn::arc("stuck", |_ev: Arc<Event>| async move {
            std::future::pending::<()>().await;
            Ok(())
        });
        uut.register_listener(EVENT_TYPE, stuck).await;
        let _blocker = uut.notify_event(Event::custom(EVENT_TYPE, 1u8)).await;

        uut.gentle_shutdown(Duration::from_millis(1), Duration::from_secs(1))
            .await
            .expect("forced phase drains the stuck delivery");

        // New work is refused after shutdown.
        let blocker = uut.notify_event(Event::custom(EVENT_TYPE, 2u8)).await;
        assert!(blocker.has_finished());
    }
}
