//! # Blocker handle returned by event publication.
//!
//! [`EventBlocker`] references every delivery unit spawned for one
//! [`notify_event`](crate::events::EventDispatcher::notify_event) call and
//! lets the publisher optionally wait for all of them.
//!
//! ## Rules
//! - [`block`](EventBlocker::block) drains deliveries in submission order and
//!   surfaces the **first** captured listener failure.
//! - A delivery cancelled by the forced shutdown phase counts as finished.
//! - [`has_finished`](EventBlocker::has_finished) never blocks.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use crate::error::{DispatchError, TaskError};

/// Handle over the delivery units of one published event.
pub struct EventBlocker {
    handles: VecDeque<JoinHandle<Result<(), TaskError>>>,
}

impl EventBlocker {
    pub(crate) fn new(handles: Vec<JoinHandle<Result<(), TaskError>>>) -> Self {
        Self {
            handles: handles.into(),
        }
    }

    /// A blocker with nothing to wait for (zero listeners, or publication
    /// refused during shutdown).
    pub(crate) fn finished() -> Self {
        Self {
            handles: VecDeque::new(),
        }
    }

    /// Number of deliveries not yet drained by [`block`](EventBlocker::block).
    pub fn pending_deliveries(&self) -> usize {
        self.handles.len()
    }

    /// Returns true iff every referenced delivery has completed or was
    /// cancelled. Never blocks.
    pub fn has_finished(&self) -> bool {
        self.handles.iter().all(|h| h.is_finished())
    }

    /// Waits until every referenced delivery has finished.
    ///
    /// Fails with [`DispatchError::Timeout`] if the bound elapses first, or
    /// with [`DispatchError::Execution`] carrying the first listener failure
    /// in submission order. Deliveries already drained stay drained, so a
    /// timed-out call may be retried with a new bound.
    pub async fn block(&mut self, timeout: Duration) -> Result<(), DispatchError> {
        let drain = async {
            while let Some(handle) = self.handles.front_mut() {
                let joined = handle.await;
                self.handles.pop_front();
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        return Err(DispatchError::Execution {
                            error: err.to_string(),
                        });
                    }
                    // Aborted by the forced shutdown phase.
                    Err(join_err) if join_err.is_cancelled() => {}
                    Err(join_err) => {
                        return Err(DispatchError::Execution {
                            error: join_err.to_string(),
                        });
                    }
                }
            }
            Ok(())
        };

        match time::timeout(timeout, drain).await {
            Ok(res) => res,
            Err(_elapsed) => Err(DispatchError::Timeout { timeout }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_blocker_is_already_finished() {
        let mut blocker = EventBlocker::finished();
        assert!(blocker.has_finished());
        assert!(blocker.block(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_block_times_out_on_stuck_delivery() {
        let handle = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        let mut blocker = EventBlocker::new(vec![handle]);

        let res = blocker.block(Duration::from_millis(20)).await;
        match res {
            Err(DispatchError::Timeout { .. }) => {}
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(!blocker.has_finished());
        assert_eq!(blocker.pending_deliveries(), 1);
    }

    #[tokio::test]
    async fn test_block_surfaces_first_failure_in_submission_order() {
        let first = tokio::spawn(async { Err(TaskError::fail("first failure")) });
        let second = tokio::spawn(async { Err(TaskError::fail("second failure")) });
        let mut blocker = EventBlocker::new(vec![first, second]);

        let res = blocker.block(Duration::from_secs(1)).await;
        match res {
            Err(DispatchError::Execution { error }) => {
                assert!(error.contains("first failure"), "{error}");
            }
            other => panic!("expected Execution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_delivery_counts_as_finished() {
        let handle = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        handle.abort();
        let mut blocker = EventBlocker::new(vec![handle]);

        blocker
            .block(Duration::from_secs(1))
            .await
            .expect("aborted delivery is not a failure");
        assert!(blocker.has_finished());
    }
}
