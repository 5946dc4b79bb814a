//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the runtime.
//!
//! Config is consumed in two places:
//! 1. **Orchestrator construction**: `Orchestrator::builder(config)`
//! 2. **Component shutdown**: both the dispatcher and the scheduler receive
//!    the soft/hard budgets when the orchestrator drives `gentle_shutdown`.

use std::time::Duration;

/// Global configuration for the runtime.
///
/// ## Field semantics
/// - `soft_timeout`: budget of the cooperative shutdown phase; in-flight
///   deliveries and task cycles get this long to finish on their own.
/// - `hard_timeout`: budget of the forced phase after outstanding work has
///   been cancelled. If work still remains when it elapses, the component's
///   fatal hook runs (default: process termination).
///
/// Both budgets apply per component; a full runtime shutdown crosses the
/// scheduler first and the dispatcher second, so the worst case is twice
/// their sum.
#[derive(Clone, Debug)]
pub struct Config {
    /// Cooperative-phase budget of a gentle shutdown.
    pub soft_timeout: Duration,

    /// Forced-phase budget after outstanding work has been cancelled.
    pub hard_timeout: Duration,
}

impl Config {
    /// Returns the upper bound of one component's `gentle_shutdown`.
    #[inline]
    pub fn shutdown_budget(&self) -> Duration {
        self.soft_timeout + self.hard_timeout
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `soft_timeout = 1s`
    /// - `hard_timeout = 1s`
    ///
    /// One second per phase keeps an interactive application responsive on
    /// exit while still giving well-behaved work a chance to drain.
    fn default() -> Self {
        Self {
            soft_timeout: Duration::from_secs(1),
            hard_timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_budget_is_sum_of_phases() {
        let cfg = Config {
            soft_timeout: Duration::from_millis(250),
            hard_timeout: Duration::from_millis(750),
        };
        assert_eq!(cfg.shutdown_budget(), Duration::from_secs(1));
    }
}
