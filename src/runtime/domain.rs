//! # Domain: an independently initialized logical subsystem.
//!
//! A domain registers event listeners and/or schedules cyclic tasks through
//! the [`RuntimeContext`] it receives. The orchestrator calls exactly one
//! `setup` step per domain before `Initialize` is published, and exactly one
//! `shutdown` step once shutdown has been requested.

use async_trait::async_trait;

use crate::error::TaskError;
use crate::runtime::context::RuntimeContext;

/// Contract for a logical subsystem managed by the
/// [`Orchestrator`](crate::runtime::Orchestrator).
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use runframe::{Domain, RuntimeContext, TaskError};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Domain for Audit {
///     fn name(&self) -> &str { "audit" }
///
///     async fn setup(&self, _ctx: &RuntimeContext) -> Result<(), TaskError> {
///         // register listeners, prepare cyclic tasks...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Domain: Send + Sync + 'static {
    /// Stable, human-readable domain name.
    fn name(&self) -> &str;

    /// Single initialize step: register listeners and prepare work.
    ///
    /// A failure here aborts the whole runtime start; `Initialize` is never
    /// published.
    async fn setup(&self, ctx: &RuntimeContext) -> Result<(), TaskError>;

    /// Single shutdown step, run after shutdown was requested and before the
    /// components drain. Failures are logged, never fatal.
    async fn shutdown(&self, _ctx: &RuntimeContext) -> Result<(), TaskError> {
        Ok(())
    }
}
