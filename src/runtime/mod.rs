//! # Runtime core: domain lifecycle orchestration.
//!
//! The only public entry point is the [`Orchestrator`], which owns both
//! runtime components and walks every [`Domain`] through one setup step, the
//! `Initialize` publication, the wait for `ShutdownPerformed`, one shutdown
//! step and the ordered gentle shutdown of both components.
//!
//! Internal modules:
//! - [`context`]: dependency-injection handle passed to every domain;
//! - [`domain`]: the domain lifecycle contract;
//! - [`orchestrator`]: the lifecycle driver itself;
//! - [`signal`]: OS termination signal handling.

mod context;
mod domain;
mod orchestrator;
mod signal;

pub use context::RuntimeContext;
pub use domain::Domain;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
