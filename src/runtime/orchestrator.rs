//! # Orchestrator: deterministic domain lifecycle.
//!
//! The [`Orchestrator`] owns both runtime components and walks every
//! registered [`Domain`] through the same sequence:
//!
//! ```text
//! run()
//!   ├─► domain.setup(ctx)          for each domain, in registration order
//!   ├─► register ShutdownPerformed listener
//!   ├─► scheduler.init()           queued tasks start
//!   ├─► dispatcher.notify_event(Initialize)
//!   ├─► wait: ShutdownPerformed event  OR  OS termination signal
//!   ├─► domain.shutdown(ctx)       reverse registration order, non-fatal
//!   ├─► scheduler.gentle_shutdown(soft, hard)
//!   └─► dispatcher.gentle_shutdown(soft, hard)
//! ```
//!
//! The scheduler drains first so final `TaskFinished` publications still
//! reach their listeners.
//!
//! ## Example
//! ```rust,no_run
//! use runframe::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = Orchestrator::builder(Config::default()).build();
//!     // runtime.context() hands out the dispatcher/scheduler for ad-hoc use;
//!     // domains are added through the builder.
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::Notify;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Event, EventDispatcher, ListenerFn};
use crate::pool::{exit_process_hook, FatalHook};
use crate::runtime::context::RuntimeContext;
use crate::runtime::domain::Domain;
use crate::runtime::signal;
use crate::tasks::TaskScheduler;

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: Config,
    domains: Vec<Arc<dyn Domain>>,
    fatal: FatalHook,
}

impl OrchestratorBuilder {
    /// Adds a domain; setup order follows registration order.
    pub fn with_domain(mut self, domain: Arc<dyn Domain>) -> Self {
        self.domains.push(domain);
        self
    }

    /// Replaces the last-resort shutdown action of both components.
    ///
    /// The default terminates the process; tests inject an observing hook.
    pub fn with_fatal_hook(mut self, fatal: FatalHook) -> Self {
        self.fatal = fatal;
        self
    }

    /// Builds the orchestrator and both runtime components.
    pub fn build(self) -> Orchestrator {
        let dispatcher = Arc::new(EventDispatcher::with_fatal_hook(Arc::clone(&self.fatal)));
        let scheduler = Arc::new(TaskScheduler::with_fatal_hook(
            Arc::clone(&dispatcher),
            self.fatal,
        ));
        Orchestrator {
            config: self.config,
            ctx: RuntimeContext::new(dispatcher, scheduler),
            domains: self.domains,
        }
    }
}

/// Owns the dispatcher and the scheduler and drives the domain lifecycle.
pub struct Orchestrator {
    config: Config,
    ctx: RuntimeContext,
    domains: Vec<Arc<dyn Domain>>,
}

impl Orchestrator {
    /// Starts building an orchestrator with the given configuration.
    pub fn builder(config: Config) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            domains: Vec::new(),
            fatal: exit_process_hook(),
        }
    }

    /// The dependency-injection context handed to every domain.
    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    /// Runs the full lifecycle described in the module docs.
    ///
    /// Returns once shutdown completed, or as soon as a domain fails its
    /// setup step (in which case `Initialize` is never published and both
    /// components are drained immediately).
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if let Err(err) = self.setup_domains().await {
            // Unwind what was already set up before surfacing the failure.
            self.shutdown_components().await?;
            return Err(err);
        }

        let shutdown_requested = self.register_shutdown_listener().await;

        self.ctx.scheduler().init().await;
        tracing::info!("publishing initialize");
        let _blocker = self.ctx.dispatcher().notify_event(Event::Initialize).await;

        tokio::select! {
            _ = shutdown_requested.notified() => {
                tracing::info!("shutdown performed event received");
            }
            _ = signal::wait_for_termination() => {
                tracing::info!("termination signal received");
            }
        }

        self.shutdown_domains().await;
        self.shutdown_components().await
    }

    async fn setup_domains(&self) -> Result<(), RuntimeError> {
        for domain in &self.domains {
            tracing::info!(domain = domain.name(), "domain setup");
            domain
                .setup(&self.ctx)
                .await
                .map_err(|err| RuntimeError::DomainSetup {
                    domain: domain.name().to_string(),
                    error: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Registers the listener that turns `ShutdownPerformed` into a wakeup.
    async fn register_shutdown_listener(&self) -> Arc<Notify> {
        let shutdown_requested = Arc::new(Notify::new());
        let notify = Arc::clone(&shutdown_requested);
        self.ctx
            .dispatcher()
            .register_listener(
                Event::SHUTDOWN_PERFORMED,
                ListenerFn::arc("shutdown-performed", move |_event: Arc<Event>| {
                    let notify = Arc::clone(&notify);
                    async move {
                        notify.notify_one();
                        Ok(())
                    }
                }),
            )
            .await;
        shutdown_requested
    }

    /// Runs every domain's single shutdown step, reverse registration order.
    async fn shutdown_domains(&self) {
        for domain in self.domains.iter().rev() {
            if let Err(err) = domain.shutdown(&self.ctx).await {
                tracing::warn!(
                    domain = domain.name(),
                    error = %err,
                    "domain shutdown step failed"
                );
            }
        }
    }

    /// Scheduler first, then dispatcher, each with the configured budgets.
    async fn shutdown_components(&self) -> Result<(), RuntimeError> {
        let (soft, hard) = (self.config.soft_timeout, self.config.hard_timeout);
        self.ctx.scheduler().gentle_shutdown(soft, hard).await?;
        self.ctx.dispatcher().gentle_shutdown(soft, hard).await
    }
}
