//! # Demo: full domain lifecycle
//!
//! A single domain that starts a cyclic worker when `Initialize` arrives and
//! publishes `ShutdownPerformed` once the worker finishes, letting the
//! orchestrator run its ordered gentle shutdown.
//!
//! ## Flow
//! ```text
//! Orchestrator::run()
//!   ├─► PumpDomain::setup()        registers Initialize + TaskFinished listeners
//!   ├─► notify_event(Initialize)   → schedule_task(pump)
//!   ├─► pump cycles 5 times        → evaluate declares Done
//!   ├─► TaskFinished(pump)         → notify_event(ShutdownPerformed)
//!   └─► gentle shutdown of scheduler, then dispatcher
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --bin lifecycle-demo
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use runframe::{
    Config, CyclicTask, Domain, ErrorCell, Event, ListenerFn, Orchestrator, RuntimeContext,
    TaskError, TaskState,
};

/// Domain pumping a fixed number of work cycles, then asking for shutdown.
struct PumpDomain {
    cycles: u32,
}

#[async_trait]
impl Domain for PumpDomain {
    fn name(&self) -> &str {
        "pump"
    }

    async fn setup(&self, ctx: &RuntimeContext) -> Result<(), TaskError> {
        let target = self.cycles;
        let counter = Arc::new(AtomicU32::new(0));
        let cycle_counter = Arc::clone(&counter);

        let pump = CyclicTask::arc(
            "pump-main",
            move || {
                let counter = Arc::clone(&cycle_counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!(cycle = n, "pumping");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(())
                }
            },
            move |_state: TaskState, cell: &ErrorCell| {
                if cell.has_error_occurred() {
                    TaskState::Error
                } else if counter.load(Ordering::SeqCst) >= target {
                    TaskState::Done
                } else {
                    TaskState::Running
                }
            },
        );
        let pump_id = pump.id();

        let start_ctx = ctx.clone();
        ctx.dispatcher()
            .register_listener(
                Event::INITIALIZE,
                ListenerFn::arc("pump-start", move |_event: Arc<Event>| {
                    let ctx = start_ctx.clone();
                    let pump = Arc::clone(&pump);
                    async move {
                        ctx.scheduler().schedule_task(pump).await;
                        Ok(())
                    }
                }),
            )
            .await;

        let finish_ctx = ctx.clone();
        ctx.dispatcher()
            .register_listener(
                Event::TASK_FINISHED,
                ListenerFn::arc("pump-finished", move |event: Arc<Event>| {
                    let ctx = finish_ctx.clone();
                    async move {
                        let ours = event
                            .finished_task()
                            .is_some_and(|task| task.id() == pump_id);
                        if ours {
                            tracing::info!("pump task has finished, requesting shutdown");
                            let _ = ctx.dispatcher().notify_event(Event::ShutdownPerformed).await;
                        }
                        Ok(())
                    }
                }),
            )
            .await;
        Ok(())
    }

    async fn shutdown(&self, _ctx: &RuntimeContext) -> Result<(), TaskError> {
        tracing::info!("pump domain shutting down");
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let runtime = Orchestrator::builder(Config::default())
        .with_domain(Arc::new(PumpDomain { cycles: 5 }))
        .build();

    match runtime.run().await {
        Ok(()) => tracing::info!("runtime stopped gracefully"),
        Err(err) => tracing::error!(%err, "runtime stopped with error"),
    }
    Ok(())
}
