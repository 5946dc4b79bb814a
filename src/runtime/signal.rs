//! # OS termination signal handling.
//!
//! [`wait_for_termination`] completes when the process receives SIGINT or
//! SIGTERM (Ctrl-C on non-Unix platforms). The orchestrator treats either as
//! a shutdown request, same as a domain publishing `ShutdownPerformed`.

/// Waits for a termination signal; never resolves if signal registration
/// fails (the failure is logged and the runtime keeps waiting on the event
/// path instead).
#[cfg(unix)]
pub(crate) async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(i), Ok(t)) => (i, t),
            _ => {
                tracing::error!("signal registration failed, OS shutdown path disabled");
                return std::future::pending::<()>().await;
            }
        };

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
}

/// Waits for a termination signal; never resolves if signal registration
/// fails (the failure is logged and the runtime keeps waiting on the event
/// path instead).
#[cfg(not(unix))]
pub(crate) async fn wait_for_termination() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("signal registration failed, OS shutdown path disabled");
        std::future::pending::<()>().await;
    }
}
