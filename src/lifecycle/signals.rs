//! OS signal handling.
//!
//! # Responsibilities
//! - Subscribe to SIGINT (Ctrl+C) and, on unix, SIGTERM
//! - Translate whichever arrives first into a [`TerminationSignal`]
//!
//! # Design Decisions
//! - Uses Tokio's signal driver, which is already a single process-wide
//!   signal-to-channel adapter; each call is one fresh subscription
//! - No global state lives in the service itself
//! - A signal source that cannot be installed is logged and never fires,
//!   so the other source still works

use std::future::pending;

/// The OS event that asked the process to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationSignal::Interrupt => write!(f, "SIGINT"),
            TerminationSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait until the process receives a termination signal.
pub async fn wait_for_termination() -> TerminationSignal {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    let signal = tokio::select! {
        () = interrupt => TerminationSignal::Interrupt,
        () = terminate => TerminationSignal::Terminate,
    };

    tracing::info!(%signal, "Shutdown signal received");
    signal
}
