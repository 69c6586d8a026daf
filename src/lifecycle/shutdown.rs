//! Shutdown coordination: the drain procedure and the shutdown hook.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum_server::Handle;

/// How often the drain loop re-checks the live connection count.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Upper bound on waiting for forcibly closed connections to unwind.
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// How a stop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Every in-flight request completed before the deadline.
    Drained,
    /// The deadline elapsed; remaining connections were closed forcibly.
    DeadlineElapsed { remaining_connections: usize },
}

impl StopOutcome {
    pub fn is_drained(&self) -> bool {
        matches!(self, StopOutcome::Drained)
    }

    /// Metric label for this outcome.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopOutcome::Drained => "drained",
            StopOutcome::DeadlineElapsed { .. } => "deadline_elapsed",
        }
    }
}

/// Stop accepting, then wait for open connections to finish, bounded by `deadline`.
///
/// The server stops accepting immediately. Connections still open when the
/// deadline elapses are closed forcibly, so this always returns within
/// roughly `deadline`.
pub async fn drain(handle: &Handle, deadline: Duration) -> StopOutcome {
    // No timeout on the server side: the deadline is enforced here so the
    // outcome reported is exactly what happened.
    handle.graceful_shutdown(None);
    let started = Instant::now();

    loop {
        let remaining = handle.connection_count();
        if remaining == 0 {
            tracing::debug!(elapsed = ?started.elapsed(), "No active connections left");
            return StopOutcome::Drained;
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            tracing::warn!(
                remaining_connections = remaining,
                deadline = ?deadline,
                "Drain deadline elapsed, closing remaining connections"
            );
            handle.shutdown();
            wait_closed(handle, FORCE_CLOSE_GRACE).await;
            return StopOutcome::DeadlineElapsed {
                remaining_connections: remaining,
            };
        }

        tracing::trace!(remaining_connections = remaining, elapsed = ?elapsed, "Draining");
        tokio::time::sleep(DRAIN_POLL_INTERVAL.min(deadline - elapsed)).await;
    }
}

/// Wait for connection tasks to notice a forced shutdown and drop their handlers.
async fn wait_closed(handle: &Handle, grace: Duration) {
    let started = Instant::now();
    while handle.connection_count() > 0 && started.elapsed() < grace {
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

type HookFn = Box<dyn FnOnce() + Send + 'static>;

/// Caller-supplied cleanup that runs at most once.
pub struct ShutdownHook {
    hook: Mutex<Option<HookFn>>,
}

impl ShutdownHook {
    pub fn new(hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            hook: Mutex::new(Some(Box::new(hook))),
        }
    }

    /// A hook that does nothing.
    pub fn none() -> Self {
        Self {
            hook: Mutex::new(None),
        }
    }

    /// Run the hook if it has not run yet. Returns whether it ran now.
    ///
    /// A panicking hook is logged and counts as having run.
    pub fn fire(&self) -> bool {
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(hook) = hook else {
            return false;
        };

        if catch_unwind(AssertUnwindSafe(hook)).is_err() {
            tracing::error!("Shutdown hook panicked");
        }
        true
    }
}

impl std::fmt::Debug for ShutdownHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self
            .hook
            .lock()
            .map(|hook| hook.is_some())
            .unwrap_or(false);
        f.debug_struct("ShutdownHook")
            .field("pending", &pending)
            .finish()
    }
}
