//! Service state machine.

/// Lifecycle state of an [`RpcService`](crate::service::RpcService).
///
/// Transitions only move forward:
/// `Ready → Listening → Draining → Stopped`, or `Ready → Stopped` when a
/// service is stopped without ever being started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    /// Built, credentials loaded, no socket yet.
    Ready,
    /// Socket bound, accept loop running.
    Listening,
    /// No new connections; in-flight requests finishing.
    Draining,
    /// Accept loop ended and shutdown hook has run. Terminal.
    Stopped,
}

impl ServiceState {
    pub fn is_terminal(self) -> bool {
        self == ServiceState::Stopped
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceState::Ready => "ready",
            ServiceState::Listening => "listening",
            ServiceState::Draining => "draining",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
