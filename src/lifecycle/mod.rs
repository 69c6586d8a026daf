//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! State (state.rs):
//!     Ready → Listening → Draining → Stopped
//!
//! Shutdown (shutdown.rs):
//!     Stop requested → Stop accepting → Drain connections (bounded)
//!         → Force close leftovers → Shutdown hook (once) → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → same path as an explicit stop
//! ```
//!
//! # Design Decisions
//! - A service instance is single-use: no transition out of Stopped
//! - Shutdown has a deadline: forced close after it, never an error
//! - The hook runs after the accept loop has ended, never during requests

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::{ShutdownHook, StopOutcome};
pub use signals::{wait_for_termination, TerminationSignal};
pub use state::ServiceState;
