//! RPC transport subsystem.
//!
//! # Data Flow
//! ```text
//! register_handler callback (once, at start)
//!     → transport.rs (TransportServer collects methods)
//!     → axum Router + unimplemented fallback + TraceLayer
//!     → served by the accept loop
//! ```

pub mod transport;

pub use transport::TransportServer;
