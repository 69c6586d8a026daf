//! Service lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceBuilder (builder.rs)
//!     name, TLS intent, register_handler, on_shutdown
//!     → build(): load credentials once (fails fast)
//!     → RpcService [Ready]
//!
//! RpcService (service.rs)
//!     start_async(port): bind → register handlers → spawn accept loop [Listening]
//!     stop(deadline):    stop accepting [Draining] → drain → hook → [Stopped]
//!     start_and_wait:    start_async → termination signal → stop
//! ```

pub mod builder;
pub mod error;
#[allow(clippy::module_inception)]
pub mod service;

pub use builder::{ServiceBuilder, TransportSecurityPolicy, DEFAULT_DRAIN_TIMEOUT};
pub use error::ServiceError;
pub use service::{RpcService, ServiceHandle};
