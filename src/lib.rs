//! Lifecycle management for a network-exposed RPC service.
//!
//! ```text
//!   ServiceBuilder ──build()──▶ RpcService [Ready]
//!                                  │ start_async(port)
//!                                  ▼
//!                        [Listening] accept loop task
//!                                  │ stop(deadline) / SIGINT / SIGTERM
//!                                  ▼
//!                        [Draining] in-flight requests finish
//!                                  │ drained or deadline elapsed
//!                                  ▼
//!                        [Stopped] shutdown hook ran once
//! ```

// Core
pub mod rpc;
pub mod service;

// Supporting subsystems
pub mod config;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use lifecycle::{ServiceState, StopOutcome};
pub use net::{BindError, CredentialLoadError};
pub use rpc::TransportServer;
pub use service::{RpcService, ServiceBuilder, ServiceError, ServiceHandle, TransportSecurityPolicy};
