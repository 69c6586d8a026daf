//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceBuilder::build
//!     → tls.rs (load certificate/key pair once, if encryption is on)
//!
//! RpcService::start_async
//!     → listener.rs (synchronous bind, port 0 resolved)
//!     → accept loop (axum-server, plain or rustls)
//! ```
//!
//! # Design Decisions
//! - Credential problems fail the build, never the start
//! - Bind problems fail the start, never the build

pub mod listener;
pub mod tls;

pub use listener::BindError;
pub use tls::{CredentialKind, CredentialLoadError};
