//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind the service's listening socket synchronously
//! - Report the concrete local address (resolves port 0)
//!
//! # Design Decisions
//! - Binding happens on the caller's thread, before the accept loop is
//!   spawned, so bind failures surface from `start_async` itself
//! - Bind failure is never retried here

use std::net::{SocketAddr, TcpListener};

use thiserror::Error;

/// The listening socket could not be bound.
#[derive(Debug, Error)]
#[error("failed to bind {addr}: {source}")]
pub struct BindError {
    pub addr: SocketAddr,
    #[source]
    pub source: std::io::Error,
}

/// Bind a non-blocking TCP listener ready to be handed to the accept loop.
pub fn bind(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), BindError> {
    let wrap = |source| BindError { addr, source };

    let listener = TcpListener::bind(addr).map_err(wrap)?;
    listener.set_nonblocking(true).map_err(wrap)?;
    let local_addr = listener.local_addr().map_err(wrap)?;

    tracing::debug!(
        requested = %addr,
        address = %local_addr,
        "Listener bound"
    );

    Ok((listener, local_addr))
}
