use thiserror::Error;

use crate::lifecycle::ServiceState;
use crate::net::BindError;

/// Errors returned when starting a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The listening socket could not be bound. Not retried; callers are
    /// expected to treat this as fatal.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// `start_async` was already called on this instance.
    #[error("service is single-use and was already started (state: {0})")]
    AlreadyStarted(ServiceState),

    /// A stop was requested before the service got a chance to start.
    #[error("service has been stopped")]
    Stopped,
}
