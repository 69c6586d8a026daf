//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Service lifecycle produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (up gauge, start/stop counters, drain histogram)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
