//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (per-call spans, exported over OTLP)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//!     → OpenTelemetry collector (optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;

use thiserror::Error;

/// Errors raised while setting up observability.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("failed to initialize tracer: {0}")]
    TracerInit(String),

    #[error("failed to install subscriber: {0}")]
    SubscriberInit(String),
}
