//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber
//! - Pick the log filter (`RUST_LOG` first, then configured level)
//! - Attach the OpenTelemetry export layer when a collector is configured

use opentelemetry::trace::TracerProvider as _;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TelemetryConfig;
use crate::observability::tracing::{init_tracer_provider, TracingGuard};
use crate::observability::TelemetryError;

/// Initialize logging and, if configured, span export.
///
/// The returned guard must be held until shutdown so buffered spans are
/// flushed.
pub fn init(config: &TelemetryConfig) -> Result<Option<TracingGuard>, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let (otel_layer, guard) = match config.collector_url.as_deref() {
        Some(collector) => {
            let provider = init_tracer_provider(config, collector)?;
            let tracer = provider.tracer(config.service_name().to_string());
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(TracingGuard::new(provider)),
            )
        }
        None => (None, None),
    };

    let json_layer = config.json_logs.then(|| fmt::layer().json().with_target(true));
    let pretty_layer = (!config.json_logs).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    Ok(guard)
}
