//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OTLP span exporter and tracer provider
//! - Flush and shut the provider down at exit
//! - Create the span that wraps each upstream RPC call
//!
//! # Design Decisions
//! - Optional: export is off unless a collector address is configured
//! - Spans come from `tracing`; the OpenTelemetry layer only exports them

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{self, Sampler, TracerProvider},
    Resource,
};
use tracing::Span;

use crate::config::TelemetryConfig;
use crate::observability::TelemetryError;

/// Shuts the tracer provider down on drop, flushing pending spans.
pub struct TracingGuard {
    provider: TracerProvider,
}

impl TracingGuard {
    pub fn new(provider: TracerProvider) -> Self {
        Self { provider }
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {:?}", e);
        }
    }
}

/// Normalize a collector address into a gRPC endpoint URL.
///
/// Bare `host:port` gets `http://` in insecure mode and `https://` otherwise.
pub fn collector_endpoint(address: &str, insecure: bool) -> String {
    if address.contains("://") {
        return address.to_string();
    }
    let scheme = if insecure { "http" } else { "https" };
    format!("{}://{}", scheme, address)
}

/// Install a batching OTLP/gRPC tracer provider. Requires a Tokio runtime.
pub fn init_tracer_provider(
    config: &TelemetryConfig,
    collector: &str,
) -> Result<TracerProvider, TelemetryError> {
    let endpoint = collector_endpoint(collector, config.insecure);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint.clone());

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name().to_string()),
                    KeyValue::new("library.language", "rust"),
                ])),
        )
        .install_batch(runtime::Tokio)
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name(),
        endpoint = %endpoint,
        insecure = config.insecure,
        "OpenTelemetry span export enabled"
    );

    Ok(provider)
}

/// Span for one proxied RPC call, carrying the call's metadata.
pub fn rpc_span(method: &str, endpoint: &str, body: &[u8]) -> Span {
    tracing::info_span!(
        "rpc_request",
        method = %method,
        endpoint = %endpoint,
        body = %String::from_utf8_lossy(body),
        status = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_endpoint_scheme() {
        assert_eq!(collector_endpoint("otel:4317", true), "http://otel:4317");
        assert_eq!(collector_endpoint("otel:4317", false), "https://otel:4317");
        assert_eq!(collector_endpoint("http://otel:4317", false), "http://otel:4317");
    }
}
