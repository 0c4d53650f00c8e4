//! Subscriber installation, OTLP exporter setup, and TracingGuard.

use anyhow::Result;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{OtlpProtocol, TracingConfig};

/// RAII guard that flushes and shuts down the tracer provider on drop.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// Whether spans are being exported over OTLP.
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(ref mut provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown tracer provider: {e}");
            }
        }
    }
}

/// Initialize the global subscriber.
///
/// Logs always go to stderr through the fmt layer. When `otlp_endpoint` is set,
/// spans are also exported; if the exporter cannot be built the relay still
/// starts with fmt-only logging and a warning.
///
/// Hold the returned [`TracingGuard`] for the lifetime of the process so
/// buffered spans are flushed on shutdown.
pub fn init_tracing(config: &TracingConfig) -> TracingGuard {
    let Some(endpoint) = config.otlp_endpoint.clone() else {
        init_fmt_only(config);
        return TracingGuard { provider: None };
    };

    match try_init_with_otlp(config, &endpoint) {
        Ok(guard) => guard,
        Err(e) => {
            init_fmt_only(config);
            tracing::warn!(
                error = %e,
                endpoint = %endpoint,
                "OTLP exporter failed to initialize, running with fmt-only tracing"
            );
            TracingGuard { provider: None }
        }
    }
}

fn env_filter(config: &TracingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_fmt_only(config: &TracingConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(config))
        .init();
}

/// Build the OTLP exporter and install a subscriber that exports spans and
/// logs to stderr.
fn try_init_with_otlp(config: &TracingConfig, endpoint: &str) -> Result<TracingGuard> {
    let exporter = match config.protocol {
        OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?,
        OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()?,
    };

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder_empty()
                .with_service_name(config.service_name.clone())
                .build(),
        )
        .build();

    let tracer = provider.tracer(config.service_name.clone());

    tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(config))
        .init();

    tracing::info!(
        endpoint = %endpoint,
        service = %config.service_name,
        protocol = ?config.protocol,
        "OpenTelemetry OTLP tracing initialized"
    );

    Ok(TracingGuard {
        provider: Some(provider),
    })
}
