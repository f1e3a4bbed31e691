//! Logging and OpenTelemetry initialization for the catalog server
//!
//! Console output in JSON or human-readable form, optional rolling file output, `RUST_LOG`
//! overrides, and optional OTLP trace export.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{Sampler, TracerProvider},
    Resource,
};
use std::fs;
use std::time::Duration;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Keeps the file writer alive and shuts the tracer provider down on drop.
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging with full configuration support including OpenTelemetry
///
/// Returns a `TelemetryGuard` that must be kept alive for the program duration.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<TelemetryGuard> {
    let (tracer_provider, otel_init_error) = if config.opentelemetry_enabled {
        match init_tracer_provider(config) {
            Ok(provider) => (Some(provider), None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, None)
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer("catalog-server"))
            .with_tracked_inactivity(true)
    });

    let (file_writer, file_guard) = if config.file_enabled {
        let (writer, guard) = create_file_appender(config)?;
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let (console_layer, file_layer) = if config.json {
        (
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stdout)
                .boxed(),
            file_writer.map(|w| {
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(w)
                    .boxed()
            }),
        )
    } else {
        (
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stdout)
                .boxed(),
            file_writer.map(|w| {
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(w)
                    .boxed()
            }),
        )
    };

    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(otel_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    if let Some(provider) = tracer_provider {
        global::set_tracer_provider(provider);
    }

    if let Some(err) = otel_init_error {
        tracing::warn!(
            error = %err,
            "Failed to initialize OpenTelemetry tracer provider, continuing without OpenTelemetry"
        );
    }

    tracing::info!(
        otel_enabled = config.opentelemetry_enabled,
        service_name = %config.service_name,
        environment = %config.deployment_environment,
        "Logging initialized"
    );

    Ok(TelemetryGuard {
        _file_guard: file_guard,
    })
}

fn build_resource_attributes(config: &LoggingConfig) -> Resource {
    let service_version = config
        .service_version
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", service_version),
        KeyValue::new(
            "deployment.environment",
            config.deployment_environment.clone(),
        ),
    ])
}

/// OTLP exporter over gRPC with a batch span processor
fn init_tracer_provider(config: &LoggingConfig) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint)
        .with_timeout(Duration::from_secs(config.otlp_timeout_seconds))
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to create OTLP exporter: {}", e))?;

    let trace_config = opentelemetry_sdk::trace::Config::default()
        .with_sampler(sampler_for(config.trace_sample_ratio))
        .with_resource(build_resource_attributes(config));

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_config(trace_config)
        .build())
}

fn sampler_for(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        // respect the parent's decision, otherwise sample by trace id
        Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio)))
    }
}

fn default_filter(level: &str) -> String {
    format!("catalog_server={level},catalog_geo={level},tower_http=info,sqlx=warn")
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)))
}

fn create_file_appender(config: &LoggingConfig) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&config.file_directory)?;

    let dir = &config.file_directory;
    let prefix = &config.file_prefix;
    let file_appender = match config.file_rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(dir, prefix),
        "minutely" => tracing_appender::rolling::minutely(dir, prefix),
        "never" => tracing_appender::rolling::never(dir, format!("{}.log", prefix)),
        _ => tracing_appender::rolling::daily(dir, prefix),
    };

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Shutdown OpenTelemetry gracefully, flushing pending spans
pub fn shutdown_telemetry() {
    tracing::info!("Shutting down OpenTelemetry...");
    global::shutdown_tracer_provider();
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        shutdown_telemetry();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_both_crates() {
        let filter = default_filter("debug");
        assert!(filter.contains("catalog_server=debug"));
        assert!(filter.contains("catalog_geo=debug"));
        assert!(filter.contains("sqlx=warn"));
    }

    #[test]
    fn sampler_edges() {
        assert!(matches!(sampler_for(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(0.5), Sampler::ParentBased(_)));
    }
}
