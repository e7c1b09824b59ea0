//! Tracing and metrics initialization.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, ServerConfig};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if let Err(err) = result {
        tracing::warn!(error = %err, "tracing subscriber already installed");
    }
}

/// Returns the process-wide Prometheus handle, installing the recorder on
/// first use.
///
/// Safe to call repeatedly (tests build many routers in one process).
pub fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if let Err(err) = metrics::set_global_recorder(recorder) {
                tracing::warn!(error = %err, "metrics recorder already installed");
            }
            handle
        })
        .clone()
}
