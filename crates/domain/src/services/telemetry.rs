use std::{env, net::SocketAddr, sync::Arc, thread};

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::runtime::{self, Handle};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::hydrate_env_file;

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();
static METRICS_HANDLE: OnceCell<Arc<PrometheusHandle>> = OnceCell::new();

/// Shared observability options for binaries.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    log_filter: String,
    metrics_address: Option<String>,
}

impl TelemetryConfig {
    /// Loads telemetry knobs from optional environment variables prefixed with
    /// `<PREFIX>_`, e.g. `API_LOG_FILTER`. Missing entries fall back to
    /// defaults so binaries boot without extra configuration.
    pub fn from_env(prefix: &str) -> Self {
        let _ = hydrate_env_file();
        let upper = prefix.trim().to_ascii_uppercase();
        let log_key = format!("{}_LOG_FILTER", upper);
        let metrics_key = format!("{}_METRICS_ADDRESS", upper);

        let log_filter = env::var(log_key)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let metrics_address = env::var(metrics_key).ok().and_then(|value| {
            if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        });

        Self {
            log_filter,
            metrics_address,
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn metrics_address(&self) -> Option<&str> {
        self.metrics_address.as_deref()
    }
}

/// Guard returned after telemetry initialization.
#[derive(Clone)]
pub struct TelemetryGuard {
    metrics: Arc<PrometheusHandle>,
}

impl TelemetryGuard {
    pub fn render_metrics(&self) -> String {
        self.metrics.render()
    }
}

/// Wires up tracing + the Prometheus recorder once per process. Later calls
/// reuse the installed recorder.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    install_tracing(config)?;
    let metrics = install_metrics(config)?;

    Ok(TelemetryGuard { metrics })
}

fn install_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if SUBSCRIBER_INSTALLED.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(config.log_filter())
        .map_err(|err| TelemetryError::InvalidLogFilter(err.to_string()))?;

    if SUBSCRIBER_INSTALLED.set(()).is_ok() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .map_err(|err| TelemetryError::Tracing(err.to_string()))?;
    }

    Ok(())
}

fn install_metrics(config: &TelemetryConfig) -> Result<Arc<PrometheusHandle>, TelemetryError> {
    METRICS_HANDLE
        .get_or_try_init(|| {
            let recorder = match config.metrics_address() {
                Some(addr) => {
                    let socket: SocketAddr =
                        addr.parse().map_err(|err: std::net::AddrParseError| {
                            TelemetryError::InvalidMetricsAddress(addr.to_string(), err.to_string())
                        })?;
                    start_exporter(PrometheusBuilder::new().with_http_listener(socket))?
                }
                None => PrometheusBuilder::new().build_recorder(),
            };

            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
            describe_pipeline_metrics();
            Ok(Arc::new(handle))
        })
        .cloned()
}

/// Builds the recorder and starts its HTTP listener, on the current tokio
/// runtime when there is one and on a dedicated thread otherwise.
fn start_exporter(builder: PrometheusBuilder) -> Result<PrometheusRecorder, TelemetryError> {
    if let Ok(runtime) = Handle::try_current() {
        let (recorder, exporter) = {
            let _entered = runtime.enter();
            builder
                .build()
                .map_err(|err| TelemetryError::Metrics(err.to_string()))?
        };
        runtime.spawn(async move {
            if let Err(err) = exporter.await {
                error!(error = ?err, "metrics listener stopped");
            }
        });
        return Ok(recorder);
    }

    let runtime = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
    let (recorder, exporter) = {
        let _entered = runtime.enter();
        builder
            .build()
            .map_err(|err| TelemetryError::Metrics(err.to_string()))?
    };
    thread::Builder::new()
        .name("metrics-listener".into())
        .spawn(move || {
            if let Err(err) = runtime.block_on(exporter) {
                error!(error = ?err, "metrics listener stopped");
            }
        })
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
    Ok(recorder)
}

fn describe_pipeline_metrics() {
    describe_counter!(
        "monitor_events_total",
        "Transaction events by pipeline outcome or failure kind."
    );
    describe_counter!(
        "monitor_candidates_total",
        "Matched (mint, destination) candidates, enqueued or dropped."
    );
    describe_counter!(
        "monitor_enrichment_failures_total",
        "Candidates dropped because market data could not be assembled."
    );
    describe_counter!(
        "notifications_enqueued_total",
        "Notification payloads appended to destination queues."
    );
    describe_counter!(
        "api_events_received_total",
        "Events received on the ingestion endpoint."
    );
    describe_gauge!(
        "destination_queue_depth",
        "Pending notifications per destination."
    );
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
    #[error("invalid metrics address `{0}`: {1}")]
    InvalidMetricsAddress(String, String),
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}
