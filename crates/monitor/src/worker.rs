use std::sync::Arc;

use metrics::counter;
use reqwest::Client;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use buy_alert_domain::{
    config::{ConfigError, MonitorConfig},
    model::TransactionEvent,
    services::{telemetry::TelemetryError, DestinationQueues, InMemorySignatureCache},
    storage::StorageError,
};
use buy_alert_storage::SeaOrmStorage;

use crate::{
    compose::NotificationComposer,
    enrich::MarketDataEnricher,
    market::{HttpPriceProvider, RpcAccountInfoProvider},
    pipeline::{process_event, EventOutcome, MalformedEvent, MonitorContext},
};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("malformed event: {0}")]
    Malformed(#[from] MalformedEvent),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl MonitorError {
    fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Storage(_) => "storage_error",
            Self::Timeout { .. } => "timeout",
            Self::Malformed(_) => "malformed",
            Self::Rpc(_) => "rpc_error",
            Self::Telemetry(_) => "telemetry_error",
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(value: reqwest::Error) -> Self {
        Self::Rpc(value.to_string())
    }
}

/// Runs every incoming event as its own unit of work against a shared context.
#[derive(Clone)]
pub struct EventProcessor {
    ctx: Arc<MonitorContext>,
}

impl EventProcessor {
    pub fn new(ctx: MonitorContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn queues(&self) -> &DestinationQueues {
        self.ctx.queues()
    }

    /// Processes one event and records its outcome. Errors end here: they are
    /// logged and counted, never propagated to other events.
    pub async fn handle(&self, event: TransactionEvent) -> Option<EventOutcome> {
        match process_event(&self.ctx, &event).await {
            Ok(outcome) => {
                counter!("monitor_events_total", "result" => <&'static str>::from(outcome))
                    .increment(1);
                match outcome {
                    EventOutcome::Processed { enqueued, dropped } => info!(
                        signature = %event.signature,
                        enqueued, dropped, "event processed"
                    ),
                    other => debug!(
                        signature = %event.signature,
                        outcome = other.as_ref(),
                        "event skipped"
                    ),
                }
                Some(outcome)
            }
            Err(err) => {
                counter!("monitor_events_total", "result" => err.label()).increment(1);
                match &err {
                    MonitorError::Malformed(_) => {
                        warn!(signature = %event.signature, error = %err, "rejected malformed event")
                    }
                    _ => error!(signature = %event.signature, error = %err, "event processing failed"),
                }
                None
            }
        }
    }

    /// Spawns the event's unit of work. The returned handle resolves once the
    /// work finished, including when it panicked.
    pub fn dispatch(&self, event: TransactionEvent) -> JoinHandle<()> {
        let processor = self.clone();
        let signature = event.signature.clone();
        let unit = tokio::spawn(async move {
            processor.handle(event).await;
        });

        tokio::spawn(async move {
            if let Err(err) = unit.await {
                counter!("monitor_events_total", "result" => "panicked").increment(1);
                error!(signature = %signature, error = %err, "event task aborted");
            }
        })
    }
}

/// Wires the store, the HTTP market data providers and the queues into a
/// processor backed by live services.
pub fn build_live_processor(
    config: &MonitorConfig,
    storage: SeaOrmStorage,
    queues: DestinationQueues,
) -> Result<EventProcessor, MonitorError> {
    let client = Client::builder().timeout(config.io_timeout()).build()?;
    let accounts = Arc::new(RpcAccountInfoProvider::new(
        client.clone(),
        config.solana_rpc_url(),
    ));
    let prices = Arc::new(HttpPriceProvider::new(client, config.price_api_url()));
    let enricher = MarketDataEnricher::new(
        accounts,
        prices,
        config.native_asset_id(),
        config.io_timeout(),
    );

    let storage = Arc::new(storage);
    let ctx = MonitorContext::new(
        storage.clone(),
        storage,
        enricher,
        NotificationComposer::new(config.links().clone()),
        queues,
        config.io_timeout(),
    )
    .with_signature_cache(Arc::new(InMemorySignatureCache::new(
        config.signature_cache_ttl(),
    )));

    Ok(EventProcessor::new(ctx))
}
