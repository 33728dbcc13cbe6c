use std::{sync::Arc, time::Duration};

use buy_alert_domain::model::TransactionEvent;
use buy_alert_domain::services::{DestinationQueues, SignatureCache};
use buy_alert_domain::storage::{SignatureStore, TokenRegistry};
use metrics::counter;
use strum_macros::{AsRefStr, IntoStaticStr};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::compose::NotificationComposer;
use crate::diff::compute_token_changes;
use crate::enrich::MarketDataEnricher;
use crate::matcher::find_candidates;
use crate::worker::MonitorError;

/// How one event left the pipeline when nothing unexpected happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventOutcome {
    /// The transaction failed on chain.
    ExecutionFailed,
    /// The signature was admitted before.
    Duplicate,
    /// The signer's holdings did not move.
    NoChanges,
    Processed { enqueued: usize, dropped: usize },
}

/// Events that cannot be processed at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedEvent {
    #[error("no signer in account keys of `{signature}`")]
    MissingSigner { signature: String },
}

/// Everything a unit of work needs: the store seams, the market data
/// enricher, the composer and the destination queues.
#[derive(Clone)]
pub struct MonitorContext {
    signatures: Arc<dyn SignatureStore>,
    registry: Arc<dyn TokenRegistry>,
    cache: Option<Arc<dyn SignatureCache>>,
    enricher: MarketDataEnricher,
    composer: NotificationComposer,
    queues: DestinationQueues,
    io_timeout: Duration,
}

impl MonitorContext {
    pub fn new(
        signatures: Arc<dyn SignatureStore>,
        registry: Arc<dyn TokenRegistry>,
        enricher: MarketDataEnricher,
        composer: NotificationComposer,
        queues: DestinationQueues,
        io_timeout: Duration,
    ) -> Self {
        Self {
            signatures,
            registry,
            cache: None,
            enricher,
            composer,
            queues,
            io_timeout,
        }
    }

    pub fn with_signature_cache(mut self, cache: Arc<dyn SignatureCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn queues(&self) -> &DestinationQueues {
        &self.queues
    }
}

/// Runs one event through guard, diff, matcher, enricher and composer.
///
/// Enrichment failures drop only the affected candidate; every other error
/// ends processing of this event and is returned to the caller.
pub async fn process_event(
    ctx: &MonitorContext,
    event: &TransactionEvent,
) -> Result<EventOutcome, MonitorError> {
    let signature = event.signature.as_str();

    if event.execution_failed() {
        debug!(signature, "discarding failed transaction");
        return Ok(EventOutcome::ExecutionFailed);
    }

    if !admit(ctx, signature).await? {
        return Ok(EventOutcome::Duplicate);
    }

    let signer = event
        .signer()
        .ok_or_else(|| MalformedEvent::MissingSigner {
            signature: signature.to_owned(),
        })?;

    let changes = compute_token_changes(event, signer);
    if changes.is_empty() {
        return Ok(EventOutcome::NoChanges);
    }

    let candidates = find_candidates(ctx.registry.as_ref(), &changes, ctx.io_timeout).await?;

    let mut enqueued = 0;
    let mut dropped = 0;
    for candidate in candidates {
        let token = &candidate.token;
        let snapshot = match ctx.enricher.snapshot(&token.mint).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    signature,
                    mint = %token.mint,
                    destination = %token.destination_id,
                    error = %err,
                    "dropping candidate after enrichment failure"
                );
                counter!("monitor_enrichment_failures_total", "reason" => err.reason())
                    .increment(1);
                counter!("monitor_candidates_total", "result" => "dropped").increment(1);
                dropped += 1;
                continue;
            }
        };

        let payload = ctx
            .composer
            .compose(token, &candidate.change, &snapshot, signer, signature);
        ctx.queues.enqueue(&token.destination_id, payload);
        counter!("monitor_candidates_total", "result" => "enqueued").increment(1);
        counter!("notifications_enqueued_total").increment(1);
        enqueued += 1;
    }

    Ok(EventOutcome::Processed { enqueued, dropped })
}

async fn admit(ctx: &MonitorContext, signature: &str) -> Result<bool, MonitorError> {
    if let Some(cache) = &ctx.cache {
        if cache.seen(signature) {
            return Ok(false);
        }
    }

    let admitted = timeout(ctx.io_timeout, ctx.signatures.insert_if_absent(signature))
        .await
        .map_err(|_| MonitorError::Timeout {
            operation: "signature_guard",
        })??;

    if admitted {
        if let Some(cache) = &ctx.cache {
            cache.mark_seen(signature);
        }
    }
    Ok(admitted)
}
