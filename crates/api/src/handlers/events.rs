use actix_web::{web, HttpResponse};
use buy_alert_domain::model::TransactionEvent;
use metrics::counter;
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use tracing::warn;

use crate::state::AppState;

use super::ApiError;

/// Webhook body: providers post either a single event or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventBatch {
    Many(Vec<TransactionEvent>),
    One(Box<TransactionEvent>),
}

impl EventBatch {
    pub fn into_events(self) -> Vec<TransactionEvent> {
        match self {
            EventBatch::Many(events) => events,
            EventBatch::One(event) => vec![*event],
        }
    }
}

#[derive(Debug, Clone, Copy, AsRefStr)]
#[strum(serialize_all = "snake_case")]
enum IngestStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptedResponse {
    pub accepted: usize,
}

/// Parses the body up front so malformed events never reach the pipeline,
/// then hands each event to its own task and answers without waiting.
pub async fn ingest_events_handler(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let batch: EventBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(err) => {
            counter!("api_events_received_total", "status" => IngestStatus::Rejected.as_ref())
                .increment(1);
            warn!(error = %err, "rejected malformed event payload");
            return Err(ApiError::InvalidPayload(err));
        }
    };

    let events = batch.into_events();
    let accepted = events.len();
    for event in events {
        // Detached: the processor supervises and logs the unit of work.
        drop(state.processor().dispatch(event));
    }
    counter!("api_events_received_total", "status" => IngestStatus::Accepted.as_ref())
        .increment(accepted as u64);

    Ok(HttpResponse::Accepted().json(AcceptedResponse { accepted }))
}
