use actix_web::{web, HttpResponse};
use buy_alert_domain::model::NotificationPayload;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainResponse {
    pub destination_id: String,
    pub notifications: Vec<NotificationPayload>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueDepth {
    pub destination_id: String,
    pub depth: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuesResponse {
    pub queues: Vec<QueueDepth>,
}

/// Hands every pending notification for a destination to the dispatcher.
pub async fn drain_queue_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let destination_id = path.into_inner();
    let notifications = state.queues().drain(&destination_id);
    info!(
        destination = %destination_id,
        drained = notifications.len(),
        "drained destination queue"
    );
    HttpResponse::Ok().json(DrainResponse {
        destination_id,
        notifications,
    })
}

pub async fn list_queues_handler(state: web::Data<AppState>) -> HttpResponse {
    let queues = state
        .queues()
        .depths()
        .into_iter()
        .map(|(destination_id, depth)| QueueDepth {
            destination_id,
            depth,
        })
        .collect();
    HttpResponse::Ok().json(QueuesResponse { queues })
}
