use actix_web::{web, HttpResponse};

use crate::state::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// Prometheus scrape endpoint. Queue depth gauges are refreshed on every
/// enqueue and drain, so the rendered snapshot is current.
pub async fn metrics_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(PROMETHEUS_TEXT)
        .body(state.telemetry().render_metrics())
}
