use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use collabhub_core::health::HealthReport;

/// Probes every dependency. 503 when any probe fails.
async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health_service.run_checks().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Ready once the task worker is accepting work.
async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.task_queue.is_running() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
