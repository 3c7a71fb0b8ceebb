use axum::Json;
use axum::extract::State;
use reclaim_gateway::MetricsSnapshot;

use super::AppState;
use super::schemas::HealthResponse;

/// `GET /api/health`
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// `GET /api/metrics` -- scan and remediation counters since startup.
#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "Health",
    summary = "Sweep metrics",
    responses(
        (status = 200, description = "Counter snapshot", body = MetricsSnapshot)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.sweeper.metrics().snapshot())
}
