use axum::Json;
use axum::extract::State;
use reclaim_core::TechniqueInfo;

use super::AppState;

/// `GET /api/techniques` -- the technique catalog, in display order.
#[utoipa::path(
    get,
    path = "/api/techniques",
    tag = "Techniques",
    summary = "List techniques",
    description = "Returns every technique that can be scanned, with display metadata.",
    responses(
        (status = 200, description = "Technique catalog", body = Vec<TechniqueInfo>)
    )
)]
pub async fn list_techniques(State(state): State<AppState>) -> Json<Vec<TechniqueInfo>> {
    Json(state.sweeper.techniques())
}
