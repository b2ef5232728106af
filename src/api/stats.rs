use axum::{extract::State, routing::get, Json, Router};

use super::ApiResponse;
use crate::types::EngineStats;
use crate::AppState;

/// Create the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<EngineStats>> {
    Json(ApiResponse::new(state.engine.stats()))
}
