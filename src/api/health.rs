use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Computations currently running on the blocking pool.
    in_flight: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        in_flight: state.engine.stats().in_flight,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
