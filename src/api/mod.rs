pub mod candles;
pub mod health;
pub mod signals;
pub mod stats;

use crate::error::AppError;
use crate::types::Timeframe;
use crate::AppState;
use axum::Router;
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Response time in unix milliseconds.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ApiMeta {
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        }
    }
}

/// Parse a timeframe path or query segment.
pub(crate) fn parse_timeframe(value: &str) -> Result<Timeframe, AppError> {
    Timeframe::from_str(value)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown timeframe: {}", value)))
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/candles", candles::router())
        .nest("/api/signals", signals::router())
        .nest("/api/stats", stats::router())
}
