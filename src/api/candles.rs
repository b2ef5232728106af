//! Candle ingestion endpoint.

use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Serialize;

use super::{parse_timeframe, ApiResponse};
use crate::error::Result;
use crate::types::{Candle, Timeframe};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleUpdateResponse {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub count: usize,
    pub version: u64,
}

/// Create the candles router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol/:timeframe", put(put_candles))
}

/// Replace the stored series for a symbol and timeframe.
async fn put_candles(
    State(state): State<AppState>,
    Path((symbol, timeframe)): Path<(String, String)>,
    Json(candles): Json<Vec<Candle>>,
) -> Result<Json<ApiResponse<CandleUpdateResponse>>> {
    let timeframe = parse_timeframe(&timeframe)?;
    let count = candles.len();
    let version = state.engine.update(&symbol, timeframe, candles)?;

    Ok(Json(ApiResponse::new(CandleUpdateResponse {
        symbol: symbol.to_uppercase(),
        timeframe,
        count,
        version,
    })))
}
