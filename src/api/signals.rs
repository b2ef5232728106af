//! Signal API endpoints.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{parse_timeframe, ApiResponse};
use crate::error::{AppError, Result};
use crate::types::AccuracyRecord;
use crate::AppState;

/// Query parameters for the signals endpoint.
#[derive(Debug, Deserialize)]
pub struct SignalsQuery {
    /// Current price used as the entry price.
    pub price: Option<f64>,
    /// Single timeframe label; all timeframes are harmonized when absent.
    pub timeframe: Option<String>,
}

/// Outcome report for a previously issued signal.
#[derive(Debug, Deserialize)]
pub struct OutcomeRequest {
    pub correct: bool,
}

#[derive(Debug, Serialize)]
pub struct AccuracyResponse {
    pub symbol: String,
    pub records: Vec<AccuracyRecord>,
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_signals))
        .route("/:symbol/accuracy", get(get_symbol_accuracy))
        .route("/:symbol/:timeframe/outcome", post(post_outcome))
}

/// Get one timeframe's signal, or every timeframe harmonized.
async fn get_signals(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SignalsQuery>,
) -> Result<Response> {
    let price = query
        .price
        .ok_or_else(|| AppError::BadRequest("price query parameter is required".to_string()))?;

    match query.timeframe.as_deref() {
        Some(timeframe) => {
            let timeframe = parse_timeframe(timeframe)?;
            let signal = state.engine.compute(&symbol, timeframe, price).await?;
            Ok(Json(ApiResponse::new(signal)).into_response())
        }
        None => {
            let signals = state.engine.compute_all(&symbol, price).await?;
            Ok(Json(ApiResponse::new(signals)).into_response())
        }
    }
}

/// Get accuracy records for a symbol.
async fn get_symbol_accuracy(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<AccuracyResponse>>> {
    let records = state.engine.accuracy_records(&symbol);
    if records.is_empty() {
        return Err(AppError::NotFound(format!(
            "No outcomes recorded for {}",
            symbol.to_uppercase()
        )));
    }

    Ok(Json(ApiResponse::new(AccuracyResponse {
        symbol: symbol.to_uppercase(),
        records,
    })))
}

/// Record whether a signal was correct.
async fn post_outcome(
    State(state): State<AppState>,
    Path((symbol, timeframe)): Path<(String, String)>,
    Json(request): Json<OutcomeRequest>,
) -> Result<Json<ApiResponse<AccuracyRecord>>> {
    let timeframe = parse_timeframe(&timeframe)?;
    let record = state
        .engine
        .report_outcome(&symbol, timeframe, request.correct)?;
    Ok(Json(ApiResponse::new(record)))
}
