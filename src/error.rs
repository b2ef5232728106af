use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Indicator calculation failures. Always recovered to a neutral default.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} candles, have {available}")]
    InsufficientData { required: usize, available: usize },
}

/// Errors surfaced at the engine boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation task failed: {0}")]
    Task(String),
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Engine(e @ EngineError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let err = AppError::from(EngineError::InvalidInput("empty symbol".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_task_failure_maps_to_internal() {
        let err = AppError::from(EngineError::Task("join error".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = IndicatorError::InsufficientData {
            required: 15,
            available: 3,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 15 candles, have 3");
    }
}
