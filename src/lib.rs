//! Confluence - multi-timeframe technical signal synthesis engine

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use config::Config;
use services::SignalEngine;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<SignalEngine>,
}

impl AppState {
    /// Build state with a fresh engine from the configuration.
    pub fn new(config: Config) -> Self {
        let engine = SignalEngine::new(config.engine.clone());
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}

// Re-export commonly used types
pub use error::{AppError, EngineError, IndicatorError};
pub use services::signals::{Harmonizer, ScoringEngine};
pub use types::*;
