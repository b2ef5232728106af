//! Trading signals service module.
//!
//! Provides technical indicator calculations, weighted scoring, risk levels,
//! cross-timeframe harmonization and historical accuracy tracking.

pub mod accuracy;
pub mod cache;
pub mod engine;
pub mod harmonizer;
pub mod indicators;
pub mod risk;
pub mod scoring;
pub mod structure;

pub use accuracy::AccuracyStore;
pub use cache::{CacheValue, IndicatorCache, IndicatorValue, SeriesId};
pub use engine::SignalEngine;
pub use harmonizer::{dominant_trend, Harmonizer};
pub use indicators::Indicator;
pub use risk::{risk_levels, RiskLevels};
pub use scoring::{ScoreCard, ScoringEngine};
pub use structure::StructureClassifier;
