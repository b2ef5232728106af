use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

/// Point awards used by the scoring engine.
///
/// The defaults are empirically chosen and meant to be tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    // RSI
    pub rsi_extreme_oversold: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_extreme_overbought: f64,
    pub rsi_extreme_points: f64,
    pub rsi_extreme_confidence: f64,
    pub rsi_points: f64,
    pub rsi_confidence: f64,

    // MACD
    /// Histogram magnitude (percent of price) above which the strong award applies.
    pub macd_strong_pct: f64,
    pub macd_strong_points: f64,
    pub macd_strong_confidence: f64,
    pub macd_points: f64,
    pub macd_confidence: f64,

    // EMA ordering
    pub ema_short_period: usize,
    pub ema_medium_period: usize,
    pub ema_long_period: usize,
    pub ema_max_points: f64,
    pub ema_max_confidence: f64,
    /// Distance from the short EMA (percent) at which the award reaches zero.
    pub ema_proximity_pct: f64,

    // ADX
    pub adx_strong: f64,
    pub adx_strong_points: f64,
    pub adx_strong_confidence: f64,
    pub adx_moderate: f64,
    pub adx_moderate_points: f64,
    pub adx_moderate_confidence: f64,

    // Bollinger %B
    pub bollinger_extreme_low: f64,
    pub bollinger_extreme_high: f64,
    pub bollinger_extreme_points: f64,
    pub bollinger_extreme_confidence: f64,
    pub bollinger_low: f64,
    pub bollinger_high: f64,
    pub bollinger_points: f64,

    // Stochastic
    pub stochastic_oversold: f64,
    pub stochastic_overbought: f64,
    pub stochastic_double_points: f64,
    pub stochastic_double_confidence: f64,
    pub stochastic_single_points: f64,

    // Market structure
    pub structure_score_factor: f64,
    pub structure_confidence_factor: f64,
    pub volume_strong_confidence: f64,
    pub volume_weak_confidence: f64,

    // Volatility (ATR as percent of price)
    pub volatility_high_pct: f64,
    pub volatility_high_confidence: f64,
    pub volatility_low_pct: f64,
    pub volatility_low_confidence: f64,

    /// Multiplier for oscillator awards that fight a trending structure bias.
    /// 1.0 leaves the award table unchanged.
    pub trend_oscillator_discount: f64,

    /// Minimum bullish-minus-bearish difference for a directional call.
    pub direction_threshold: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub success_factor: f64,
    pub long_horizon_bonus: f64,
    pub success_min: f64,
    pub success_max: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rsi_extreme_oversold: 20.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_extreme_overbought: 80.0,
            rsi_extreme_points: 35.0,
            rsi_extreme_confidence: 25.0,
            rsi_points: 25.0,
            rsi_confidence: 18.0,

            macd_strong_pct: 0.5,
            macd_strong_points: 35.0,
            macd_strong_confidence: 20.0,
            macd_points: 20.0,
            macd_confidence: 12.0,

            ema_short_period: 9,
            ema_medium_period: 21,
            ema_long_period: 50,
            ema_max_points: 30.0,
            ema_max_confidence: 18.0,
            ema_proximity_pct: 3.0,

            adx_strong: 30.0,
            adx_strong_points: 25.0,
            adx_strong_confidence: 18.0,
            adx_moderate: 20.0,
            adx_moderate_points: 12.0,
            adx_moderate_confidence: 10.0,

            bollinger_extreme_low: 5.0,
            bollinger_extreme_high: 95.0,
            bollinger_extreme_points: 20.0,
            bollinger_extreme_confidence: 15.0,
            bollinger_low: 20.0,
            bollinger_high: 80.0,
            bollinger_points: 10.0,

            stochastic_oversold: 20.0,
            stochastic_overbought: 80.0,
            stochastic_double_points: 15.0,
            stochastic_double_confidence: 10.0,
            stochastic_single_points: 8.0,

            structure_score_factor: 0.3,
            structure_confidence_factor: 0.15,
            volume_strong_confidence: 12.0,
            volume_weak_confidence: -8.0,

            volatility_high_pct: 3.0,
            volatility_high_confidence: -10.0,
            volatility_low_pct: 1.0,
            volatility_low_confidence: 8.0,

            trend_oscillator_discount: 1.0,

            direction_threshold: 20.0,
            confidence_min: 30.0,
            confidence_max: 95.0,
            success_factor: 0.85,
            long_horizon_bonus: 5.0,
            success_min: 25.0,
            success_max: 95.0,
        }
    }
}

/// Cross-timeframe harmonization tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizerSettings {
    /// Higher-timeframe confidence needed before it can realign a lower one.
    pub realign_confidence: f64,
    /// Scales the realignment threshold per point of confidence above `realign_confidence`.
    pub realign_scale: f64,
    /// How many positions below a timeframe its influence reaches.
    pub max_distance: usize,
    pub blend_base: f64,
    pub blend_floor: f64,
    /// Dominance ratio needed for the final nudge pass.
    pub dominance_threshold: f64,
    /// Realignment threshold per unit of dominance in the final pass.
    pub nudge_scale: f64,
}

impl Default for HarmonizerSettings {
    fn default() -> Self {
        Self {
            realign_confidence: 70.0,
            realign_scale: 4.0,
            max_distance: 3,
            blend_base: 0.25,
            blend_floor: 0.05,
            dominance_threshold: 0.5,
            nudge_scale: 40.0,
        }
    }
}

/// Engine settings that do not depend on the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub harmonizer: HarmonizerSettings,
    /// Maximum number of memoized indicator values.
    pub cache_capacity: usize,
    /// Buffered harmonized results per subscriber.
    pub broadcast_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            harmonizer: HarmonizerSettings::default(),
            cache_capacity: 10_000,
            broadcast_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load tunables from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Signal engine settings.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut engine = match env::var("SCORING_CONFIG_PATH") {
            Ok(path) => match EngineConfig::from_file(Path::new(&path)) {
                Ok(engine) => {
                    info!("Loaded scoring configuration from {}", path);
                    engine
                }
                Err(e) => {
                    warn!("Failed to load scoring config {}: {} - using defaults", path, e);
                    EngineConfig::default()
                }
            },
            Err(_) => EngineConfig::default(),
        };

        if let Some(capacity) = env::var("INDICATOR_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            engine.cache_capacity = capacity;
        }

        if let Some(capacity) = env::var("SIGNAL_BROADCAST_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            engine.broadcast_capacity = capacity;
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            engine,
        }
    }
}
