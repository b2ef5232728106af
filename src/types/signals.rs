use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AdxValue, BollingerValue, MacdValue, PriceLevel, StochasticValue, Timeframe};

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    /// Direction from the bullish-minus-bearish score difference.
    pub fn from_score_diff(diff: f64, threshold: f64) -> Self {
        if diff >= threshold {
            Direction::Long
        } else if diff <= -threshold {
            Direction::Short
        } else {
            Direction::Neutral
        }
    }

    /// +1 for long, -1 for short, 0 otherwise.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Neutral => 0.0,
        }
    }

    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
        }
    }
}

/// Lifecycle of a signal.
///
/// `NoSignal` marks the insufficient-data fallback and never advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStage {
    NoSignal,
    Scored,
    Harmonized,
    Final,
}

/// Latest value of every indicator that fed a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: MacdValue,
    pub ema_short: f64,
    pub ema_medium: f64,
    pub ema_long: f64,
    pub stochastic: StochasticValue,
    pub bollinger: BollingerValue,
    pub adx: AdxValue,
    pub atr: f64,
    /// At most three, nearest first.
    pub supports: Vec<PriceLevel>,
    /// At most three, nearest first.
    pub resistances: Vec<PriceLevel>,
}

impl IndicatorSnapshot {
    /// Snapshot carrying every indicator's neutral default.
    pub fn neutral(price: f64) -> Self {
        Self {
            rsi: 50.0,
            macd: MacdValue::default(),
            ema_short: price,
            ema_medium: price,
            ema_long: price,
            stochastic: StochasticValue { k: 50.0, d: 50.0 },
            bollinger: BollingerValue {
                upper: price * 1.02,
                middle: price,
                lower: price * 0.98,
                percent_b: 50.0,
                width: 4.0,
            },
            adx: AdxValue {
                adx: 25.0,
                plus_di: 25.0,
                minus_di: 25.0,
            },
            atr: 0.0,
            supports: Vec::new(),
            resistances: Vec::new(),
        }
    }
}

/// Directional trading signal for one symbol and timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    /// 0-100.
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 0-100.
    pub success_probability: f64,
    pub timeframe: Timeframe,
    /// Time of the last candle the signal was computed from (unix seconds).
    pub timestamp: i64,
    pub stage: SignalStage,
    pub indicators: IndicatorSnapshot,
}

impl Signal {
    /// Whether this is the insufficient-data fallback.
    pub fn is_fallback(&self) -> bool {
        self.stage == SignalStage::NoSignal
    }

    /// Mark a scored or harmonized signal as final.
    pub fn freeze(mut self) -> Self {
        if self.stage != SignalStage::NoSignal {
            self.stage = SignalStage::Final;
        }
        self
    }
}

/// Volatility/trend regime of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
}

/// Directional bias derived from market structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

/// Recent volume relative to its trailing average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolumeProfile {
    Strong,
    Weak,
    Neutral,
}

/// Market-structure classification for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStructure {
    pub regime: Regime,
    pub bias: Bias,
    /// 0-100.
    pub strength: f64,
    pub volume_profile: VolumeProfile,
}

/// Tracked outcomes for a symbol and timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyRecord {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub correct_count: u32,
    pub total_count: u32,
    /// correct / total * 100.
    pub win_rate: f64,
    /// Confidence multiplier, 1.0 at the target win rate.
    pub adaptive_weight: f64,
}

/// Win rate at which the adaptive weight is exactly 1.0.
pub const TARGET_WIN_RATE: f64 = 70.0;

impl AccuracyRecord {
    /// Create an empty record.
    pub fn new(symbol: String, timeframe: Timeframe) -> Self {
        Self {
            symbol,
            timeframe,
            correct_count: 0,
            total_count: 0,
            win_rate: 0.0,
            adaptive_weight: 1.0,
        }
    }

    /// Record an outcome and recompute the derived fields.
    pub fn record_outcome(&mut self, was_correct: bool) {
        self.total_count += 1;
        if was_correct {
            self.correct_count += 1;
        }
        self.win_rate = self.correct_count as f64 / self.total_count as f64 * 100.0;
        self.adaptive_weight = (self.win_rate / TARGET_WIN_RATE).clamp(0.5, 1.5);
    }
}

/// Cross-timeframe trend identified by the harmonizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantTrend {
    pub direction: Direction,
    /// |net vote| / total vote weight, 0-1.
    pub dominance: f64,
}

impl DominantTrend {
    /// No participating timeframes.
    pub fn none() -> Self {
        Self {
            direction: Direction::Neutral,
            dominance: 0.0,
        }
    }
}

/// Harmonized signals for every timeframe of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSignals {
    pub symbol: String,
    pub dominant: DominantTrend,
    pub signals: BTreeMap<Timeframe, Signal>,
}

/// Engine introspection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub cache_size: usize,
    pub tracked_symbols: usize,
    pub accuracy_records: usize,
    pub in_flight: usize,
}
