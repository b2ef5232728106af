//! Weighted scoring of indicator readings into a directional signal.

use crate::config::ScoringWeights;
use crate::services::signals::cache::{IndicatorCache, SeriesId};
use crate::services::signals::indicators::{
    Adx, Atr, BollingerBands, Ema, Macd, Rsi, Stochastic, SupportResistance,
};
use crate::services::signals::risk::{risk_levels, RiskLevels};
use crate::services::signals::structure::StructureClassifier;
use crate::types::{
    Bias, Candle, Direction, IndicatorSnapshot, MarketStructure, Regime, Signal, SignalStage,
    Timeframe, VolumeProfile,
};

/// Supports and resistances kept on a snapshot.
pub const MAX_LEVELS: usize = 3;

/// Confidence before any award is applied.
const BASE_CONFIDENCE: f64 = 50.0;

/// Raw bullish/bearish points and confidence before timeframe weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCard {
    pub bullish: f64,
    pub bearish: f64,
    pub confidence: f64,
}

impl ScoreCard {
    fn new() -> Self {
        Self {
            bullish: 0.0,
            bearish: 0.0,
            confidence: BASE_CONFIDENCE,
        }
    }

    fn bull(&mut self, points: f64, confidence: f64) {
        self.bullish += points;
        self.confidence += confidence;
    }

    fn bear(&mut self, points: f64, confidence: f64) {
        self.bearish += points;
        self.confidence += confidence;
    }

    /// Bullish minus bearish points.
    pub fn net(&self) -> f64 {
        self.bullish - self.bearish
    }
}

/// Converts a candle series into a scored [`Signal`].
pub struct ScoringEngine {
    weights: ScoringWeights,
    rsi: Rsi,
    macd: Macd,
    ema_short: Ema,
    ema_medium: Ema,
    ema_long: Ema,
    stochastic: Stochastic,
    bollinger: BollingerBands,
    adx: Adx,
    atr: Atr,
    levels: SupportResistance,
    structure: StructureClassifier,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            ema_short: Ema::new(weights.ema_short_period),
            ema_medium: Ema::new(weights.ema_medium_period),
            ema_long: Ema::new(weights.ema_long_period),
            weights,
            rsi: Rsi::default(),
            macd: Macd::default(),
            stochastic: Stochastic::default(),
            bollinger: BollingerBands::default(),
            adx: Adx::default(),
            atr: Atr::default(),
            levels: SupportResistance::default(),
            structure: StructureClassifier::default(),
        }
    }

    /// Latest indicator readings, served from the cache where possible.
    pub fn snapshot(
        &self,
        cache: &IndicatorCache,
        series: &SeriesId,
        candles: &[Candle],
        price: f64,
    ) -> IndicatorSnapshot {
        let levels = cache.get_or_compute(series, &self.levels, candles);
        let (supports, resistances) = levels.nearest(price, MAX_LEVELS);

        IndicatorSnapshot {
            rsi: cache.get_or_compute(series, &self.rsi, candles),
            macd: cache.get_or_compute(series, &self.macd, candles),
            ema_short: cache.get_or_compute(series, &self.ema_short, candles),
            ema_medium: cache.get_or_compute(series, &self.ema_medium, candles),
            ema_long: cache.get_or_compute(series, &self.ema_long, candles),
            stochastic: cache.get_or_compute(series, &self.stochastic, candles),
            bollinger: cache.get_or_compute(series, &self.bollinger, candles),
            adx: cache.get_or_compute(series, &self.adx, candles),
            atr: cache.get_or_compute(series, &self.atr, candles),
            supports,
            resistances,
        }
    }

    /// Classify market structure from a snapshot's ADX and ATR.
    pub fn structure(&self, candles: &[Candle], snapshot: &IndicatorSnapshot) -> MarketStructure {
        self.structure.classify(candles, &snapshot.adx, snapshot.atr)
    }

    /// Score one timeframe.
    ///
    /// Series shorter than the timeframe minimum produce the neutral fallback
    /// signal rather than an error.
    pub fn score(
        &self,
        cache: &IndicatorCache,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
        price: f64,
        adaptive_weight: f64,
    ) -> Signal {
        let timestamp = candles.last().map(|c| c.time).unwrap_or(0);
        if candles.len() < timeframe.min_candles() {
            return self.fallback(symbol, timeframe, price, timestamp);
        }

        let series = SeriesId::new(symbol, timeframe, candles);
        let snapshot = self.snapshot(cache, &series, candles, price);
        let structure = self.structure(candles, &snapshot);
        let card = self.evaluate(&snapshot, &structure, price);

        let direction = Direction::from_score_diff(card.net(), self.weights.direction_threshold);
        let confidence = (card.confidence * timeframe.reliability_weight() * adaptive_weight)
            .clamp(self.weights.confidence_min, self.weights.confidence_max);

        let RiskLevels {
            stop_loss,
            take_profit,
        } = risk_levels(
            direction,
            price,
            snapshot.atr,
            timeframe,
            &snapshot.supports,
            &snapshot.resistances,
        );

        Signal {
            symbol: symbol.to_uppercase(),
            direction,
            confidence,
            entry_price: price,
            stop_loss,
            take_profit,
            success_probability: self.success_probability(confidence, timeframe, direction),
            timeframe,
            timestamp,
            stage: SignalStage::Scored,
            indicators: snapshot,
        }
    }

    /// Neutral signal for a series too short to score.
    pub fn fallback(&self, symbol: &str, timeframe: Timeframe, price: f64, timestamp: i64) -> Signal {
        let confidence = BASE_CONFIDENCE;
        let levels = RiskLevels::neutral(price);

        Signal {
            symbol: symbol.to_uppercase(),
            direction: Direction::Neutral,
            confidence,
            entry_price: price,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            success_probability: self.success_probability(confidence, timeframe, Direction::Neutral),
            timeframe,
            timestamp,
            stage: SignalStage::NoSignal,
            indicators: IndicatorSnapshot::neutral(price),
        }
    }

    /// Estimated chance the signal reaches its target, 0-100.
    pub fn success_probability(&self, confidence: f64, timeframe: Timeframe, direction: Direction) -> f64 {
        let w = &self.weights;
        let bonus = if timeframe.is_long_horizon() && direction == Direction::Long {
            w.long_horizon_bonus
        } else {
            0.0
        };
        (confidence * w.success_factor + bonus).clamp(w.success_min, w.success_max)
    }

    /// Apply the award table to a snapshot.
    pub fn evaluate(
        &self,
        snapshot: &IndicatorSnapshot,
        structure: &MarketStructure,
        price: f64,
    ) -> ScoreCard {
        let w = &self.weights;
        let mut card = ScoreCard::new();

        // Oscillator extremes that fight an established trend count for less.
        let trending = structure.regime == Regime::Trending;
        let bull_osc = if trending && structure.bias == Bias::Bearish {
            w.trend_oscillator_discount
        } else {
            1.0
        };
        let bear_osc = if trending && structure.bias == Bias::Bullish {
            w.trend_oscillator_discount
        } else {
            1.0
        };

        // RSI
        let rsi = snapshot.rsi;
        if rsi < w.rsi_extreme_oversold {
            card.bull(w.rsi_extreme_points * bull_osc, w.rsi_extreme_confidence * bull_osc);
        } else if rsi < w.rsi_oversold {
            card.bull(w.rsi_points * bull_osc, w.rsi_confidence * bull_osc);
        } else if rsi > w.rsi_extreme_overbought {
            card.bear(w.rsi_extreme_points * bear_osc, w.rsi_extreme_confidence * bear_osc);
        } else if rsi > w.rsi_overbought {
            card.bear(w.rsi_points * bear_osc, w.rsi_confidence * bear_osc);
        }

        // MACD histogram
        let histogram = snapshot.macd.histogram;
        if histogram != 0.0 {
            let strong = price > 0.0 && histogram.abs() / price * 100.0 >= w.macd_strong_pct;
            let (points, confidence) = if strong {
                (w.macd_strong_points, w.macd_strong_confidence)
            } else {
                (w.macd_points, w.macd_confidence)
            };
            if histogram > 0.0 {
                card.bull(points, confidence);
            } else {
                card.bear(points, confidence);
            }
        }

        // EMA ordering, scaled by how close price sits to the short EMA
        let (short, medium, long) = (snapshot.ema_short, snapshot.ema_medium, snapshot.ema_long);
        let proximity = if short > 0.0 && w.ema_proximity_pct > 0.0 {
            let distance_pct = (price - short).abs() / short * 100.0;
            (1.0 - distance_pct / w.ema_proximity_pct).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if short > medium && medium > long {
            card.bull(w.ema_max_points * proximity, w.ema_max_confidence * proximity);
        } else if short < medium && medium < long {
            card.bear(w.ema_max_points * proximity, w.ema_max_confidence * proximity);
        }

        // ADX awards go to the dominant directional indicator
        let adx = &snapshot.adx;
        let adx_award = if adx.adx > w.adx_strong {
            Some((w.adx_strong_points, w.adx_strong_confidence))
        } else if adx.adx > w.adx_moderate {
            Some((w.adx_moderate_points, w.adx_moderate_confidence))
        } else {
            None
        };
        if let Some((points, confidence)) = adx_award {
            if adx.plus_di > adx.minus_di {
                card.bull(points, confidence);
            } else if adx.minus_di > adx.plus_di {
                card.bear(points, confidence);
            }
        }

        // Bollinger %B
        let percent_b = snapshot.bollinger.percent_b;
        if percent_b < w.bollinger_extreme_low {
            card.bull(
                w.bollinger_extreme_points * bull_osc,
                w.bollinger_extreme_confidence * bull_osc,
            );
        } else if percent_b < w.bollinger_low {
            card.bull(w.bollinger_points * bull_osc, 0.0);
        } else if percent_b > w.bollinger_extreme_high {
            card.bear(
                w.bollinger_extreme_points * bear_osc,
                w.bollinger_extreme_confidence * bear_osc,
            );
        } else if percent_b > w.bollinger_high {
            card.bear(w.bollinger_points * bear_osc, 0.0);
        }

        // Stochastic
        let (k, d) = (snapshot.stochastic.k, snapshot.stochastic.d);
        if k < w.stochastic_oversold && d < w.stochastic_oversold {
            card.bull(
                w.stochastic_double_points * bull_osc,
                w.stochastic_double_confidence * bull_osc,
            );
        } else if k > w.stochastic_overbought && d > w.stochastic_overbought {
            card.bear(
                w.stochastic_double_points * bear_osc,
                w.stochastic_double_confidence * bear_osc,
            );
        } else if k < w.stochastic_oversold || d < w.stochastic_oversold {
            card.bull(w.stochastic_single_points * bull_osc, 0.0);
        } else if k > w.stochastic_overbought || d > w.stochastic_overbought {
            card.bear(w.stochastic_single_points * bear_osc, 0.0);
        }

        // Market structure
        let structure_points = structure.strength * w.structure_score_factor;
        let structure_confidence = structure.strength * w.structure_confidence_factor;
        match structure.bias {
            Bias::Bullish => card.bull(structure_points, structure_confidence),
            Bias::Bearish => card.bear(structure_points, structure_confidence),
            Bias::Neutral => {}
        }

        match structure.volume_profile {
            VolumeProfile::Strong => card.confidence += w.volume_strong_confidence,
            VolumeProfile::Weak => card.confidence += w.volume_weak_confidence,
            VolumeProfile::Neutral => {}
        }

        // Volatility
        if price > 0.0 && snapshot.atr.is_finite() {
            let atr_pct = snapshot.atr / price * 100.0;
            if atr_pct > w.volatility_high_pct {
                card.confidence += w.volatility_high_confidence;
            } else if atr_pct < w.volatility_low_pct {
                card.confidence += w.volatility_low_confidence;
            }
        }

        card
    }
}
