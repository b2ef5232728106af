//! Cross-timeframe reconciliation of signals for one symbol.
//!
//! Longer timeframes carry more conviction. A confident higher timeframe can
//! flip a nearby lower one to its direction, otherwise it pulls the lower
//! timeframe's confidence toward its own. A final pass nudges weak outliers
//! toward the dominant trend across all timeframes.

use crate::config::HarmonizerSettings;
use crate::services::signals::risk::risk_levels;
use crate::services::signals::scoring::ScoringEngine;
use crate::types::{Direction, DominantTrend, Signal, SignalStage, Timeframe};
use tracing::debug;

/// Vote weight of a timeframe: the three longest count 3, the next three 2,
/// the rest 1.
pub fn vote_weight(timeframe: Timeframe) -> f64 {
    match timeframe.ordinal() {
        8..=10 => 3.0,
        5..=7 => 2.0,
        _ => 1.0,
    }
}

/// Deterministic per-signal value in [0, 100) compared against thresholds.
pub fn influence(signal: &Signal) -> f64 {
    (signal.entry_price * signal.timeframe.ordinal() as f64).rem_euclid(100.0)
}

/// Weighted direction vote over scored signals. Fallback signals abstain.
pub fn dominant_trend(signals: &[Signal]) -> DominantTrend {
    let (net, total) = signals
        .iter()
        .filter(|s| !s.is_fallback())
        .fold((0.0, 0.0), |(net, total), s| {
            let weight = vote_weight(s.timeframe);
            (net + s.direction.sign() * weight, total + weight)
        });

    if total <= 0.0 {
        return DominantTrend::none();
    }

    let direction = if net > 0.0 {
        Direction::Long
    } else if net < 0.0 {
        Direction::Short
    } else {
        Direction::Neutral
    };

    DominantTrend {
        direction,
        dominance: net.abs() / total,
    }
}

pub struct Harmonizer {
    settings: HarmonizerSettings,
}

impl Default for Harmonizer {
    fn default() -> Self {
        Self::new(HarmonizerSettings::default())
    }
}

impl Harmonizer {
    pub fn new(settings: HarmonizerSettings) -> Self {
        Self { settings }
    }

    /// Influence below which a higher timeframe realigns a lower one.
    ///
    /// Grows with the higher timeframe's excess confidence, shrinks with the
    /// lower timeframe's own confidence and with distance.
    pub fn realign_threshold(&self, higher_confidence: f64, lower_confidence: f64, distance: usize) -> f64 {
        let excess = higher_confidence - self.settings.realign_confidence;
        if excess <= 0.0 || distance == 0 {
            return 0.0;
        }
        excess * self.settings.realign_scale * (100.0 - lower_confidence).max(0.0) / 50.0
            / distance as f64
    }

    fn blend_weight(&self, distance: usize) -> f64 {
        (self.settings.blend_base / distance.max(1) as f64).max(self.settings.blend_floor)
    }

    /// Reconcile one symbol's signals. Returns the dominant trend and the
    /// signals ordered longest timeframe first.
    pub fn harmonize(&self, mut signals: Vec<Signal>, scoring: &ScoringEngine) -> (DominantTrend, Vec<Signal>) {
        signals.sort_by(|a, b| b.timeframe.cmp(&a.timeframe));
        let dominant = dominant_trend(&signals);

        for i in 0..signals.len() {
            let (head, tail) = signals.split_at_mut(i + 1);
            let higher = &head[i];
            if higher.is_fallback() {
                continue;
            }

            for lower in tail.iter_mut() {
                let distance = higher.timeframe.ordinal().saturating_sub(lower.timeframe.ordinal());
                if distance == 0 || distance > self.settings.max_distance {
                    continue;
                }
                if lower.is_fallback() {
                    continue;
                }
                self.apply_pair(higher, lower, distance, scoring);
            }
        }

        if dominant.direction != Direction::Neutral
            && dominant.dominance >= self.settings.dominance_threshold
        {
            let limit = dominant.dominance * self.settings.nudge_scale;
            for signal in signals.iter_mut().filter(|s| !s.is_fallback()) {
                if signal.confidence < self.settings.realign_confidence
                    && signal.direction != dominant.direction
                    && influence(signal) < limit
                {
                    debug!(
                        "Nudging {} {} from {} to dominant {}",
                        signal.symbol,
                        signal.timeframe,
                        signal.direction.label(),
                        dominant.direction.label()
                    );
                    realign(signal, dominant.direction, scoring);
                }
            }
        }

        for signal in signals.iter_mut().filter(|s| !s.is_fallback()) {
            signal.stage = SignalStage::Harmonized;
        }

        (dominant, signals)
    }

    fn apply_pair(&self, higher: &Signal, lower: &mut Signal, distance: usize, scoring: &ScoringEngine) {
        if higher.confidence > self.settings.realign_confidence && higher.direction != lower.direction {
            let threshold = self.realign_threshold(higher.confidence, lower.confidence, distance);
            if influence(lower) < threshold {
                debug!(
                    "Realigning {} {} from {} to {} ({})",
                    lower.symbol,
                    lower.timeframe,
                    lower.direction.label(),
                    higher.direction.label(),
                    higher.timeframe
                );
                realign(lower, higher.direction, scoring);
                return;
            }
        }

        let w = self.blend_weight(distance);
        let blended = lower.confidence * (1.0 - w) + higher.confidence * w;
        // Agreeing timeframes only ever reinforce each other.
        let confidence = if higher.direction == lower.direction {
            lower.confidence.max(blended)
        } else {
            blended
        };

        if confidence != lower.confidence {
            lower.confidence = confidence;
            lower.success_probability =
                scoring.success_probability(confidence, lower.timeframe, lower.direction);
        }
    }
}

/// Switch a signal's direction and rederive its risk levels.
fn realign(signal: &mut Signal, direction: Direction, scoring: &ScoringEngine) {
    let levels = risk_levels(
        direction,
        signal.entry_price,
        signal.indicators.atr,
        signal.timeframe,
        &signal.indicators.supports,
        &signal.indicators.resistances,
    );
    signal.direction = direction;
    signal.stop_loss = levels.stop_loss;
    signal.take_profit = levels.take_profit;
    signal.success_probability =
        scoring.success_probability(signal.confidence, signal.timeframe, direction);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorSnapshot;

    fn signal(timeframe: Timeframe, direction: Direction, confidence: f64, entry: f64) -> Signal {
        let scoring = ScoringEngine::default();
        let levels = risk_levels(direction, entry, 1.0, timeframe, &[], &[]);
        let mut indicators = IndicatorSnapshot::neutral(entry);
        indicators.atr = 1.0;
        Signal {
            symbol: "BTC".to_string(),
            direction,
            confidence,
            entry_price: entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            success_probability: scoring.success_probability(confidence, timeframe, direction),
            timeframe,
            timestamp: 0,
            stage: SignalStage::Scored,
            indicators,
        }
    }

    #[test]
    fn test_vote_weights() {
        assert_eq!(vote_weight(Timeframe::OneMonth), 3.0);
        assert_eq!(vote_weight(Timeframe::ThreeDays), 3.0);
        assert_eq!(vote_weight(Timeframe::OneDay), 2.0);
        assert_eq!(vote_weight(Timeframe::OneHour), 2.0);
        assert_eq!(vote_weight(Timeframe::ThirtyMinutes), 1.0);
        assert_eq!(vote_weight(Timeframe::OneMinute), 1.0);
    }

    #[test]
    fn test_influence() {
        // 123.5 * 5 (1h) = 617.5
        let s = signal(Timeframe::OneHour, Direction::Long, 60.0, 123.5);
        assert!((influence(&s) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_trend_ignores_fallbacks() {
        let mut fallback = signal(Timeframe::OneMonth, Direction::Neutral, 50.0, 100.0);
        fallback.stage = SignalStage::NoSignal;
        let signals = vec![
            fallback,
            signal(Timeframe::OneDay, Direction::Long, 60.0, 100.0),
            signal(Timeframe::OneHour, Direction::Short, 60.0, 100.0),
            signal(Timeframe::FiveMinutes, Direction::Long, 60.0, 100.0),
        ];
        let trend = dominant_trend(&signals);
        assert_eq!(trend.direction, Direction::Long);
        // (2 - 2 + 1) / 5
        assert!((trend.dominance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_shape() {
        let harmonizer = Harmonizer::default();
        assert_eq!(harmonizer.realign_threshold(70.0, 40.0, 1), 0.0);
        // (90 - 70) * 4 * (100 - 50) / 50 / 1
        assert!((harmonizer.realign_threshold(90.0, 50.0, 1) - 80.0).abs() < 1e-9);
        assert!((harmonizer.realign_threshold(90.0, 50.0, 2) - 40.0).abs() < 1e-9);
        assert!(harmonizer.realign_threshold(90.0, 80.0, 1) < 80.0);
    }

    #[test]
    fn test_confident_higher_realigns_lower() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        // 1h influence: 100 * 5 mod 100 = 0, always below a positive threshold.
        let signals = vec![
            signal(Timeframe::FourHours, Direction::Long, 90.0, 100.0),
            signal(Timeframe::OneHour, Direction::Short, 45.0, 100.0),
        ];
        let (_, harmonized) = harmonizer.harmonize(signals, &scoring);

        let hourly = &harmonized[1];
        assert_eq!(hourly.timeframe, Timeframe::OneHour);
        assert_eq!(hourly.direction, Direction::Long);
        assert!(hourly.stop_loss < hourly.entry_price);
        assert!(hourly.take_profit > hourly.entry_price);
        assert_eq!(hourly.stage, SignalStage::Harmonized);
    }

    #[test]
    fn test_high_influence_blends_instead() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        // 1h influence: 119.9 * 5 = 599.5 -> 99.5, above threshold 80 * 55 / 50 = 88
        let signals = vec![
            signal(Timeframe::FourHours, Direction::Long, 90.0, 119.9),
            signal(Timeframe::OneHour, Direction::Short, 45.0, 119.9),
        ];
        let (_, harmonized) = harmonizer.harmonize(signals, &scoring);
        assert_eq!(harmonized[1].direction, Direction::Short);
        // 45 * 0.75 + 90 * 0.25
        assert!((harmonized[1].confidence - 56.25).abs() < 1e-9);
    }

    #[test]
    fn test_confident_neutral_pulls_lower_neutral() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        // Adjacent timeframes blend with w = 0.25.
        let signals = vec![
            signal(Timeframe::OneDay, Direction::Neutral, 90.0, 100.0),
            signal(Timeframe::FourHours, Direction::Neutral, 40.0, 100.0),
        ];
        let (_, harmonized) = harmonizer.harmonize(signals, &scoring);

        let four_hour = &harmonized[1];
        assert_eq!(four_hour.direction, Direction::Neutral);
        assert!((four_hour.confidence - 52.5).abs() < 1e-9);
        assert_eq!(
            four_hour.success_probability,
            scoring.success_probability(52.5, Timeframe::FourHours, Direction::Neutral)
        );
    }

    #[test]
    fn test_disagreeing_pair_moves_toward_confident_higher() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        // Higher confidence is below the realign level, so only the blend applies.
        let signals = vec![
            signal(Timeframe::FourHours, Direction::Short, 68.0, 100.0),
            signal(Timeframe::OneHour, Direction::Long, 40.0, 100.0),
        ];
        let (_, harmonized) = harmonizer.harmonize(signals, &scoring);

        let hourly = &harmonized[1];
        assert_eq!(hourly.direction, Direction::Long);
        // 40 * 0.75 + 68 * 0.25
        assert!((hourly.confidence - 47.0).abs() < 1e-9);
    }

    #[test]
    fn test_agreeing_timeframes_never_lose_confidence() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        let input: Vec<Signal> = Timeframe::ALL
            .iter()
            .enumerate()
            .map(|(i, &tf)| signal(tf, Direction::Long, 30.0 + (i as f64 * 7.0) % 60.0, 101.3))
            .collect();

        let (dominant, harmonized) = harmonizer.harmonize(input.clone(), &scoring);
        assert_eq!(dominant.direction, Direction::Long);
        assert_eq!(dominant.dominance, 1.0);

        for after in &harmonized {
            let before = input.iter().find(|s| s.timeframe == after.timeframe).unwrap();
            assert_eq!(after.direction, Direction::Long);
            assert!(after.confidence >= before.confidence);
        }
    }

    #[test]
    fn test_fallbacks_untouched() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        let mut fallback = signal(Timeframe::OneHour, Direction::Neutral, 50.0, 100.0);
        fallback.stage = SignalStage::NoSignal;

        let signals = vec![
            signal(Timeframe::FourHours, Direction::Long, 95.0, 100.0),
            fallback.clone(),
        ];
        let (_, harmonized) = harmonizer.harmonize(signals, &scoring);
        assert_eq!(harmonized[1], fallback);
    }

    #[test]
    fn test_dominant_trend_nudges_weak_outlier() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        // 1m influence: 100.1 * 1 mod 100 = 0.1; far from any higher timeframe.
        let mut signals: Vec<Signal> = [Timeframe::OneMonth, Timeframe::OneWeek, Timeframe::ThreeDays]
            .iter()
            .map(|&tf| signal(tf, Direction::Short, 60.0, 100.1))
            .collect();
        signals.push(signal(Timeframe::OneMinute, Direction::Long, 40.0, 100.1));

        let (dominant, harmonized) = harmonizer.harmonize(signals, &scoring);
        assert_eq!(dominant.direction, Direction::Short);
        assert_eq!(harmonized[3].timeframe, Timeframe::OneMinute);
        assert_eq!(harmonized[3].direction, Direction::Short);
    }

    #[test]
    fn test_harmonize_is_deterministic() {
        let harmonizer = Harmonizer::default();
        let scoring = ScoringEngine::default();
        let input = vec![
            signal(Timeframe::OneDay, Direction::Short, 88.0, 250.25),
            signal(Timeframe::FourHours, Direction::Long, 52.0, 250.25),
            signal(Timeframe::OneHour, Direction::Neutral, 35.0, 250.25),
        ];
        assert_eq!(
            harmonizer.harmonize(input.clone(), &scoring),
            harmonizer.harmonize(input, &scoring)
        );
    }
}
