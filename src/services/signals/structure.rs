//! Market-structure classification: regime, bias, strength and volume profile.

use crate::services::signals::indicators::support_resistance::swing_points;
use crate::types::{AdxValue, Bias, Candle, MarketStructure, Regime, VolumeProfile};

/// Classifies a candle series from its trend and volatility readings.
#[derive(Debug, Clone)]
pub struct StructureClassifier {
    /// ADX above which a calm market counts as trending.
    pub trending_adx: f64,
    /// ATR as percent of price above which a market counts as volatile.
    pub volatile_atr_pct: f64,
    /// Bars on each side of a swing point.
    pub swing_sensitivity: usize,
    pub recent_volume_bars: usize,
    pub baseline_volume_bars: usize,
    pub strong_volume_ratio: f64,
    pub weak_volume_ratio: f64,
}

impl Default for StructureClassifier {
    fn default() -> Self {
        Self {
            trending_adx: 30.0,
            volatile_atr_pct: 3.0,
            swing_sensitivity: 3,
            recent_volume_bars: 5,
            baseline_volume_bars: 20,
            strong_volume_ratio: 1.3,
            weak_volume_ratio: 0.7,
        }
    }
}

impl StructureClassifier {
    /// Classify the series ending at its last candle.
    ///
    /// `adx` and `atr` are the latest indicator readings for the same series.
    pub fn classify(&self, candles: &[Candle], adx: &AdxValue, atr: f64) -> MarketStructure {
        let Some(last) = candles.last() else {
            return MarketStructure {
                regime: Regime::Ranging,
                bias: Bias::Neutral,
                strength: 0.0,
                volume_profile: VolumeProfile::Neutral,
            };
        };
        let price = last.close;

        let atr_pct = if price > 0.0 && atr.is_finite() {
            atr / price * 100.0
        } else {
            0.0
        };

        let regime = if adx.adx > self.trending_adx && atr_pct < self.volatile_atr_pct {
            Regime::Trending
        } else if atr_pct > self.volatile_atr_pct {
            Regime::Volatile
        } else {
            Regime::Ranging
        };

        let (swing_vote, break_pct) = self.swing_structure(candles, price);

        let di_vote = if adx.plus_di > adx.minus_di {
            1
        } else if adx.minus_di > adx.plus_di {
            -1
        } else {
            0
        };

        let bias = match di_vote + swing_vote {
            v if v > 0 => Bias::Bullish,
            v if v < 0 => Bias::Bearish,
            _ => Bias::Neutral,
        };

        let strength = (adx.adx * 1.2 + break_pct * 10.0).clamp(0.0, 100.0);

        MarketStructure {
            regime,
            bias,
            strength,
            volume_profile: self.volume_profile(candles),
        }
    }

    /// Vote from the last two swing highs and lows, plus how far (percent)
    /// price has broken beyond the most recent swing level.
    fn swing_structure(&self, candles: &[Candle], price: f64) -> (i32, f64) {
        let points = swing_points(candles, self.swing_sensitivity);

        let last_two = |indices: &[usize], value: fn(&Candle) -> f64| -> Option<(f64, f64)> {
            match indices {
                [.., a, b] => Some((value(&candles[*a]), value(&candles[*b]))),
                _ => None,
            }
        };

        let highs = last_two(&points.highs, |c: &Candle| c.high);
        let lows = last_two(&points.lows, |c: &Candle| c.low);

        let vote = match (highs, lows) {
            (Some((h1, h2)), Some((l1, l2))) if h2 > h1 && l2 > l1 => 1,
            (Some((h1, h2)), Some((l1, l2))) if h2 < h1 && l2 < l1 => -1,
            _ => 0,
        };

        let last_high = points.highs.last().map(|&i| candles[i].high);
        let last_low = points.lows.last().map(|&i| candles[i].low);

        let break_pct = match (last_high, last_low) {
            (Some(high), _) if price > high && high > 0.0 => (price - high) / high * 100.0,
            (_, Some(low)) if price < low && low > 0.0 => (low - price) / low * 100.0,
            _ => 0.0,
        };

        (vote, break_pct)
    }

    fn volume_profile(&self, candles: &[Candle]) -> VolumeProfile {
        let needed = self.recent_volume_bars + self.baseline_volume_bars;
        if self.recent_volume_bars == 0 || self.baseline_volume_bars == 0 || candles.len() < needed {
            return VolumeProfile::Neutral;
        }

        let tail = &candles[candles.len() - needed..];
        let (baseline, recent) = tail.split_at(self.baseline_volume_bars);

        let mean = |bars: &[Candle]| bars.iter().map(|c| c.volume).sum::<f64>() / bars.len() as f64;
        let baseline_mean = mean(baseline);
        if baseline_mean <= 0.0 {
            return VolumeProfile::Neutral;
        }

        let ratio = mean(recent) / baseline_mean;
        if ratio >= self.strong_volume_ratio {
            VolumeProfile::Strong
        } else if ratio <= self.weak_volume_ratio {
            VolumeProfile::Weak
        } else {
            VolumeProfile::Neutral
        }
    }
}
