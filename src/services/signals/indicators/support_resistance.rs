//! Swing-based support and resistance detection.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::{Candle, PriceLevel, SwingLevels};

/// Support/resistance levels from volume-confirmed swing points.
///
/// A swing low (high) at index `i` is a low (high) strictly below (above) every
/// low (high) within `sensitivity` bars on each side. A swing only counts when
/// its volume is at least `volume_ratio` times the average volume of the
/// `volume_window` bars centered on it. Surviving swings are clustered when
/// they lie within `tolerance_pct` percent of each other.
pub struct SupportResistance {
    sensitivity: usize,
    tolerance_pct: f64,
    volume_ratio: f64,
    volume_window: usize,
}

impl Default for SupportResistance {
    fn default() -> Self {
        Self {
            sensitivity: 5,
            tolerance_pct: 0.5,
            volume_ratio: 1.2,
            volume_window: 7,
        }
    }
}

/// Indices of swing lows and swing highs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwingPoints {
    pub lows: Vec<usize>,
    pub highs: Vec<usize>,
}

/// Find swing lows and highs with a symmetric window of `sensitivity` bars.
pub fn swing_points(candles: &[Candle], sensitivity: usize) -> SwingPoints {
    let mut points = SwingPoints::default();
    if sensitivity == 0 || candles.len() < sensitivity * 2 + 1 {
        return points;
    }

    for i in sensitivity..candles.len() - sensitivity {
        let neighbours = (i - sensitivity..=i + sensitivity).filter(|&j| j != i);

        let mut is_low = true;
        let mut is_high = true;
        for j in neighbours {
            if candles[j].low <= candles[i].low {
                is_low = false;
            }
            if candles[j].high >= candles[i].high {
                is_high = false;
            }
            if !is_low && !is_high {
                break;
            }
        }

        if is_low {
            points.lows.push(i);
        }
        if is_high {
            points.highs.push(i);
        }
    }

    points
}

impl SupportResistance {
    pub fn new(sensitivity: usize, tolerance_pct: f64) -> Self {
        Self {
            sensitivity,
            tolerance_pct,
            ..Self::default()
        }
    }

    /// Average volume of the window centered on `index`, clipped at the edges.
    fn local_volume(&self, candles: &[Candle], index: usize) -> f64 {
        let half = self.volume_window / 2;
        let start = index.saturating_sub(half);
        let end = (index + half).min(candles.len() - 1);
        let window = &candles[start..=end];
        window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64
    }

    fn volume_confirmed(&self, candles: &[Candle], index: usize) -> bool {
        let average = self.local_volume(candles, index);
        average > 0.0 && candles[index].volume >= self.volume_ratio * average
    }

    /// Merge sorted swing prices lying within the tolerance of the running cluster mean.
    fn cluster(&self, mut swings: Vec<(f64, f64)>) -> Vec<PriceLevel> {
        swings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut levels: Vec<PriceLevel> = Vec::new();
        for (price, volume) in swings {
            if let Some(level) = levels.last_mut() {
                let distance_pct = (price - level.price).abs() / level.price.abs().max(f64::EPSILON) * 100.0;
                if distance_pct <= self.tolerance_pct {
                    let touches = level.touches as f64;
                    level.price = (level.price * touches + price) / (touches + 1.0);
                    level.touches += 1;
                    level.volume = level.volume.max(volume);
                    continue;
                }
            }
            levels.push(PriceLevel {
                price,
                touches: 1,
                volume,
            });
        }

        levels
    }
}

impl Indicator for SupportResistance {
    type Output = SwingLevels;

    fn id(&self) -> &'static str {
        "support_resistance"
    }

    fn params(&self) -> Vec<u64> {
        vec![
            self.sensitivity as u64,
            self.tolerance_pct.to_bits(),
            self.volume_ratio.to_bits(),
            self.volume_window as u64,
        ]
    }

    fn min_periods(&self) -> usize {
        self.sensitivity * 2 + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<SwingLevels, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let points = swing_points(candles, self.sensitivity);

        let lows = points
            .lows
            .iter()
            .filter(|&&i| self.volume_confirmed(candles, i))
            .map(|&i| (candles[i].low, candles[i].volume))
            .collect();
        let highs = points
            .highs
            .iter()
            .filter(|&&i| self.volume_confirmed(candles, i))
            .map(|&i| (candles[i].high, candles[i].volume))
            .collect();

        Ok(SwingLevels {
            lows: self.cluster(lows),
            highs: self.cluster(highs),
        })
    }

    fn neutral(&self, _price: f64) -> SwingLevels {
        SwingLevels::default()
    }
}
