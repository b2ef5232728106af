//! Average True Range (ATR) indicator.

use super::{ensure_len, wilder_smooth, Indicator};
use crate::error::IndicatorError;
use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// Measures market volatility by calculating the Wilder-smoothed average of
/// true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }
}

impl Indicator for Atr {
    type Output = f64;

    fn id(&self) -> &'static str {
        "atr"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64]
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<f64, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let true_ranges: Vec<f64> = candles
            .windows(2)
            .map(|pair| pair[1].true_range(&pair[0]))
            .collect();

        wilder_smooth(&true_ranges, self.period)
            .last()
            .copied()
            .ok_or(IndicatorError::InsufficientData {
                required: self.min_periods(),
                available: candles.len(),
            })
    }

    fn neutral(&self, _price: f64) -> f64 {
        0.0
    }
}
