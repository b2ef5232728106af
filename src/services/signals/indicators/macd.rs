//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::{Candle, MacdValue};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn id(&self) -> &'static str {
        "macd"
    }

    fn params(&self) -> Vec<u64> {
        vec![
            self.fast_period as u64,
            self.slow_period as u64,
            self.signal_period as u64,
        ]
    }

    fn min_periods(&self) -> usize {
        self.slow_period.max(self.fast_period)
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MacdValue, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_series(&closes, self.fast_period);
        let slow = ema_series(&closes, self.slow_period);

        // Both series are seeded on the first close, so they are already aligned.
        let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = ema_series(&macd_line, self.signal_period);

        match (macd_line.last(), signal_line.last()) {
            (Some(&macd), Some(&signal)) => Ok(MacdValue {
                macd,
                signal,
                histogram: macd - signal,
            }),
            _ => Err(IndicatorError::InsufficientData {
                required: self.min_periods(),
                available: candles.len(),
            }),
        }
    }

    fn neutral(&self, _price: f64) -> MacdValue {
        MacdValue::default()
    }
}
