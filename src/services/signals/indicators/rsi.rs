//! Relative Strength Index (RSI) indicator.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::Candle;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// Uses Wilder's smoothing seeded with the mean of the first `period` changes.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &'static str {
        "rsi"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64]
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<f64, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let mut gains = Vec::with_capacity(candles.len() - 1);
        let mut losses = Vec::with_capacity(candles.len() - 1);

        for pair in candles.windows(2) {
            let change = pair[1].close - pair[0].close;
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        let period = self.period as f64;
        let mut avg_gain = gains.iter().take(self.period).sum::<f64>() / period;
        let mut avg_loss = losses.iter().take(self.period).sum::<f64>() / period;

        for i in self.period..gains.len() {
            avg_gain = (avg_gain * (period - 1.0) + gains[i]) / period;
            avg_loss = (avg_loss * (period - 1.0) + losses[i]) / period;
        }

        if avg_loss == 0.0 {
            // Flat series carries no momentum either way.
            return Ok(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Ok((100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0))
    }

    fn neutral(&self, _price: f64) -> f64 {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{downtrend, from_closes, uptrend};

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 15);
        assert_eq!(Rsi::new(7).min_periods(), 8);
    }

    #[test]
    fn test_rsi_insufficient_data_is_neutral() {
        let candles = uptrend(10);
        let rsi = Rsi::default();
        assert!(rsi.calculate(&candles).is_err());
        assert_eq!(rsi.calculate_or_neutral(&candles), 50.0);
    }

    #[test]
    fn test_rsi_uptrend_high_value() {
        let value = Rsi::default().calculate(&uptrend(50)).unwrap();
        assert!(value > 50.0, "RSI in uptrend should be > 50, got {}", value);
        assert!(value <= 100.0);
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let value = Rsi::default().calculate(&downtrend(50)).unwrap();
        assert!(value < 50.0, "RSI in downtrend should be < 50, got {}", value);
        assert!(value >= 0.0);
    }

    #[test]
    fn test_rsi_zero_average_loss() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(Rsi::default().calculate(&from_closes(&closes)).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_flat_series() {
        let candles = from_closes(&[100.0; 20]);
        assert_eq!(Rsi::default().calculate(&candles).unwrap(), 50.0);
    }

    #[test]
    fn test_rsi_known_value() {
        // Two gains of 1 and one loss of 1 with period 3: RS = (2/3)/(1/3) = 2.
        let candles = from_closes(&[10.0, 11.0, 12.0, 11.0]);
        let value = Rsi::new(3).calculate(&candles).unwrap();
        assert!((value - 100.0 * 2.0 / 3.0).abs() < 1e-9);
    }
}
