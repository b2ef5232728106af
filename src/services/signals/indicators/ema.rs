//! Exponential Moving Average (EMA) indicator.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::Candle;

/// EMA (Exponential Moving Average) of closes.
///
/// Smoothing factor is `2 / (period + 1)` and the average is seeded with the
/// first close rather than an SMA of the first `period` closes. MACD uses the
/// same seeding so results stay reproducible across call sites.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

/// EMA of every value, seeded with the first value.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = first;
    let mut result = Vec::with_capacity(values.len());
    result.push(ema);

    for value in values.iter().skip(1) {
        ema = (value - ema) * multiplier + ema;
        result.push(ema);
    }

    result
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &'static str {
        "ema"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64]
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<f64, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let series = ema_series(&closes, self.period);

        series.last().copied().ok_or(IndicatorError::InsufficientData {
            required: self.period,
            available: candles.len(),
        })
    }

    fn neutral(&self, price: f64) -> f64 {
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{from_closes, uptrend};

    #[test]
    fn test_ema_seeded_with_first_close() {
        // alpha = 0.5 for period 3
        let series = ema_series(&[10.0, 20.0, 20.0], 3);
        assert_eq!(series, vec![10.0, 15.0, 17.5]);
    }

    #[test]
    fn test_ema_constant_series() {
        let candles = from_closes(&[42.0; 30]);
        assert_eq!(Ema::new(9).calculate(&candles).unwrap(), 42.0);
    }

    #[test]
    fn test_ema_lags_in_uptrend() {
        let candles = uptrend(40);
        let fast = Ema::new(9).calculate(&candles).unwrap();
        let slow = Ema::new(21).calculate(&candles).unwrap();
        let last = candles.last().unwrap().close;
        assert!(slow < fast && fast < last);
    }

    #[test]
    fn test_ema_insufficient_data() {
        let candles = uptrend(5);
        assert!(Ema::new(9).calculate(&candles).is_err());
    }
}
