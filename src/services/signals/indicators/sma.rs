//! Simple Moving Average (SMA) indicator.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::Candle;

/// SMA (Simple Moving Average) of closes over the last `period` candles.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn id(&self) -> &'static str {
        "sma"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64]
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<f64, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let sma = candles
            .iter()
            .rev()
            .take(self.period)
            .map(|c| c.close)
            .sum::<f64>()
            / self.period as f64;

        Ok(sma)
    }

    fn neutral(&self, price: f64) -> f64 {
        price
    }
}
