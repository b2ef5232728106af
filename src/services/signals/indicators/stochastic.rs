//! Stochastic Oscillator indicator.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::{Candle, StochasticValue};

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA of the last `d_period` %K values
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self {
            k_period: k_period.max(1),
            d_period: d_period.max(1),
        }
    }
}

impl Indicator for Stochastic {
    type Output = StochasticValue;

    fn id(&self) -> &'static str {
        "stochastic"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.k_period as u64, self.d_period as u64]
    }

    fn min_periods(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<StochasticValue, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let start = candles.len() - self.min_periods();
        let mut k_values = Vec::with_capacity(self.d_period);

        for i in (start + self.k_period - 1)..candles.len() {
            let window = &candles[(i + 1 - self.k_period)..=i];

            let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let highest_high = window
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max);

            let k = if highest_high > lowest_low {
                ((candles[i].close - lowest_low) / (highest_high - lowest_low)) * 100.0
            } else {
                50.0
            };

            k_values.push(k.clamp(0.0, 100.0));
        }

        let k = k_values.last().copied().unwrap_or(50.0);
        let d = k_values.iter().sum::<f64>() / k_values.len().max(1) as f64;

        Ok(StochasticValue { k, d })
    }

    fn neutral(&self, _price: f64) -> StochasticValue {
        StochasticValue { k: 50.0, d: 50.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{downtrend, from_closes, uptrend};

    #[test]
    fn test_stochastic_min_periods() {
        assert_eq!(Stochastic::default().min_periods(), 16);
    }

    #[test]
    fn test_stochastic_high_in_uptrend() {
        let value = Stochastic::default().calculate(&uptrend(30)).unwrap();
        assert!(value.k > 80.0 && value.d > 80.0, "{:?}", value);
    }

    #[test]
    fn test_stochastic_low_in_downtrend() {
        let value = Stochastic::default().calculate(&downtrend(30)).unwrap();
        assert!(value.k < 20.0 && value.d < 20.0, "{:?}", value);
    }

    #[test]
    fn test_stochastic_zero_range() {
        let value = Stochastic::default().calculate(&from_closes(&[5.0; 20])).unwrap();
        assert_eq!(value, StochasticValue { k: 50.0, d: 50.0 });
    }

    #[test]
    fn test_stochastic_insufficient_data() {
        let value = Stochastic::default().calculate_or_neutral(&uptrend(5));
        assert_eq!(value, StochasticValue { k: 50.0, d: 50.0 });
    }
}
