//! Bollinger Bands indicator.

use super::{ensure_len, Indicator};
use crate::error::IndicatorError;
use crate::types::{BollingerValue, Candle};

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// Standard deviation is the population deviation over the window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Calculate standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerValue;

    fn id(&self) -> &'static str {
        "bollinger"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64, self.std_dev_multiplier.to_bits()]
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<BollingerValue, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let closes: Vec<f64> = candles
            .iter()
            .rev()
            .take(self.period)
            .map(|c| c.close)
            .collect();

        let middle = closes.iter().sum::<f64>() / self.period as f64;
        let std_dev = Self::std_dev(&closes, middle);

        let upper = middle + self.std_dev_multiplier * std_dev;
        let lower = middle - self.std_dev_multiplier * std_dev;
        let band_width = upper - lower;

        let current_price = closes[0];

        // %B: 0 at the lower band, 100 at the upper band
        let percent_b = if band_width > 0.0 {
            (current_price - lower) / band_width * 100.0
        } else {
            50.0
        };

        let width = if middle != 0.0 {
            band_width / middle * 100.0
        } else {
            0.0
        };

        Ok(BollingerValue {
            upper,
            middle,
            lower,
            percent_b,
            width,
        })
    }

    fn neutral(&self, price: f64) -> BollingerValue {
        BollingerValue {
            upper: price * 1.02,
            middle: price,
            lower: price * 0.98,
            percent_b: 50.0,
            width: 4.0,
        }
    }
}
