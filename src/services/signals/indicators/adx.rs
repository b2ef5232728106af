//! Average Directional Index (ADX) indicator.

use super::{ensure_len, wilder_smooth, Indicator};
use crate::error::IndicatorError;
use crate::types::{AdxValue, Candle};

/// ADX (Average Directional Index) indicator.
///
/// Measures trend strength (not direction):
/// - Below 20: Weak trend / ranging market
/// - 20-40: Trending
/// - Above 40: Strong trend
///
/// Combined with +DI and -DI for direction.
pub struct Adx {
    period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }
}

impl Indicator for Adx {
    type Output = AdxValue;

    fn id(&self) -> &'static str {
        "adx"
    }

    fn params(&self) -> Vec<u64> {
        vec![self.period as u64]
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<AdxValue, IndicatorError> {
        ensure_len(candles, self.min_periods())?;

        let mut plus_dm = Vec::with_capacity(candles.len() - 1);
        let mut minus_dm = Vec::with_capacity(candles.len() - 1);
        let mut tr = Vec::with_capacity(candles.len() - 1);

        for pair in candles.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            let up_move = current.high - previous.high;
            let down_move = previous.low - current.low;

            plus_dm.push(if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            });
            minus_dm.push(if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            });

            tr.push(current.true_range(previous));
        }

        let smoothed_plus_dm = wilder_smooth(&plus_dm, self.period);
        let smoothed_minus_dm = wilder_smooth(&minus_dm, self.period);
        let smoothed_tr = wilder_smooth(&tr, self.period);

        let mut dx_values = Vec::with_capacity(smoothed_tr.len());
        let mut last_di = (0.0, 0.0);

        for ((atr, pdm), mdm) in smoothed_tr
            .iter()
            .zip(&smoothed_plus_dm)
            .zip(&smoothed_minus_dm)
        {
            let (plus_di, minus_di) = if *atr > 0.0 {
                (pdm / atr * 100.0, mdm / atr * 100.0)
            } else {
                (0.0, 0.0)
            };

            let di_sum = plus_di + minus_di;
            let dx = if di_sum > 0.0 {
                (plus_di - minus_di).abs() / di_sum * 100.0
            } else {
                0.0
            };

            dx_values.push(dx);
            last_di = (plus_di, minus_di);
        }

        if dx_values.is_empty() {
            return Err(IndicatorError::InsufficientData {
                required: self.min_periods(),
                available: candles.len(),
            });
        }

        // Full Wilder smoothing once enough DX values exist, plain mean before that.
        let adx = match wilder_smooth(&dx_values, self.period).last() {
            Some(&adx) => adx,
            None => dx_values.iter().sum::<f64>() / dx_values.len() as f64,
        };

        Ok(AdxValue {
            adx: adx.clamp(0.0, 100.0),
            plus_di: last_di.0,
            minus_di: last_di.1,
        })
    }

    fn neutral(&self, _price: f64) -> AdxValue {
        AdxValue {
            adx: 25.0,
            plus_di: 25.0,
            minus_di: 25.0,
        }
    }
}
