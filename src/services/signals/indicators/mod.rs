//! Technical indicator implementations.
//!
//! Every indicator reports `IndicatorError::InsufficientData` for short input
//! and has a neutral default, so callers can always obtain a value through
//! [`Indicator::calculate_or_neutral`].

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod support_resistance;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::Stochastic;
pub use support_resistance::SupportResistance;

use crate::error::IndicatorError;
use crate::services::signals::cache::CacheValue;
use crate::types::Candle;

/// A technical indicator computed from a candle series.
pub trait Indicator: Send + Sync {
    type Output: CacheValue + Clone;

    /// Unique identifier for this indicator.
    fn id(&self) -> &'static str;

    /// Parameters as raw bits, used in cache keys.
    fn params(&self) -> Vec<u64>;

    /// Minimum number of candles required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the latest value.
    fn calculate(&self, candles: &[Candle]) -> Result<Self::Output, IndicatorError>;

    /// Value reported when there is not enough data.
    fn neutral(&self, price: f64) -> Self::Output;

    /// Calculate, degrading to the neutral default on short input.
    fn calculate_or_neutral(&self, candles: &[Candle]) -> Self::Output {
        let price = candles.last().map(|c| c.close).unwrap_or(0.0);
        self.calculate(candles)
            .unwrap_or_else(|_| self.neutral(price))
    }
}

/// Fail with `InsufficientData` when fewer than `required` candles are present.
pub(crate) fn ensure_len(candles: &[Candle], required: usize) -> Result<(), IndicatorError> {
    if candles.len() < required || candles.is_empty() {
        return Err(IndicatorError::InsufficientData {
            required: required.max(1),
            available: candles.len(),
        });
    }
    Ok(())
}

/// Wilder's smoothing: seed with the mean of the first `period` values, then
/// `avg = (avg * (period - 1) + value) / period`.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut avg = values.iter().take(period).sum::<f64>() / period as f64;
    result.push(avg);

    for value in values.iter().skip(period) {
        avg = (avg * (period - 1) as f64 + value) / period as f64;
        result.push(avg);
    }

    result
}
