use crate::error::EngineError;
use crate::types::{Candle, Timeframe};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A stored series and the version it was written at.
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    pub candles: Arc<Vec<Candle>>,
    /// Increases by one on every replacement of the series.
    pub version: u64,
}

/// Storage for candle series keyed by symbol and timeframe.
pub struct CandleStore {
    /// Key = (lowercased symbol, timeframe)
    series: DashMap<(String, Timeframe), SeriesSnapshot>,
}

/// Reject empty or whitespace-only symbols.
pub fn validate_symbol(symbol: &str) -> Result<(), EngineError> {
    if symbol.trim().is_empty() {
        return Err(EngineError::InvalidInput("symbol must not be empty".to_string()));
    }
    Ok(())
}

/// Candles must have finite fields and strictly ascending timestamps.
pub fn validate_candles(candles: &[Candle]) -> Result<(), EngineError> {
    if let Some(index) = candles.iter().position(|c| !c.is_finite()) {
        return Err(EngineError::InvalidInput(format!(
            "candle {} has a non-finite field",
            index
        )));
    }

    if let Some(index) = candles.windows(2).position(|pair| pair[1].time <= pair[0].time) {
        let (previous, current) = (candles[index].time, candles[index + 1].time);
        let reason = if previous == current {
            "duplicate timestamp"
        } else {
            "timestamps out of order"
        };
        return Err(EngineError::InvalidInput(format!(
            "{} at candle {} ({} after {})",
            reason,
            index + 1,
            current,
            previous
        )));
    }

    Ok(())
}

impl CandleStore {
    /// Create a new candle store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            series: DashMap::new(),
        })
    }

    /// Replace the series for a symbol and timeframe, returning its new version.
    pub fn replace(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<u64, EngineError> {
        validate_symbol(symbol)?;
        if let Err(e) = validate_candles(&candles) {
            warn!("Rejected {} {} candles: {}", symbol, timeframe, e);
            return Err(e);
        }

        let key = (symbol.to_lowercase(), timeframe);
        let count = candles.len();
        let mut entry = self.series.entry(key).or_insert_with(|| SeriesSnapshot {
            candles: Arc::new(Vec::new()),
            version: 0,
        });
        entry.version += 1;
        entry.candles = Arc::new(candles);

        debug!(
            "Stored {} {} candles for {} (version {})",
            count, timeframe, symbol, entry.version
        );
        Ok(entry.version)
    }

    /// Get the current series for a symbol and timeframe.
    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<SeriesSnapshot> {
        self.series
            .get(&(symbol.to_lowercase(), timeframe))
            .map(|s| s.clone())
    }

    /// Number of distinct symbols with at least one series.
    pub fn symbol_count(&self) -> usize {
        self.series
            .iter()
            .map(|entry| entry.key().0.clone())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(times: &[i64]) -> Vec<Candle> {
        times
            .iter()
            .map(|&t| Candle::new(t, 100.0, 101.0, 99.0, 100.0, 10.0))
            .collect()
    }

    #[test]
    fn test_replace_bumps_version() {
        let store = CandleStore::new();
        assert!(store.get("BTC", Timeframe::OneHour).is_none());

        assert_eq!(store.replace("BTC", Timeframe::OneHour, candles(&[1, 2])).unwrap(), 1);
        assert_eq!(store.replace("btc", Timeframe::OneHour, candles(&[1, 2, 3])).unwrap(), 2);

        let snapshot = store.get("Btc", Timeframe::OneHour).unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.candles.len(), 3);
    }

    #[test]
    fn test_rejects_unsorted_and_duplicates() {
        let store = CandleStore::new();
        assert!(matches!(
            store.replace("BTC", Timeframe::OneHour, candles(&[1, 3, 2])),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(store.replace("BTC", Timeframe::OneHour, candles(&[1, 1])).is_err());
        assert!(store.get("BTC", Timeframe::OneHour).is_none());
    }

    #[test]
    fn test_rejects_non_finite_and_empty_symbol() {
        let store = CandleStore::new();
        let mut bad = candles(&[1, 2]);
        bad[1].close = f64::NAN;
        assert!(store.replace("BTC", Timeframe::OneHour, bad).is_err());
        assert!(store.replace("  ", Timeframe::OneHour, candles(&[1])).is_err());
    }

    #[test]
    fn test_symbol_count() {
        let store = CandleStore::new();
        store.replace("BTC", Timeframe::OneHour, candles(&[1])).unwrap();
        store.replace("BTC", Timeframe::OneDay, candles(&[1])).unwrap();
        store.replace("ETH", Timeframe::OneHour, candles(&[1])).unwrap();
        assert_eq!(store.symbol_count(), 2);
    }
}
