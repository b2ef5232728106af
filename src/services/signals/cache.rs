//! Memoization of indicator values across a signal cycle.

use crate::services::signals::indicators::Indicator;
use crate::types::{
    AdxValue, BollingerValue, Candle, MacdValue, StochasticValue, SwingLevels, Timeframe,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a candle series at a point in time.
///
/// Length and last timestamp change whenever candles are appended, so cached
/// values for an older version of the series are never returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub len: usize,
    pub last_time: i64,
}

impl SeriesId {
    pub fn new(symbol: &str, timeframe: Timeframe, candles: &[Candle]) -> Self {
        Self {
            symbol: symbol.to_lowercase(),
            timeframe,
            len: candles.len(),
            last_time: candles.last().map(|c| c.time).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    series: SeriesId,
    indicator: &'static str,
    params: Vec<u64>,
}

/// Any value an indicator can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Scalar(f64),
    Macd(MacdValue),
    Bollinger(BollingerValue),
    Stochastic(StochasticValue),
    Adx(AdxValue),
    Levels(SwingLevels),
}

/// Conversion between an indicator output and its cached form.
pub trait CacheValue: Sized {
    fn into_value(self) -> IndicatorValue;
    fn from_value(value: &IndicatorValue) -> Option<Self>;
}

macro_rules! cache_value {
    ($ty:ty, $variant:ident) => {
        impl CacheValue for $ty {
            fn into_value(self) -> IndicatorValue {
                IndicatorValue::$variant(self)
            }

            fn from_value(value: &IndicatorValue) -> Option<Self> {
                match value {
                    IndicatorValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

cache_value!(f64, Scalar);
cache_value!(MacdValue, Macd);
cache_value!(BollingerValue, Bollinger);
cache_value!(StochasticValue, Stochastic);
cache_value!(AdxValue, Adx);
cache_value!(SwingLevels, Levels);

struct CacheEntry {
    value: IndicatorValue,
    last_used: AtomicU64,
}

/// A thread-safe indicator cache with least-recently-used eviction.
pub struct IndicatorCache {
    data: DashMap<CacheKey, CacheEntry>,
    capacity: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IndicatorCache {
    /// Create a new cache holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Return the cached value for this series and indicator, computing and
    /// storing it on a miss.
    pub fn get_or_compute<I: Indicator>(
        &self,
        series: &SeriesId,
        indicator: &I,
        candles: &[Candle],
    ) -> I::Output {
        let key = CacheKey {
            series: series.clone(),
            indicator: indicator.id(),
            params: indicator.params(),
        };

        if let Some(entry) = self.data.get(&key) {
            if let Some(value) = I::Output::from_value(&entry.value) {
                entry.last_used.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return value;
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = indicator.calculate_or_neutral(candles);
        self.data.insert(
            key,
            CacheEntry {
                value: value.clone().into_value(),
                last_used: AtomicU64::new(self.tick()),
            },
        );

        if self.data.len() > self.capacity {
            self.evict();
        }

        value
    }

    /// Drop the least recently used tenth of the entries.
    fn evict(&self) {
        let target = self.capacity - self.capacity / 10;
        let mut ages: Vec<(CacheKey, u64)> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.last_used.load(Ordering::Relaxed)))
            .collect();

        if ages.len() <= target {
            return;
        }

        ages.sort_by_key(|(_, used)| *used);
        let excess = ages.len() - target;
        for (key, _) in ages.into_iter().take(excess) {
            self.data.remove(&key);
        }
    }

    /// Remove every value computed for a symbol and timeframe.
    pub fn invalidate_series(&self, symbol: &str, timeframe: Timeframe) {
        let symbol_lower = symbol.to_lowercase();
        self.data
            .retain(|k, _| !(k.series.symbol == symbol_lower && k.series.timeframe == timeframe));
    }

    /// Remove every value computed for a symbol.
    pub fn invalidate_symbol(&self, symbol: &str) {
        let symbol_lower = symbol.to_lowercase();
        self.data.retain(|k, _| k.series.symbol != symbol_lower);
    }

    /// Get the number of cached values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn hit_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
