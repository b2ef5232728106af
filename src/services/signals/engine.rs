//! Signal engine facade: candle updates, per-timeframe scoring,
//! cross-timeframe harmonization and outcome feedback.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::services::candle_store::{validate_symbol, CandleStore};
use crate::services::signals::{AccuracyStore, Harmonizer, IndicatorCache, ScoringEngine};
use crate::types::{AccuracyRecord, Candle, EngineStats, Signal, SymbolSignals, Timeframe};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

/// Key = (lowercased symbol, timeframe)
type SeriesKey = (String, Timeframe);

/// Last computed signal and the series version it was computed from.
struct LastSignal {
    signal: Signal,
    version: u64,
}

/// Counts a computation as in flight until dropped.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl<'a> ActiveGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

fn validate_price(price: f64) -> Result<(), EngineError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "price must be a positive finite number, got {}",
            price
        )));
    }
    Ok(())
}

/// Engine for computing, harmonizing and publishing trading signals.
pub struct SignalEngine {
    candles: Arc<CandleStore>,
    cache: Arc<IndicatorCache>,
    accuracy: Arc<AccuracyStore>,
    scoring: Arc<ScoringEngine>,
    harmonizer: Harmonizer,
    last: DashMap<SeriesKey, LastSignal>,
    /// One lock per series; held for the duration of a computation.
    locks: DashMap<SeriesKey, Arc<Mutex<()>>>,
    active: AtomicUsize,
    sender: broadcast::Sender<SymbolSignals>,
}

impl SignalEngine {
    /// Create a new signal engine.
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let (sender, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Arc::new(Self {
            candles: CandleStore::new(),
            cache: Arc::new(IndicatorCache::new(config.cache_capacity)),
            accuracy: AccuracyStore::new(),
            scoring: Arc::new(ScoringEngine::new(config.scoring)),
            harmonizer: Harmonizer::new(config.harmonizer),
            last: DashMap::new(),
            locks: DashMap::new(),
            active: AtomicUsize::new(0),
            sender,
        })
    }

    /// Replace the candle series for a symbol and timeframe.
    ///
    /// Returns the new series version. Cached indicator values for the series
    /// are dropped.
    pub fn update(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<u64, EngineError> {
        let version = self.candles.replace(symbol, timeframe, candles)?;
        self.cache.invalidate_series(symbol, timeframe);
        Ok(version)
    }

    /// Score a single timeframe independently of the others.
    ///
    /// When a computation for the same symbol and timeframe is already
    /// running, the last known signal is returned instead; without one the
    /// call waits for the running computation.
    pub async fn compute(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        current_price: f64,
    ) -> Result<Signal, EngineError> {
        validate_symbol(symbol)?;
        validate_price(current_price)?;

        let key = (symbol.to_lowercase(), timeframe);
        let lock = self.lock_for(&key);

        let _guard = match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(last) = self.last_signal(symbol, timeframe) {
                    debug!(
                        "Computation for {} {} in flight - returning last known signal",
                        symbol, timeframe
                    );
                    return Ok(last);
                }

                debug!("Waiting for in-flight computation of {} {}", symbol, timeframe);
                let guard = lock.lock_owned().await;
                if let Some(last) = self.last_signal(symbol, timeframe) {
                    return Ok(last);
                }
                guard
            }
        };

        let (signal, version) = self.score_timeframe(symbol, timeframe, current_price).await?;
        let signal = signal.freeze();
        self.store_last(key, &signal, version);

        debug!(
            "Computed {} {} signal: {} ({:.1}%)",
            symbol,
            timeframe,
            signal.direction.label(),
            signal.confidence
        );

        Ok(signal)
    }

    /// Score every timeframe in parallel, then harmonize across them.
    ///
    /// The result is also published to subscribers.
    pub async fn compute_all(
        &self,
        symbol: &str,
        current_price: f64,
    ) -> Result<SymbolSignals, EngineError> {
        validate_symbol(symbol)?;
        validate_price(current_price)?;

        let symbol_lower = symbol.to_lowercase();

        // Locks are always taken in the same order, so concurrent calls cannot deadlock.
        let mut guards = Vec::with_capacity(Timeframe::ALL.len());
        for timeframe in Timeframe::ALL {
            let lock = self.lock_for(&(symbol_lower.clone(), timeframe));
            guards.push(lock.lock_owned().await);
        }

        let results = join_all(
            Timeframe::ALL
                .iter()
                .map(|&timeframe| self.score_timeframe(symbol, timeframe, current_price)),
        )
        .await;

        let mut scored = Vec::with_capacity(results.len());
        let mut versions = BTreeMap::new();
        for result in results {
            let (signal, version) = result?;
            versions.insert(signal.timeframe, version);
            scored.push(signal);
        }

        let (dominant, harmonized) = self.harmonizer.harmonize(scored, &self.scoring);

        let mut signals = BTreeMap::new();
        for signal in harmonized {
            let signal = signal.freeze();
            let version = versions.get(&signal.timeframe).copied().unwrap_or(0);
            self.store_last((symbol_lower.clone(), signal.timeframe), &signal, version);
            signals.insert(signal.timeframe, signal);
        }
        drop(guards);

        info!(
            "Harmonized {} across {} timeframes: {} (dominance {:.2})",
            symbol,
            signals.len(),
            dominant.direction.label(),
            dominant.dominance
        );

        let result = SymbolSignals {
            symbol: symbol.to_uppercase(),
            dominant,
            signals,
        };

        if self.sender.send(result.clone()).is_err() {
            debug!("No subscribers for {} signals", symbol);
        }

        Ok(result)
    }

    /// Record whether a previously issued signal was correct.
    pub fn report_outcome(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        was_correct: bool,
    ) -> Result<AccuracyRecord, EngineError> {
        validate_symbol(symbol)?;
        Ok(self.accuracy.record_outcome(symbol, timeframe, was_correct))
    }

    /// Accuracy records for every timeframe of a symbol.
    pub fn accuracy_records(&self, symbol: &str) -> Vec<AccuracyRecord> {
        self.accuracy.symbol_records(symbol)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache_size: self.cache.len(),
            tracked_symbols: self.candles.symbol_count(),
            accuracy_records: self.accuracy.len(),
            in_flight: self.active.load(Ordering::Relaxed),
        }
    }

    /// Subscribe to harmonized results from [`SignalEngine::compute_all`].
    pub fn subscribe(&self) -> broadcast::Receiver<SymbolSignals> {
        self.sender.subscribe()
    }

    /// Most recent signal computed for a symbol and timeframe.
    pub fn last_signal(&self, symbol: &str, timeframe: Timeframe) -> Option<Signal> {
        self.last
            .get(&(symbol.to_lowercase(), timeframe))
            .map(|entry| entry.signal.clone())
    }

    /// Drop cached indicator values and last known signals for a symbol.
    /// Stored candles are kept.
    pub fn invalidate(&self, symbol: &str) {
        let symbol_lower = symbol.to_lowercase();
        self.cache.invalidate_symbol(symbol);
        self.last.retain(|(s, _), _| *s != symbol_lower);
        info!("Invalidated cached signals for {}", symbol);
    }

    fn lock_for(&self, key: &SeriesKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Score one timeframe on the blocking pool against the current series.
    async fn score_timeframe(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        price: f64,
    ) -> Result<(Signal, u64), EngineError> {
        let (candles, version) = match self.candles.get(symbol, timeframe) {
            Some(series) => (series.candles, series.version),
            None => (Arc::new(Vec::new()), 0),
        };
        let weight = self.accuracy.get_weight(symbol, timeframe);

        let scoring = self.scoring.clone();
        let cache = self.cache.clone();
        let owned_symbol = symbol.to_string();

        let _active = ActiveGuard::new(&self.active);
        let signal = tokio::task::spawn_blocking(move || {
            scoring.score(&cache, &owned_symbol, timeframe, &candles, price, weight)
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))?;

        Ok((signal, version))
    }

    /// Keep the signal unless a newer series version already produced one.
    fn store_last(&self, key: SeriesKey, signal: &Signal, version: u64) {
        match self.last.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().version <= version {
                    entry.insert(LastSignal {
                        signal: signal.clone(),
                        version,
                    });
                } else {
                    debug!(
                        "Discarding stale {} {} signal (version {} < {})",
                        signal.symbol,
                        signal.timeframe,
                        version,
                        entry.get().version
                    );
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(LastSignal {
                    signal: signal.clone(),
                    version,
                });
            }
        }
    }
}
