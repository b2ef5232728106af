//! Outcome tracking and adaptive confidence weights.

use crate::types::{AccuracyRecord, Timeframe};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Key = (lowercased symbol, timeframe)
type RecordKey = (String, Timeframe);

fn record_key(symbol: &str, timeframe: Timeframe) -> RecordKey {
    (symbol.to_lowercase(), timeframe)
}

/// Store for tracking signal outcomes per symbol and timeframe.
pub struct AccuracyStore {
    records: DashMap<RecordKey, AccuracyRecord>,
}

impl AccuracyStore {
    /// Create a new accuracy store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: DashMap::new(),
        })
    }

    /// Record whether a signal turned out correct.
    pub fn record_outcome(&self, symbol: &str, timeframe: Timeframe, was_correct: bool) -> AccuracyRecord {
        let mut entry = self
            .records
            .entry(record_key(symbol, timeframe))
            .or_insert_with(|| AccuracyRecord::new(symbol.to_uppercase(), timeframe));
        entry.record_outcome(was_correct);
        debug!(
            "Updated accuracy for {} {}: {:.1}% ({} total), weight {:.2}",
            entry.symbol, timeframe, entry.win_rate, entry.total_count, entry.adaptive_weight
        );
        entry.clone()
    }

    /// Confidence multiplier for a symbol and timeframe, 1.0 without history.
    pub fn get_weight(&self, symbol: &str, timeframe: Timeframe) -> f64 {
        self.records
            .get(&record_key(symbol, timeframe))
            .map(|r| r.adaptive_weight)
            .unwrap_or(1.0)
    }

    /// Get the record for a symbol and timeframe.
    pub fn get_record(&self, symbol: &str, timeframe: Timeframe) -> Option<AccuracyRecord> {
        self.records
            .get(&record_key(symbol, timeframe))
            .map(|r| r.clone())
    }

    /// All records for a symbol, shortest timeframe first.
    pub fn symbol_records(&self, symbol: &str) -> Vec<AccuracyRecord> {
        let symbol_lower = symbol.to_lowercase();
        let mut records: Vec<AccuracyRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == symbol_lower)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| r.timeframe);
        records
    }

    /// Number of tracked (symbol, timeframe) pairs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
