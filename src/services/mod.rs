pub mod candle_store;
pub mod signals;

pub use candle_store::{CandleStore, SeriesSnapshot};
pub use signals::{AccuracyStore, IndicatorCache, SignalEngine};
