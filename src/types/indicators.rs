use serde::{Deserialize, Serialize};

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Bollinger band levels with %B on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Position of the close inside the bands: 0 = lower band, 100 = upper band.
    pub percent_b: f64,
    /// Band span as a percentage of the middle band.
    pub width: f64,
}

/// Stochastic %K and %D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

/// ADX with its directional indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdxValue {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// A clustered swing level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Mean price of the swings in the cluster.
    pub price: f64,
    /// Number of swings merged into this level.
    pub touches: u32,
    /// Largest swing volume in the cluster.
    pub volume: f64,
}

/// Swing-derived levels before they are split around a reference price.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwingLevels {
    /// Clusters built from swing lows.
    pub lows: Vec<PriceLevel>,
    /// Clusters built from swing highs.
    pub highs: Vec<PriceLevel>,
}

impl SwingLevels {
    /// Supports below and resistances above `price`, nearest first, at most
    /// `limit` each.
    pub fn nearest(&self, price: f64, limit: usize) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
        let mut supports: Vec<PriceLevel> = self
            .lows
            .iter()
            .filter(|l| l.price < price)
            .copied()
            .collect();
        let mut resistances: Vec<PriceLevel> = self
            .highs
            .iter()
            .filter(|l| l.price > price)
            .copied()
            .collect();

        supports.sort_by(|a, b| (price - a.price).total_cmp(&(price - b.price)));
        resistances.sort_by(|a, b| (a.price - price).total_cmp(&(b.price - price)));
        supports.truncate(limit);
        resistances.truncate(limit);

        (supports, resistances)
    }
}
