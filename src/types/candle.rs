use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp (seconds) of the interval open.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a candle.
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Whether every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// True range against the previous candle.
    /// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
    pub fn true_range(&self, previous: &Candle) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - previous.close).abs();
        let lc = (self.low - previous.close).abs();
        hl.max(hc).max(lc)
    }
}

/// Candle resolution used for signal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    /// All timeframes, shortest first.
    pub const ALL: [Timeframe; 10] = [
        Timeframe::OneMinute,
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::ThirtyMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
        Timeframe::ThreeDays,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    /// Parse from a label such as "15m" or "1M".
    ///
    /// "1M" (month) and "1m" (minute) are case sensitive; the long forms are not.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => return Some(Self::OneMinute),
            "1M" => return Some(Self::OneMonth),
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "30m" => Some(Self::ThirtyMinutes),
            "1h" | "60m" => Some(Self::OneHour),
            "4h" => Some(Self::FourHours),
            "1d" | "24h" => Some(Self::OneDay),
            "3d" => Some(Self::ThreeDays),
            "1w" | "7d" => Some(Self::OneWeek),
            "1mo" | "1mth" | "month" => Some(Self::OneMonth),
            "minute" => Some(Self::OneMinute),
            _ => None,
        }
    }

    /// Short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1M",
        }
    }

    /// Position by duration, 1 for 1m up to 10 for 1M.
    pub fn ordinal(&self) -> usize {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 2,
            Self::FifteenMinutes => 3,
            Self::ThirtyMinutes => 4,
            Self::OneHour => 5,
            Self::FourHours => 6,
            Self::OneDay => 7,
            Self::ThreeDays => 8,
            Self::OneWeek => 9,
            Self::OneMonth => 10,
        }
    }

    /// Reliability weight applied to confidence. Longer candles are less noisy.
    pub fn reliability_weight(&self) -> f64 {
        match self {
            Self::OneMinute => 0.30,
            Self::FiveMinutes => 0.40,
            Self::FifteenMinutes => 0.50,
            Self::ThirtyMinutes => 0.60,
            Self::OneHour => 0.70,
            Self::FourHours => 0.80,
            Self::OneDay => 0.90,
            Self::ThreeDays => 0.95,
            Self::OneWeek => 1.00,
            Self::OneMonth => 1.00,
        }
    }

    /// ATR multiple used for the stop distance.
    pub fn risk_multiplier(&self) -> f64 {
        match self {
            Self::OneMinute => 0.5,
            Self::FiveMinutes => 0.75,
            Self::FifteenMinutes => 1.0,
            Self::ThirtyMinutes => 1.25,
            Self::OneHour => 1.5,
            Self::FourHours => 2.0,
            Self::OneDay => 2.5,
            Self::ThreeDays => 3.0,
            Self::OneWeek => 4.0,
            Self::OneMonth => 5.0,
        }
    }

    /// Base stop-loss distance in percent, used when ATR is unavailable.
    pub fn stop_loss_pct(&self) -> f64 {
        match self {
            Self::OneMinute => 0.5,
            Self::FiveMinutes => 0.8,
            Self::FifteenMinutes => 1.2,
            Self::ThirtyMinutes => 1.5,
            Self::OneHour => 2.0,
            Self::FourHours => 3.0,
            Self::OneDay => 5.0,
            Self::ThreeDays => 7.0,
            Self::OneWeek => 10.0,
            Self::OneMonth => 15.0,
        }
    }

    /// Minimum number of candles before the timeframe is scored at all.
    pub fn min_candles(&self) -> usize {
        match self {
            Self::OneWeek => 20,
            Self::OneMonth => 12,
            _ => 50,
        }
    }

    /// Daily and longer candles.
    pub fn is_long_horizon(&self) -> bool {
        matches!(
            self,
            Self::OneDay | Self::ThreeDays | Self::OneWeek | Self::OneMonth
        )
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_round_trips_through_label() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_str(tf.label()), Some(tf));
        }
    }

    #[test]
    fn test_minute_and_month_are_distinct() {
        assert_eq!(Timeframe::from_str("1m"), Some(Timeframe::OneMinute));
        assert_eq!(Timeframe::from_str("1M"), Some(Timeframe::OneMonth));
        assert_eq!(Timeframe::from_str("2h"), None);
    }

    #[test]
    fn test_weights_increase_with_duration() {
        let weights: Vec<f64> = Timeframe::ALL
            .iter()
            .map(|tf| tf.reliability_weight())
            .collect();
        assert!(weights.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(weights[0], 0.3);
        assert_eq!(weights[9], 1.0);
    }

    #[test]
    fn test_risk_multiplier_bounds() {
        for tf in Timeframe::ALL {
            let m = tf.risk_multiplier();
            assert!((0.5..=5.0).contains(&m));
        }
    }

    #[test]
    fn test_min_candles() {
        assert_eq!(Timeframe::OneHour.min_candles(), 50);
        assert_eq!(Timeframe::OneWeek.min_candles(), 20);
        assert_eq!(Timeframe::OneMonth.min_candles(), 12);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Timeframe::OneMonth).unwrap();
        assert_eq!(json, "\"1M\"");
        let parsed: Timeframe = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(parsed, Timeframe::FourHours);
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let prev = Candle::new(0, 10.0, 11.0, 9.0, 10.0, 1.0);
        let gap_up = Candle::new(60, 13.0, 14.0, 12.5, 13.5, 1.0);
        assert_eq!(gap_up.true_range(&prev), 4.0);
    }
}
