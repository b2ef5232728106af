//! Stop-loss and take-profit levels from volatility and nearby swing levels.

use crate::types::{Direction, PriceLevel, Timeframe};

/// Risk distances never exceed this fraction of the entry price.
const MAX_DISTANCE_FRACTION: f64 = 0.30;
/// Offset placed beyond a snapped support/resistance level.
const LEVEL_BUFFER: f64 = 0.002;
/// A level snaps the base stop/target when within this fraction of its distance.
const SNAP_BAND: f64 = 0.5;

const NEUTRAL_STOP_PCT: f64 = 2.0;
const NEUTRAL_TARGET_PCT: f64 = 4.0;

/// Stop-loss and take-profit prices for an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl RiskLevels {
    /// Fixed levels for signals without a direction.
    pub fn neutral(entry: f64) -> Self {
        Self {
            stop_loss: entry * (1.0 - NEUTRAL_STOP_PCT / 100.0),
            take_profit: entry * (1.0 + NEUTRAL_TARGET_PCT / 100.0),
        }
    }
}

/// Derive risk levels for a signal.
///
/// The stop sits `atr * risk_multiplier` away from entry (the timeframe's base
/// percentage when ATR is unusable) and the target twice as far. A support
/// (resistance) between the base stop and entry, close to the base stop, pulls
/// the stop just beyond that level. Targets snap the same way to the opposite
/// level set.
pub fn risk_levels(
    direction: Direction,
    entry: f64,
    atr: f64,
    timeframe: Timeframe,
    supports: &[PriceLevel],
    resistances: &[PriceLevel],
) -> RiskLevels {
    let distance = stop_distance(entry, atr, timeframe);

    match direction {
        Direction::Neutral => RiskLevels::neutral(entry),
        Direction::Long => {
            let base_stop = entry - distance;
            let base_target = entry + distance * 2.0;

            let stop_loss = supports
                .iter()
                .find(|level| {
                    level.price > base_stop
                        && level.price < entry
                        && level.price - base_stop <= distance * SNAP_BAND
                })
                .map(|level| level.price * (1.0 - LEVEL_BUFFER))
                .unwrap_or(base_stop);

            let take_profit = resistances
                .iter()
                .find(|level| {
                    level.price > entry
                        && level.price < base_target
                        && base_target - level.price <= distance * 2.0 * SNAP_BAND
                })
                .map(|level| level.price * (1.0 - LEVEL_BUFFER))
                .filter(|&target| target > entry)
                .unwrap_or(base_target);

            RiskLevels {
                stop_loss,
                take_profit,
            }
        }
        Direction::Short => {
            let base_stop = entry + distance;
            let base_target = entry - distance * 2.0;

            let stop_loss = resistances
                .iter()
                .find(|level| {
                    level.price < base_stop
                        && level.price > entry
                        && base_stop - level.price <= distance * SNAP_BAND
                })
                .map(|level| level.price * (1.0 + LEVEL_BUFFER))
                .unwrap_or(base_stop);

            let take_profit = supports
                .iter()
                .find(|level| {
                    level.price < entry
                        && level.price > base_target
                        && level.price - base_target <= distance * 2.0 * SNAP_BAND
                })
                .map(|level| level.price * (1.0 + LEVEL_BUFFER))
                .filter(|&target| target < entry)
                .unwrap_or(base_target);

            RiskLevels {
                stop_loss,
                take_profit,
            }
        }
    }
}

fn stop_distance(entry: f64, atr: f64, timeframe: Timeframe) -> f64 {
    let distance = if atr.is_finite() && atr > 0.0 {
        atr * timeframe.risk_multiplier()
    } else {
        entry * timeframe.stop_loss_pct() / 100.0
    };
    distance.min(entry * MAX_DISTANCE_FRACTION)
}
