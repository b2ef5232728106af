//! Candle builders shared by the integration tests.
#![allow(dead_code)]

use confluence::Candle;

pub const HOUR: i64 = 3600;

/// Steady advance: every bar opens 0.5 above the last and closes 1.0 above its open.
pub fn uptrend(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.5;
            Candle::new(i as i64 * HOUR, base, base + 2.0, base - 1.0, base + 1.0, 1000.0)
        })
        .collect()
}

pub fn downtrend(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let base = 200.0 - i as f64 * 0.5;
            Candle::new(i as i64 * HOUR, base, base + 1.0, base - 2.0, base - 1.0, 1000.0)
        })
        .collect()
}

/// Alternating closes around 100 with no trend.
pub fn sideways(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = if i % 2 == 0 { 99.5 } else { 100.5 };
            Candle::new(i as i64 * HOUR, 100.0, 101.0, 99.0, close, 1000.0)
        })
        .collect()
}

/// 40 bars rising linearly from 100 to 110, then 20 flat bars at 110.
pub fn rise_then_flat() -> Vec<Candle> {
    let mut candles = Vec::with_capacity(60);
    let mut previous = 100.0;
    for i in 0..40 {
        let close = 100.0 + 10.0 * i as f64 / 39.0;
        let open = if i == 0 { close } else { previous };
        candles.push(Candle::new(
            i as i64 * HOUR,
            open,
            open.max(close) + 0.1,
            open.min(close) - 0.1,
            close,
            1000.0,
        ));
        previous = close;
    }
    for i in 40..60 {
        candles.push(Candle::new(i as i64 * HOUR, 110.0, 110.1, 109.9, 110.0, 1000.0));
    }
    candles
}

/// Flat series with two equal lows 20 bars apart on 1.5x volume.
pub fn double_bottom() -> Vec<Candle> {
    (0..60)
        .map(|i| {
            if i == 20 || i == 40 {
                Candle::new(i as i64 * HOUR, 100.0, 101.0, 95.0, 100.0, 1500.0)
            } else {
                Candle::new(i as i64 * HOUR, 100.0, 101.0, 99.0, 100.0, 1000.0)
            }
        })
        .collect()
}

pub fn from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64 * HOUR, c, c, c, c, 1000.0))
        .collect()
}
