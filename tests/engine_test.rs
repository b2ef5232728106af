//! Integration tests for the signal engine facade

mod common;

use common::*;
use confluence::config::EngineConfig;
use confluence::services::SignalEngine;
use confluence::{Candle, Direction, EngineError, SignalStage, Timeframe};

fn engine() -> std::sync::Arc<SignalEngine> {
    SignalEngine::new(EngineConfig::default())
}

#[tokio::test]
async fn test_short_series_returns_neutral_fallback() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, uptrend(10)).unwrap();

    let signal = engine.compute("BTC", Timeframe::OneHour, 100.0).await.unwrap();

    assert_eq!(signal.direction, Direction::Neutral);
    assert_eq!(signal.stage, SignalStage::NoSignal);
    assert_eq!(signal.confidence, 50.0);
    assert!((signal.stop_loss - 98.0).abs() < 1e-9);
    assert!((signal.take_profit - 104.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_weekly_and_monthly_need_fewer_bars() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneWeek, uptrend(20)).unwrap();
    engine.update("BTC", Timeframe::OneMonth, uptrend(12)).unwrap();
    engine.update("BTC", Timeframe::OneDay, uptrend(20)).unwrap();

    let weekly = engine.compute("BTC", Timeframe::OneWeek, 130.0).await.unwrap();
    let monthly = engine.compute("BTC", Timeframe::OneMonth, 118.0).await.unwrap();
    let daily = engine.compute("BTC", Timeframe::OneDay, 130.0).await.unwrap();

    assert_eq!(weekly.stage, SignalStage::Final);
    assert_eq!(monthly.stage, SignalStage::Final);
    assert_eq!(daily.stage, SignalStage::NoSignal);
}

#[tokio::test]
async fn test_scored_signals_respect_bounds() {
    let engine = engine();
    let series: [(&str, Vec<Candle>); 3] = [
        ("UP", uptrend(80)),
        ("DOWN", downtrend(80)),
        ("FLAT", sideways(80)),
    ];

    for (symbol, candles) in series.iter() {
        let price = candles.last().unwrap().close;
        for timeframe in Timeframe::ALL {
            engine.update(symbol, timeframe, candles.clone()).unwrap();
            let signal = engine.compute(symbol, timeframe, price).await.unwrap();

            assert!((30.0..=95.0).contains(&signal.confidence), "{:?}", signal);
            assert!((25.0..=95.0).contains(&signal.success_probability), "{:?}", signal);
            assert!(signal.indicators.supports.len() <= 3);
            assert!(signal.indicators.resistances.len() <= 3);

            match signal.direction {
                Direction::Long => {
                    assert!(signal.stop_loss < price && signal.take_profit > price);
                }
                Direction::Short => {
                    assert!(signal.stop_loss > price && signal.take_profit < price);
                }
                Direction::Neutral => {
                    assert!((signal.stop_loss - price * 0.98).abs() < 1e-9);
                    assert!((signal.take_profit - price * 1.04).abs() < 1e-9);
                }
            }
        }
    }
}

#[tokio::test]
async fn test_compute_is_idempotent() {
    let engine = engine();
    engine.update("ETH", Timeframe::FourHours, rise_then_flat()).unwrap();

    let first = engine.compute("ETH", Timeframe::FourHours, 110.0).await.unwrap();
    let second = engine.compute("ETH", Timeframe::FourHours, 110.0).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.timestamp, 59 * HOUR);
}

#[tokio::test]
async fn test_rise_then_flat_scenario() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, rise_then_flat()).unwrap();

    let signal = engine.compute("BTC", Timeframe::OneHour, 110.0).await.unwrap();

    assert!(signal.indicators.rsi > 70.0, "RSI {}", signal.indicators.rsi);
    assert!(signal.indicators.adx.adx > 25.0);
    assert!(signal.indicators.adx.plus_di > signal.indicators.adx.minus_di);
    assert_eq!(signal.direction, Direction::Long);
    assert!(signal.confidence > 60.0, "confidence {}", signal.confidence);
    assert_eq!(signal.stage, SignalStage::Final);
}

#[tokio::test]
async fn test_double_bottom_reported_on_signal() {
    let engine = engine();
    engine.update("SOL", Timeframe::OneHour, double_bottom()).unwrap();

    let signal = engine.compute("SOL", Timeframe::OneHour, 100.0).await.unwrap();
    let support = signal.indicators.supports.first().expect("support level");

    assert_eq!(support.price, 95.0);
    assert_eq!(support.touches, 2);
}

#[tokio::test]
async fn test_harmonization_never_lowers_agreeing_confidence() {
    let engine = engine();
    let candles = uptrend(60);
    let price = candles[59].close;

    let mut independent = Vec::new();
    for timeframe in Timeframe::ALL {
        engine.update("BTC", timeframe, candles.clone()).unwrap();
        independent.push(engine.compute("BTC", timeframe, price).await.unwrap());
    }
    assert!(independent.iter().all(|s| s.direction == Direction::Long));

    let result = engine.compute_all("BTC", price).await.unwrap();
    assert_eq!(result.dominant.direction, Direction::Long);
    assert_eq!(result.signals.len(), Timeframe::ALL.len());

    for before in &independent {
        let after = &result.signals[&before.timeframe];
        assert_eq!(after.direction, Direction::Long);
        assert!(after.confidence >= before.confidence);
        assert_eq!(after.stage, SignalStage::Final);
    }
}

#[tokio::test]
async fn test_compute_all_publishes_and_keeps_fallbacks() {
    let engine = engine();
    let mut updates = engine.subscribe();
    engine.update("BTC", Timeframe::OneDay, uptrend(60)).unwrap();

    let result = engine.compute_all("btc", 130.5).await.unwrap();
    let published = updates.recv().await.unwrap();

    assert_eq!(published, result);
    assert_eq!(result.symbol, "BTC");
    assert_eq!(result.signals[&Timeframe::OneDay].stage, SignalStage::Final);
    // Timeframes without candles stay neutral fallbacks and abstain from the vote.
    let hourly = &result.signals[&Timeframe::OneHour];
    assert_eq!(hourly.stage, SignalStage::NoSignal);
    assert_eq!(hourly.direction, Direction::Neutral);
    assert_eq!(result.dominant.dominance, 1.0);
}

#[tokio::test]
async fn test_concurrent_requests_agree() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, uptrend(60)).unwrap();

    let (a, b) = tokio::join!(
        engine.compute("BTC", Timeframe::OneHour, 130.5),
        engine.compute("BTC", Timeframe::OneHour, 130.5)
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(engine.stats().in_flight, 0);
}

#[tokio::test]
async fn test_update_replaces_series() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, uptrend(60)).unwrap();
    let before = engine.compute("BTC", Timeframe::OneHour, 150.0).await.unwrap();

    let falling = downtrend(70);
    let price = falling[69].close;
    let version = engine.update("BTC", Timeframe::OneHour, falling).unwrap();
    assert_eq!(version, 2);

    let after = engine.compute("BTC", Timeframe::OneHour, price).await.unwrap();
    assert_ne!(before.timestamp, after.timestamp);
    assert_eq!(after.direction, Direction::Short);
    assert_eq!(engine.last_signal("btc", Timeframe::OneHour), Some(after));
}

#[tokio::test]
async fn test_outcomes_drive_adaptive_weight() {
    let engine = engine();
    for _ in 0..7 {
        engine.report_outcome("BTC", Timeframe::OneHour, true).unwrap();
    }
    let mut record = None;
    for _ in 0..3 {
        record = Some(engine.report_outcome("BTC", Timeframe::OneHour, false).unwrap());
    }
    let record = record.unwrap();

    assert_eq!(record.correct_count, 7);
    assert_eq!(record.total_count, 10);
    assert!((record.win_rate - 70.0).abs() < 1e-9);
    assert!((record.adaptive_weight - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_poor_accuracy_lowers_confidence() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, uptrend(60)).unwrap();
    let baseline = engine.compute("BTC", Timeframe::OneHour, 130.5).await.unwrap();

    for _ in 0..5 {
        engine.report_outcome("BTC", Timeframe::OneHour, false).unwrap();
    }
    let penalized = engine.compute("BTC", Timeframe::OneHour, 130.5).await.unwrap();

    assert!(penalized.confidence < baseline.confidence);
    assert_eq!(penalized.direction, baseline.direction);
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let engine = engine();

    assert!(matches!(
        engine.compute("", Timeframe::OneHour, 100.0).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(engine.compute("BTC", Timeframe::OneHour, 0.0).await.is_err());
    assert!(engine.compute("BTC", Timeframe::OneHour, -5.0).await.is_err());
    assert!(engine.compute("BTC", Timeframe::OneHour, f64::NAN).await.is_err());
    assert!(engine.compute_all("BTC", f64::INFINITY).await.is_err());

    let mut unsorted = uptrend(5);
    unsorted.swap(1, 2);
    assert!(engine.update("BTC", Timeframe::OneHour, unsorted).is_err());

    let mut duplicate = uptrend(5);
    duplicate[3].time = duplicate[2].time;
    assert!(engine.update("BTC", Timeframe::OneHour, duplicate).is_err());

    let mut non_finite = uptrend(5);
    non_finite[0].volume = f64::NAN;
    assert!(engine.update("BTC", Timeframe::OneHour, non_finite).is_err());

    assert!(engine.report_outcome(" ", Timeframe::OneHour, true).is_err());
}

#[tokio::test]
async fn test_stats_and_invalidate() {
    let engine = engine();
    engine.update("BTC", Timeframe::OneHour, uptrend(60)).unwrap();
    engine.update("ETH", Timeframe::OneHour, uptrend(60)).unwrap();
    engine.report_outcome("BTC", Timeframe::OneHour, true).unwrap();
    engine.compute("BTC", Timeframe::OneHour, 130.5).await.unwrap();

    let stats = engine.stats();
    assert_eq!(stats.tracked_symbols, 2);
    assert_eq!(stats.accuracy_records, 1);
    assert!(stats.cache_size > 0);
    assert_eq!(stats.in_flight, 0);

    engine.invalidate("BTC");
    assert_eq!(engine.stats().cache_size, 0);
    assert!(engine.last_signal("BTC", Timeframe::OneHour).is_none());
}
