//! Criterion benchmarks for the per-tick hot paths.
//!
//! Benchmarks:
//! 1. Batch frame computation (single and multi-timeframe)
//! 2. Incremental extension, one candle per tick
//! 3. Signal classification over a computed frame

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use actionzone_core::config::HigherTimeframe;
use actionzone_core::domain::{Candle, Series, Timeframe};
use actionzone_core::{IndicatorFrame, Preset, SignalFrame, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let base = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Candle::new(
                base + chrono::Duration::hours(4 * i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000.0 + (i % 500) as f64,
            )
        })
        .collect()
}

fn make_series(n: usize) -> Series {
    Series::from_candles("BENCH/USDT", Timeframe::FOUR_HOURS, make_candles(n)).unwrap()
}

fn single_config() -> StrategyConfig {
    StrategyConfig {
        timeframe: Timeframe::FOUR_HOURS,
        ..Preset::ActionZone.config()
    }
}

fn multi_config() -> StrategyConfig {
    StrategyConfig {
        higher_timeframe: Some(HigherTimeframe { multiplier: 6 }),
        ..single_config()
    }
}

// ── 1. Batch ─────────────────────────────────────────────────────────

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_compute");
    for n in [1_000, 10_000] {
        let series = make_series(n);
        let single = single_config();
        let multi = multi_config();
        group.bench_with_input(BenchmarkId::new("single", n), &series, |b, s| {
            b.iter(|| IndicatorFrame::compute(black_box(s), &single).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("multi", n), &series, |b, s| {
            b.iter(|| IndicatorFrame::compute(black_box(s), &multi).unwrap())
        });
    }
    group.finish();
}

// ── 2. Incremental ───────────────────────────────────────────────────

fn bench_extend(c: &mut Criterion) {
    let config = multi_config();
    let candles = make_candles(5_000);
    let history: Vec<Candle> = candles[..4_000].to_vec();
    let ticks: Vec<Candle> = candles[4_000..].to_vec();

    c.bench_function("frame_extend_1000_ticks", |b| {
        b.iter(|| {
            let mut series =
                Series::from_candles("BENCH/USDT", Timeframe::FOUR_HOURS, history.iter().copied())
                    .unwrap();
            let mut frame = IndicatorFrame::compute(&series, &config).unwrap();
            for candle in &ticks {
                series.push(*candle).unwrap();
                frame.extend(&series, &config).unwrap();
            }
            black_box(frame.len())
        })
    });
}

// ── 3. Classification ────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let config = multi_config();
    let series = make_series(10_000);
    let frame = IndicatorFrame::compute(&series, &config).unwrap();

    c.bench_function("signal_classify_10000", |b| {
        b.iter(|| SignalFrame::classify(black_box(&series), black_box(&frame)))
    });
}

criterion_group!(benches, bench_batch, bench_extend, bench_classify);
criterion_main!(benches);
