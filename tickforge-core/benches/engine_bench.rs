//! Criterion benchmarks for TickForge hot paths.
//!
//! Benchmarks:
//! 1. Tick loop (full replay through one engine, per strategy)
//! 2. Candle interpolation
//! 3. Indicators over a full history window
//! 4. Position maintenance (per-tick update and exit evaluation)

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tickforge_core::domain::{Candle, Direction, Signal, Tick};
use tickforge_core::feed::{interpolate_candle, HistoricalFeed, MarketDataSource};
use tickforge_core::indicators::{
    atr, bollinger_bands, classify_regime, rsi, velocity_series, PriceHistory, Regime,
};
use tickforge_core::risk::PositionManager;
use tickforge_core::strategy::{ScalpingParams, StrategyConfig};
use tickforge_core::{Engine, EngineConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Candle::new(start + Duration::minutes(i as i64), open, close + 1.5, close - 1.5, close, 600.0)
        })
        .collect()
}

fn replay(candles: &[Candle], strategy: &StrategyConfig) -> usize {
    let mut engine = Engine::from_config("BENCH", EngineConfig::default(), strategy).unwrap();
    let mut feed = HistoricalFeed::new("BENCH", candles, Duration::seconds(2), Duration::seconds(60)).unwrap();
    while let Some(tick) = feed.get_next_tick() {
        engine.on_tick(&tick);
    }
    engine.trades().len()
}

// ── 1. Tick Loop ─────────────────────────────────────────────────────

fn bench_tick_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_loop");

    for &candle_count in &[100, 500, 1_000] {
        let candles = make_candles(candle_count);
        for strategy in [StrategyConfig::Momentum, StrategyConfig::Scalping(ScalpingParams::default())] {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), candle_count * 30),
                &candles,
                |b, candles| b.iter(|| replay(black_box(candles), &strategy)),
            );
        }
    }

    group.finish();
}

// ── 2. Interpolation ─────────────────────────────────────────────────

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");
    let candles = make_candles(1_000);

    group.bench_function("1000_candles_30_ticks", |b| {
        b.iter(|| {
            candles
                .iter()
                .map(|candle| interpolate_candle("BENCH", black_box(candle), 30, Duration::seconds(2)).len())
                .sum::<usize>()
        });
    });

    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let mut history = PriceHistory::new(500);
    for i in 0..500 {
        let price = 100.0 + (i as f64 * 0.05).sin() * 5.0;
        history.push(price, price + 0.2, price - 0.2, 1.0);
    }

    group.bench_function("atr_30", |b| {
        b.iter(|| atr(black_box(history.highs()), history.lows(), history.prices(), 30));
    });
    group.bench_function("rsi_14", |b| b.iter(|| rsi(black_box(history.prices()), 14)));
    group.bench_function("velocity_series_15x6", |b| {
        b.iter(|| velocity_series(black_box(history.prices()), 15, 6));
    });
    group.bench_function("bollinger_20", |b| {
        b.iter(|| bollinger_bands(black_box(history.prices()), 20, 2.0));
    });
    group.bench_function("classify_regime_20", |b| {
        b.iter(|| classify_regime(black_box(history.prices()), Some(0.4), 20));
    });

    group.finish();
}

// ── 4. Position Maintenance ──────────────────────────────────────────

fn bench_position_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_update");
    let config = EngineConfig::default();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let signal = Signal::new(Direction::Long, &Tick::new("BENCH", start, 100.0, 1.0), "bench");
    let prices: Vec<f64> = (0..1_000).map(|i| 100.0 + (i as f64 * 0.01).sin() * 0.5).collect();

    group.bench_function("1000_updates", |b| {
        b.iter(|| {
            let mut pm = PositionManager::new(&config);
            let plan = pm.plan_entry(&signal, 10_000.0, Some(0.5)).unwrap();
            pm.open(plan, start).unwrap();
            for &price in &prices {
                pm.update(black_box(price), Regime::Ranging);
                black_box(pm.evaluate_exit(price));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tick_loop,
    bench_interpolation,
    bench_indicators,
    bench_position_update,
);
criterion_main!(benches);
