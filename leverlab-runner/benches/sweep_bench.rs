//! Criterion benchmarks for the sweep hot loop.
//!
//! Run with: `cargo bench -p leverlab-runner`
//!
//! Benchmarks:
//! - Sequential vs parallel sweep over a synthetic grid
//! - Order recording on vs off
//! - Grid expansion from the TOML representation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use leverlab_core::domain::{CandleBody, OrderSettings, OrderSettingsArrays, StaticVariables};
use leverlab_runner::config::OrderSettingsGrid;
use leverlab_runner::synthetic::{generate, SyntheticConfig};
use leverlab_runner::SweepDriver;

fn bench_grid(n: usize) -> OrderSettingsArrays {
    OrderSettingsArrays::from_settings((0..n).map(|i| OrderSettings {
        leverage: 1.0 + (i % 10) as f64,
        sl_pct: Some(0.005 + (i % 5) as f64 * 0.005),
        tp_pct: (i % 2 == 0).then_some(0.03),
        trail_sl_based_on: Some(CandleBody::High),
        trail_sl_by_pct: Some(0.01),
        trail_sl_when_pct_from_avg_entry: Some(0.01),
        ..OrderSettings::default()
    }))
}

fn bench_sweep(c: &mut Criterion) {
    let inputs = generate(&SyntheticConfig {
        symbols: 2,
        bars: 2_000,
        indicators_per_symbol: 2,
        entry_probability: 0.05,
        ..SyntheticConfig::default()
    })
    .expect("synthetic inputs");
    let statics = StaticVariables::default();
    let mut group = c.benchmark_group("sweep");
    group.sample_size(10);

    for n in [10usize, 50] {
        let grid = bench_grid(n);
        group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
            let driver = SweepDriver::new(statics.clone()).with_parallelism(false);
            b.iter(|| driver.run(black_box(&inputs), &grid).expect("sweep"))
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
            let driver = SweepDriver::new(statics.clone());
            b.iter(|| driver.run(black_box(&inputs), &grid).expect("sweep"))
        });
        group.bench_with_input(BenchmarkId::new("parallel_no_orders", n), &n, |b, _| {
            let driver = SweepDriver::new(statics.clone()).record_orders(false);
            b.iter(|| driver.run(black_box(&inputs), &grid).expect("sweep"))
        });
    }
    group.finish();
}

fn bench_grid_expansion(c: &mut Criterion) {
    let grid = OrderSettingsGrid {
        leverage: (1..=10).map(f64::from).collect(),
        sl_pct: vec![0.5, 1.0, 1.5, 2.0, 3.0],
        tp_pct: vec![f64::NAN, 2.0, 4.0, 6.0],
        trail_sl_by_pct: vec![f64::NAN, 0.5, 1.0],
        ..OrderSettingsGrid::default()
    };
    c.bench_function("grid_cartesian_600", |b| {
        b.iter(|| black_box(&grid).cartesian().expect("grid"))
    });
}

criterion_group!(benches, bench_sweep, bench_grid_expansion);
criterion_main!(benches);
