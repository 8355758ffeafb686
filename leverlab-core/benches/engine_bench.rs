//! Criterion benchmarks for the engine hot paths.
//!
//! Benchmarks:
//! 1. Single-combination bar loop (entries, stops, trailing)
//! 2. Price window extraction with a long lookback
//! 3. Settings resolver over a columnar grid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use leverlab_core::buffer::RecordBuffer;
use leverlab_core::domain::{
    AccountState, CandleBody, CombinationId, OrderResult, OrderSettings, OrderSettingsArrays,
    StaticVariables,
};
use leverlab_core::engine::{
    apply_adjustment, check_stops, process_order, OrderContext, OrderRequest, StopDecision,
};
use leverlab_core::prices::{price_window, Bar, Ohlc};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_ohlc(n: usize) -> Ohlc {
    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(open, close + 1.5, close - 1.5, close)
        })
        .collect();
    Ohlc::from_bars(&bars)
}

fn make_entries(n: usize) -> Vec<bool> {
    (0..n).map(|i| i % 17 == 0).collect()
}

fn trailing_settings() -> OrderSettings {
    OrderSettings {
        leverage: 5.0,
        sl_based_on: Some(CandleBody::Low),
        sl_based_on_lookback: 20,
        sl_based_on_add_pct: 0.002,
        trail_sl_based_on: Some(CandleBody::High),
        trail_sl_by_pct: Some(0.02),
        trail_sl_when_pct_from_avg_entry: Some(0.01),
        ..OrderSettings::default()
    }
}

fn run_one(statics: &StaticVariables, settings: OrderSettings, ohlc: &Ohlc, entries: &[bool]) -> f64 {
    let ctx = OrderContext::new(statics, settings, CombinationId::new(0, 0, 0));
    let mut account = AccountState::new(statics.equity);
    let mut result = OrderResult::new(statics.order_type);
    let mut writer = RecordBuffer::with_capacity(ohlc.len() * 2);
    let last = ohlc.len() - 1;
    for bar_index in 0..ohlc.len() {
        if account.is_depleted() {
            break;
        }
        if entries[bar_index] {
            let window = price_window(bar_index, ohlc, &settings);
            let _ = process_order(
                &ctx,
                &mut account,
                &mut result,
                OrderRequest::Entry { bar_index, window },
                &mut writer,
            );
        }
        if result.has_position() {
            match check_stops(&ctx, &result, ohlc.bar(bar_index), bar_index == last) {
                StopDecision::Hold => {}
                StopDecision::Exit {
                    price,
                    order_type,
                    info,
                } => {
                    let _ = process_order(
                        &ctx,
                        &mut account,
                        &mut result,
                        OrderRequest::Exit {
                            bar_index,
                            price,
                            order_type,
                            info,
                        },
                        &mut writer,
                    );
                }
                StopDecision::Adjust(adj) => {
                    let _ = apply_adjustment(&ctx, bar_index, &account, &mut result, adj, &mut writer);
                }
            }
        }
    }
    account.equity
}

// ── 1. Bar loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    let statics = StaticVariables::default();
    for &n in &[1_000usize, 10_000] {
        let ohlc = make_ohlc(n);
        let entries = make_entries(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| run_one(&statics, trailing_settings(), black_box(&ohlc), black_box(&entries)))
        });
    }
    group.finish();
}

// ── 2. Price window ─────────────────────────────────────────────────

fn bench_price_window(c: &mut Criterion) {
    let ohlc = make_ohlc(5_000);
    let settings = OrderSettings {
        sl_based_on: Some(CandleBody::Low),
        sl_based_on_lookback: 200,
        ..OrderSettings::default()
    };
    c.bench_function("price_window_lowest_200", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for bar in (0..5_000).step_by(7) {
                acc += price_window(black_box(bar), &ohlc, &settings).lowest(CandleBody::Low);
            }
            acc
        })
    });
}

// ── 3. Settings resolver ────────────────────────────────────────────

fn bench_resolver(c: &mut Criterion) {
    let grid = OrderSettingsArrays::from_settings((0..1_000).map(|i| OrderSettings {
        leverage: 1.0 + (i % 20) as f64,
        sl_pct: Some(0.005 + (i % 10) as f64 * 0.002),
        ..OrderSettings::default()
    }));
    c.bench_function("settings_resolver_1000", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for idx in 0..grid.len() {
                acc += grid.get(black_box(idx)).leverage;
            }
            acc
        })
    });
}

criterion_group!(benches, bench_bar_loop, bench_price_window, bench_resolver);
criterion_main!(benches);
