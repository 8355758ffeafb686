//! End-to-end sweep scenarios.
//!
//! Tests:
//! 1. Flat series, single entry, end-of-data exit
//! 2. Take profit reached before the stop loss
//! 3. Kill switch after repeated liquidations
//! 4. Lookback longer than the elapsed bars
//! 5. Row-major combination order across symbols and indicators
//! 6. Sequential and parallel runs are identical; replays are identical
//! 7. Abort flag and summary buffer exhaustion
//! 8. Properties over random seeds: determinism, nothing recorded after a halt

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use proptest::prelude::*;

use leverlab_core::buffer::RecordError;
use leverlab_core::domain::{
    CandleBody, OrderSettings, OrderSettingsArrays, OrderStatus, OrderStatusInfo, OrderType,
    SizeType, StaticVariables,
};
use leverlab_core::prices::{price_window, Bar, EntrySignals, Ohlc, PriceData};
use leverlab_runner::fingerprint::output_fingerprint;
use leverlab_runner::synthetic::{generate, SyntheticConfig};
use leverlab_runner::{SweepDriver, SweepError, SweepInputs};

// ── Helpers ──────────────────────────────────────────────────────────

fn inputs(bars: &[Bar], signals: &[usize]) -> SweepInputs {
    let prices = PriceData::from_symbols(vec![Ohlc::from_bars(bars)]).unwrap();
    let column = (0..bars.len()).map(|i| signals.contains(&i)).collect();
    let entries = EntrySignals::from_columns(vec![column]).unwrap();
    SweepInputs::new(prices, entries).unwrap()
}

fn grid(settings: OrderSettings) -> OrderSettingsArrays {
    OrderSettingsArrays::from_settings([settings])
}

fn keep_everything() -> StaticVariables {
    StaticVariables {
        total_trade_filter: 0,
        gains_pct_filter: f64::NEG_INFINITY,
        upside_filter: -1.0,
        ..StaticVariables::default()
    }
}

fn sequential(statics: StaticVariables) -> SweepDriver {
    SweepDriver::new(statics).with_parallelism(false)
}

// ── 1. Flat series ───────────────────────────────────────────────────

#[test]
fn flat_series_single_entry_then_end_of_data() {
    let bars = vec![Bar::new(100.0, 100.0, 100.0, 100.0); 6];
    let statics = StaticVariables {
        close_at_end_of_data: true,
        ..keep_everything()
    };
    let out = sequential(statics)
        .run(&inputs(&bars, &[0]), &grid(OrderSettings::default()))
        .unwrap();

    let entries: Vec<_> = out
        .order_records
        .iter()
        .filter(|r| r.order_type == OrderType::LongEntry)
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].fees_paid > 0.0);

    let exit = out.order_records.last().unwrap();
    assert_eq!(exit.order_type, OrderType::LongExit);
    assert_eq!(exit.order_status_info, OrderStatusInfo::EndOfData);
    assert_eq!(exit.bar_index, 5);
    assert!(exit.realized_pnl < 0.0);

    assert_eq!(out.strategy_records.filled(), 1);
    let summary = out.strategy_records.as_slice()[0];
    assert_eq!(summary.total_trades, 1);
    assert!(summary.gains_pct < 0.0);
}

// ── 2. Take profit ───────────────────────────────────────────────────

#[test]
fn take_profit_before_stop_loss() {
    let bars = [
        Bar::new(100.0, 100.5, 99.5, 100.0),
        Bar::new(100.0, 102.5, 99.8, 102.0),
        Bar::new(102.0, 102.2, 97.0, 97.5),
    ];
    let settings = OrderSettings {
        tp_pct: Some(0.02),
        ..OrderSettings::default()
    };
    let out = sequential(keep_everything())
        .run(&inputs(&bars, &[0]), &grid(settings))
        .unwrap();

    assert_eq!(out.order_records.len(), 2);
    let exit = out.order_records[1];
    assert_eq!(exit.bar_index, 1);
    assert_eq!(exit.order_type, OrderType::LongTakeProfit);
    assert_eq!(exit.order_status_info, OrderStatusInfo::TakeProfit);
    assert!((exit.price - 102.0).abs() < 1e-9);
    assert!(exit.realized_pnl > 0.0);

    let summary = out.strategy_records.as_slice()[0];
    assert_eq!(summary.wins, 1);
    assert!(summary.gains_pct > 0.0);
}

// ── 3. Kill switch ───────────────────────────────────────────────────

#[test]
fn kill_switch_stops_new_entries() {
    // every bar opens at the previous close and wicks 2.5% down
    let mut open = 100.0;
    let bars: Vec<Bar> = (0..10)
        .map(|_| {
            let bar = Bar::new(open, open, open * 0.975, open * 0.98);
            open *= 0.98;
            bar
        })
        .collect();
    let statics = StaticVariables {
        size_type: SizeType::PercentOfAccount,
        ..keep_everything()
    };
    let settings = OrderSettings {
        leverage: 50.0,
        size_pct: Some(48.0),
        sl_pct: Some(0.018),
        max_equity_risk_pct: None,
        max_equity_risk_value: Some(1_000.0),
        ..OrderSettings::default()
    };
    let all_bars: Vec<usize> = (0..10).collect();
    let out = sequential(statics)
        .run(&inputs(&bars, &all_bars), &grid(settings))
        .unwrap();

    assert_eq!(out.halted, 1);
    let halt_pos = out
        .order_records
        .iter()
        .position(|r| r.order_status == OrderStatus::Halted)
        .expect("kill switch record");
    let halt = out.order_records[halt_pos];
    assert_eq!(halt.order_status_info, OrderStatusInfo::KillSwitch);
    assert!(halt.available_balance < 5.0);

    // the halt is the last record: no entries afterwards
    assert_eq!(halt_pos, out.order_records.len() - 1);
    assert!(out.order_records[..halt_pos]
        .iter()
        .filter(|r| r.order_type == OrderType::LongLiquidation)
        .count()
        >= 1);
    assert!((halt.bar_index as usize) < bars.len());
}

// ── 4. Short history ─────────────────────────────────────────────────

#[test]
fn lookback_longer_than_history_clamps_to_start() {
    let bars = [
        Bar::new(96.0, 97.0, 95.0, 96.5),
        Bar::new(96.5, 98.0, 96.0, 97.5),
        Bar::new(100.0, 101.0, 99.0, 100.5),
        Bar::new(100.5, 101.5, 100.0, 101.0),
    ];
    let settings = OrderSettings {
        sl_based_on: Some(CandleBody::Low),
        sl_based_on_lookback: 10,
        sl_pct: None,
        ..OrderSettings::default()
    };

    let ohlc = Ohlc::from_bars(&bars);
    let window = price_window(2, &ohlc, &settings);
    assert_eq!(window.start(), 0);
    assert_eq!(window.len(), 3);

    let out = sequential(keep_everything())
        .run(&inputs(&bars, &[2]), &grid(settings))
        .unwrap();
    let entry = out.order_records[0];
    assert_eq!(entry.bar_index, 2);
    assert!((entry.sl_price - 95.0).abs() < 1e-9);
    assert!((entry.sl_pct - 0.05).abs() < 1e-9);
}

// ── 5. Combination order ─────────────────────────────────────────────

#[test]
fn summaries_follow_row_major_order() {
    let cfg = SyntheticConfig {
        symbols: 2,
        bars: 120,
        indicators_per_symbol: 2,
        entry_probability: 0.2,
        ..SyntheticConfig::default()
    };
    let inputs = generate(&cfg).unwrap();
    let grid = OrderSettingsArrays::from_settings([
        OrderSettings::default(),
        OrderSettings {
            leverage: 3.0,
            ..OrderSettings::default()
        },
        OrderSettings {
            sl_pct: Some(0.01),
            tp_pct: Some(0.03),
            ..OrderSettings::default()
        },
    ]);
    let statics = StaticVariables {
        close_at_end_of_data: true,
        ..keep_everything()
    };
    let out = sequential(statics).run(&inputs, &grid).unwrap();

    assert_eq!(out.combinations_run, 12);
    assert_eq!(out.strategy_records.filled(), 12);
    for (flat, rec) in out.strategy_records.as_slice().iter().enumerate() {
        assert_eq!(rec.symbol_idx as usize, flat / 6);
        assert_eq!(rec.indicator_settings_idx as usize, (flat / 3) % 2);
        assert_eq!(rec.order_settings_idx as usize, flat % 3);
    }
    for (s, r) in out
        .settings_records
        .as_slice()
        .iter()
        .zip(out.strategy_records.as_slice())
    {
        assert_eq!(s.order_settings_idx, r.order_settings_idx);
        assert_eq!(s.leverage, grid.get(s.order_settings_idx as usize).leverage);
    }
    let mut last = None;
    for r in &out.order_records {
        let key = (r.symbol_idx, r.indicator_settings_idx, r.order_settings_idx);
        if let Some(prev) = last {
            assert!(key >= prev, "order records out of combination order");
        }
        last = Some(key);
    }
}

// ── 6. Determinism ───────────────────────────────────────────────────

fn determinism_grid() -> OrderSettingsArrays {
    let mut grid = OrderSettingsArrays::with_capacity(8);
    for lev in [1.0, 5.0] {
        for trail in [None, Some(0.01)] {
            for basis in [None, Some(CandleBody::Low)] {
                grid.push(OrderSettings {
                    leverage: lev,
                    sl_based_on: basis,
                    sl_based_on_lookback: 5,
                    trail_sl_based_on: trail.map(|_| CandleBody::High),
                    trail_sl_by_pct: trail,
                    trail_sl_when_pct_from_avg_entry: trail,
                    ..OrderSettings::default()
                });
            }
        }
    }
    grid
}

#[test]
fn parallel_matches_sequential_and_replays() {
    let inputs = generate(&SyntheticConfig {
        symbols: 3,
        bars: 300,
        indicators_per_symbol: 2,
        entry_probability: 0.1,
        seed: 11,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let grid = determinism_grid();
    let statics = keep_everything();

    let seq = sequential(statics.clone()).run(&inputs, &grid).unwrap();
    let par = SweepDriver::new(statics.clone())
        .with_parallelism(true)
        .with_threads(Some(4))
        .run(&inputs, &grid)
        .unwrap();
    let replay = SweepDriver::new(statics).run(&inputs, &grid).unwrap();

    assert_eq!(seq.combinations_run, 3 * 2 * 8);
    assert_eq!(seq.order_records.len(), par.order_records.len());
    assert_eq!(seq.strategy_records, par.strategy_records);
    assert_eq!(output_fingerprint(&seq), output_fingerprint(&par));
    assert_eq!(output_fingerprint(&par), output_fingerprint(&replay));
}

#[test]
fn recording_off_drops_only_order_records() {
    let inputs = generate(&SyntheticConfig {
        bars: 200,
        entry_probability: 0.1,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let grid = determinism_grid();
    let on = sequential(keep_everything()).run(&inputs, &grid).unwrap();
    let off = sequential(keep_everything())
        .record_orders(false)
        .run(&inputs, &grid)
        .unwrap();
    assert!(off.order_records.is_empty());
    assert_eq!(on.strategy_records, off.strategy_records);
}

// ── 7. Abort and buffer exhaustion ───────────────────────────────────

#[test]
fn abort_flag_stops_the_sweep() {
    let inputs = generate(&SyntheticConfig::default()).unwrap();
    let abort = Arc::new(AtomicBool::new(true));
    let err = SweepDriver::new(keep_everything())
        .with_abort(abort)
        .run(&inputs, &determinism_grid())
        .unwrap_err();
    assert!(matches!(err, SweepError::Aborted { completed: 0, total: 8 }));
}

#[test]
fn undersized_summary_buffer_is_fatal() {
    let inputs = generate(&SyntheticConfig::default()).unwrap();
    let statics = StaticVariables {
        divide_records_array_size_by: 8.0,
        ..keep_everything()
    };
    let err = sequential(statics).run(&inputs, &determinism_grid()).unwrap_err();
    match err {
        SweepError::Records(RecordError::BufferExhausted { capacity, kind }) => {
            assert_eq!(capacity, 1);
            assert_eq!(kind, "StrategyRecord");
        }
        other => panic!("expected buffer exhaustion, got {other}"),
    }
}

#[test]
fn invalid_grid_rejected_before_running() {
    let inputs = generate(&SyntheticConfig::default()).unwrap();
    let bad = grid(OrderSettings {
        leverage: 0.5,
        ..OrderSettings::default()
    });
    let err = sequential(keep_everything()).run(&inputs, &bad).unwrap_err();
    assert!(matches!(err, SweepError::Config(_)));
}

// ── 8. Properties ────────────────────────────────────────────────────

fn aggressive_grid(leverage: f64) -> OrderSettingsArrays {
    OrderSettingsArrays::from_settings([0.01, 0.03].map(|sl| OrderSettings {
        leverage,
        max_equity_risk_pct: None,
        max_equity_risk_value: Some(1_000.0),
        size_pct: Some(0.9),
        sl_pct: Some(sl),
        tp_pct: Some(0.05),
        ..OrderSettings::default()
    }))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sweep_is_deterministic_and_halts_are_final(seed in 0u64..1_000, leverage in 1.0..50.0_f64) {
        let inputs = generate(&SyntheticConfig {
            symbols: 2,
            bars: 120,
            indicators_per_symbol: 2,
            seed,
            max_step: 0.05,
            entry_probability: 0.2,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let grid = aggressive_grid(leverage);
        let statics = StaticVariables {
            size_type: SizeType::PercentOfAccount,
            ..keep_everything()
        };

        let seq = sequential(statics.clone()).run(&inputs, &grid).unwrap();
        let par = SweepDriver::new(statics).run(&inputs, &grid).unwrap();
        prop_assert_eq!(output_fingerprint(&seq), output_fingerprint(&par));

        let mut halts = 0;
        for (i, record) in seq.order_records.iter().enumerate() {
            prop_assert!(record.position >= 0.0 && record.position.is_finite());
            if record.order_status == OrderStatus::Halted {
                halts += 1;
                let next_same = seq.order_records[i + 1..]
                    .iter()
                    .any(|r| r.combination() == record.combination());
                prop_assert!(!next_same, "record after halt in {:?}", record.combination());
            }
        }
        prop_assert_eq!(halts, seq.halted);
    }
}
