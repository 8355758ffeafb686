//! BLAKE3 fingerprints of sweep inputs and outputs.
//!
//! Floats are hashed by bit pattern, so two runs match only when every field
//! of every record is bit-identical. Used to check that sequential and
//! parallel runs, and repeated runs, agree.

use std::fmt;

use serde::{Deserialize, Serialize};

use leverlab_core::domain::{OrderRecord, OrderSettingsRecord, StrategyRecord};

use crate::sweep::{SweepInputs, SweepOutput};

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

trait Digest {
    fn digest(&self, h: &mut blake3::Hasher);
}

fn f(h: &mut blake3::Hasher, v: f64) {
    h.update(&v.to_bits().to_le_bytes());
}

fn u(h: &mut blake3::Hasher, v: u32) {
    h.update(&v.to_le_bytes());
}

impl Digest for OrderRecord {
    fn digest(&self, h: &mut blake3::Hasher) {
        for id in [self.symbol_idx, self.indicator_settings_idx, self.order_settings_idx, self.bar_index] {
            u(h, id);
        }
        h.update(&[
            u8::from(self.order_type),
            u8::from(self.order_status),
            u8::from(self.order_status_info),
            u8::from(self.moved_sl_to_be),
        ]);
        for v in [
            self.price,
            self.average_entry,
            self.position,
            self.size_value,
            self.leverage,
            self.fees_paid,
            self.realized_pnl,
            self.pct_chg_trade,
            self.sl_price,
            self.sl_pct,
            self.tp_price,
            self.tp_pct,
            self.liq_price,
            self.available_balance,
            self.equity,
        ] {
            f(h, v);
        }
    }
}

impl Digest for StrategyRecord {
    fn digest(&self, h: &mut blake3::Hasher) {
        for v in [
            self.symbol_idx,
            self.indicator_settings_idx,
            self.order_settings_idx,
            self.total_trades,
            self.wins,
            self.losses,
            self.break_evens,
        ] {
            u(h, v);
        }
        for v in [
            self.win_rate,
            self.gains_pct,
            self.to_the_upside,
            self.total_fees,
            self.total_pnl,
            self.ending_equity,
        ] {
            f(h, v);
        }
    }
}

impl Digest for OrderSettingsRecord {
    fn digest(&self, h: &mut blake3::Hasher) {
        for v in [
            self.symbol_idx,
            self.indicator_settings_idx,
            self.order_settings_idx,
            self.sl_based_on_lookback,
        ] {
            u(h, v);
        }
        h.update(&[
            self.sl_based_on as u8,
            self.sl_to_be_based_on as u8,
            self.sl_to_be_zero_or_entry,
            self.trail_sl_based_on as u8,
        ]);
        for v in [
            self.leverage,
            self.max_equity_risk_pct,
            self.max_equity_risk_value,
            self.risk_reward,
            self.size_pct,
            self.size_value,
            self.sl_based_on_add_pct,
            self.sl_pct,
            self.sl_to_be_when_pct_from_avg_entry,
            self.tp_pct,
            self.trail_sl_by_pct,
            self.trail_sl_when_pct_from_avg_entry,
        ] {
            f(h, v);
        }
    }
}

fn digest_all<T: Digest>(h: &mut blake3::Hasher, tag: &[u8], records: &[T]) {
    h.update(tag);
    h.update(&(records.len() as u64).to_le_bytes());
    for r in records {
        r.digest(h);
    }
}

/// Fingerprint of every record a sweep produced, in output order.
pub fn output_fingerprint(output: &SweepOutput) -> Fingerprint {
    let mut h = blake3::Hasher::new();
    digest_all(&mut h, b"orders", &output.order_records);
    digest_all(&mut h, b"strategies", output.strategy_records.as_slice());
    digest_all(&mut h, b"settings", output.settings_records.as_slice());
    Fingerprint::from_hasher(&h)
}

/// Fingerprint of the price and entry-signal inputs.
pub fn dataset_fingerprint(inputs: &SweepInputs) -> Fingerprint {
    let mut h = blake3::Hasher::new();
    h.update(&(inputs.num_symbols() as u64).to_le_bytes());
    h.update(&(inputs.bars() as u64).to_le_bytes());
    for ohlc in inputs.prices().symbols() {
        for series in [&ohlc.open, &ohlc.high, &ohlc.low, &ohlc.close] {
            for &v in series {
                f(&mut h, v);
            }
        }
    }
    let columns = inputs.entries().num_columns();
    let per_symbol = inputs.indicators_per_symbol();
    for col in 0..columns {
        let signals = inputs.entries().column(col / per_symbol, col % per_symbol, per_symbol);
        let bytes: Vec<u8> = signals.iter().map(|&s| u8::from(s)).collect();
        h.update(&bytes);
    }
    Fingerprint::from_hasher(&h)
}
