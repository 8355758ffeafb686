//! Export — CSV record tables and a JSON run summary.
//!
//! - **CSV**: order events, strategy summaries, settings echo. Codes are written
//!   as their integer values, disabled settings as `NaN`.
//! - **JSON**: `summary.json` with run metadata, fingerprints and the best rows.
//!
//! The summary carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leverlab_core::domain::{
    OrderRecord, OrderSettingsRecord, Side, StaticVariables, StrategyRecord,
};

use crate::fingerprint::{dataset_fingerprint, output_fingerprint};
use crate::sweep::{SweepInputs, SweepOutput};

/// Current schema version of `summary.json`.
pub const SCHEMA_VERSION: u32 = 1;

/// Number of top rows (by `gains_pct`) kept in the summary.
pub const TOP_N: usize = 10;

pub const ORDER_COLUMNS: [&str; 23] = [
    "symbol_idx",
    "indicator_settings_idx",
    "order_settings_idx",
    "bar_index",
    "order_type",
    "order_status",
    "order_status_info",
    "price",
    "average_entry",
    "position",
    "size_value",
    "leverage",
    "fees_paid",
    "realized_pnl",
    "pct_chg_trade",
    "sl_price",
    "sl_pct",
    "tp_price",
    "tp_pct",
    "liq_price",
    "moved_sl_to_be",
    "available_balance",
    "equity",
];

pub const STRATEGY_COLUMNS: [&str; 13] = [
    "symbol_idx",
    "indicator_settings_idx",
    "order_settings_idx",
    "total_trades",
    "wins",
    "losses",
    "break_evens",
    "win_rate",
    "gains_pct",
    "to_the_upside",
    "total_fees",
    "total_pnl",
    "ending_equity",
];

pub const SETTINGS_COLUMNS: [&str; 20] = [
    "symbol_idx",
    "indicator_settings_idx",
    "order_settings_idx",
    "leverage",
    "max_equity_risk_pct",
    "max_equity_risk_value",
    "risk_reward",
    "size_pct",
    "size_value",
    "sl_based_on",
    "sl_based_on_lookback",
    "sl_based_on_add_pct",
    "sl_pct",
    "sl_to_be_based_on",
    "sl_to_be_zero_or_entry",
    "sl_to_be_when_pct_from_avg_entry",
    "tp_pct",
    "trail_sl_based_on",
    "trail_sl_by_pct",
    "trail_sl_when_pct_from_avg_entry",
];

// ─── CSV export ─────────────────────────────────────────────────────

/// Header row plus one serialized row per record. The header is written
/// even when there are no records.
fn records_csv<T: Serialize>(columns: &[&str], records: &[T]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(columns)?;
    for r in records {
        wtr.serialize(r)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_orders_csv(records: &[OrderRecord]) -> Result<String> {
    records_csv(&ORDER_COLUMNS, records)
}

pub fn export_strategies_csv(records: &[StrategyRecord]) -> Result<String> {
    records_csv(&STRATEGY_COLUMNS, records)
}

pub fn export_settings_csv(records: &[OrderSettingsRecord]) -> Result<String> {
    records_csv(&SETTINGS_COLUMNS, records)
}

/// Read back an order CSV written by [`export_orders_csv`].
pub fn import_orders_csv(csv_text: &str) -> Result<Vec<OrderRecord>> {
    let mut rdr = csv::Reader::from_reader(csv_text.as_bytes());
    rdr.deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("bad order record at row {}", i + 1)))
        .collect()
}

// ─── JSON summary ───────────────────────────────────────────────────

/// Run metadata written next to the CSV tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub side: Side,
    pub starting_equity: f64,
    pub fee_pct: f64,
    pub mmr_pct: f64,
    pub num_symbols: usize,
    pub indicators_per_symbol: usize,
    pub order_settings: usize,
    pub bars: usize,
    pub combinations_run: usize,
    pub halted: usize,
    pub order_records: usize,
    pub strategy_records: usize,
    pub dataset_hash: String,
    pub output_hash: String,
    /// Best kept rows by `gains_pct`, descending.
    pub top: Vec<StrategyRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SweepSummary {
    pub fn new(
        statics: &StaticVariables,
        inputs: &SweepInputs,
        order_settings: usize,
        output: &SweepOutput,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut top: Vec<StrategyRecord> = output.strategy_records.as_slice().to_vec();
        top.sort_by(|a, b| b.gains_pct.total_cmp(&a.gains_pct));
        top.truncate(TOP_N);
        Self {
            schema_version: SCHEMA_VERSION,
            created_at,
            side: statics.side(),
            starting_equity: statics.equity,
            fee_pct: statics.fee_pct,
            mmr_pct: statics.mmr_pct,
            num_symbols: inputs.num_symbols(),
            indicators_per_symbol: inputs.indicators_per_symbol(),
            order_settings,
            bars: inputs.bars(),
            combinations_run: output.combinations_run,
            halted: output.halted,
            order_records: output.order_records.len(),
            strategy_records: output.strategy_records.filled(),
            dataset_hash: dataset_fingerprint(inputs).0,
            output_hash: output_fingerprint(output).0,
            top,
        }
    }
}

pub fn export_summary_json(summary: &SweepSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize SweepSummary to JSON")
}

/// Deserialize a `SweepSummary`, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<SweepSummary> {
    let summary: SweepSummary =
        serde_json::from_str(json).context("failed to deserialize SweepSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Which artifacts to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactOptions {
    pub csv: bool,
    pub json: bool,
}

/// Save the artifact set of a sweep.
///
/// Creates `sweep_{timestamp}/` under `output_dir` containing `summary.json`,
/// `orders.csv`, `strategies.csv` and `settings.csv`, as selected by `opts`.
/// Returns the created directory.
pub fn save_artifacts(
    summary: &SweepSummary,
    output: &SweepOutput,
    output_dir: &Path,
    opts: ArtifactOptions,
) -> Result<PathBuf> {
    let dirname = format!("sweep_{}", summary.created_at.format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    if opts.json {
        write(&run_dir.join("summary.json"), &export_summary_json(summary)?)?;
    }
    if opts.csv {
        write(&run_dir.join("orders.csv"), &export_orders_csv(&output.order_records)?)?;
        write(
            &run_dir.join("strategies.csv"),
            &export_strategies_csv(output.strategy_records.as_slice())?,
        )?;
        write(
            &run_dir.join("settings.csv"),
            &export_settings_csv(output.settings_records.as_slice())?,
        )?;
    }
    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load the `summary.json` of an artifact directory.
pub fn load_summary(dir: &Path) -> Result<SweepSummary> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leverlab_core::domain::{AccountState, CombinationId, OrderResult, OrderStatus, OrderType};

    fn sample_order() -> OrderRecord {
        let mut result = OrderResult::new(OrderType::LongStopLoss);
        result.order_status = OrderStatus::Filled;
        result.price = 98.0;
        result.realized_pnl = -10.0;
        OrderRecord::capture(CombinationId::new(0, 1, 2), 7, &result, &AccountState::new(990.0))
    }

    #[test]
    fn csv_header_without_records() {
        let text = export_strategies_csv(&[]).unwrap();
        assert_eq!(text.trim_end(), STRATEGY_COLUMNS.join(","));
    }

    #[test]
    fn order_columns_match_serialized_fields() {
        let text = export_orders_csv(&[sample_order()]).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        assert_eq!(header.split(',').count(), row.split(',').count());
        // order_type code 2 = LongStopLoss, status 1 = Filled
        assert!(row.starts_with("0,1,2,7,2,1,"));
    }

    #[test]
    fn order_csv_reads_back() {
        let records = vec![sample_order()];
        let text = export_orders_csv(&records).unwrap();
        let back = import_orders_csv(&text).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].order_type, OrderType::LongStopLoss);
        assert_eq!(back[0].bar_index, 7);
        assert!((back[0].realized_pnl + 10.0).abs() < 1e-12);
    }
}
