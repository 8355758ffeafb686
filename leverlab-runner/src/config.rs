//! TOML sweep configuration.
//!
//! Percentages are written the way a trader writes them (`sl_pct = [1.0, 2.5]`
//! means 1% and 2.5%) and converted to fractions on load. `nan` disables a
//! grid value, `"none"` disables a basis.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leverlab_core::domain::{
    BreakEvenTarget, CandleBody, ConfigError, LeverageMode, OrderSettings, OrderSettingsArrays,
    OrderType, Side, SizeType, StaticVariables,
};

use crate::logging::LoggingConfig;

/// Upper bound on the expanded order-settings grid.
pub const MAX_GRID_COMBINATIONS: usize = 10_000_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("grid field '{0}' has no candidates")]
    EmptyCandidates(&'static str),

    #[error("grid expands to more than {max} combinations")]
    TooLarge { max: usize },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Stop basis as written in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    None,
    Open,
    High,
    Low,
    Close,
}

impl From<Basis> for Option<CandleBody> {
    fn from(b: Basis) -> Self {
        match b {
            Basis::None => None,
            Basis::Open => Some(CandleBody::Open),
            Basis::High => Some(CandleBody::High),
            Basis::Low => Some(CandleBody::Low),
            Basis::Close => Some(CandleBody::Close),
        }
    }
}

/// `[static_variables]`: run-wide parameters, percentages in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub equity: f64,
    pub side: Side,
    pub fee_pct: f64,
    pub mmr_pct: f64,
    pub max_leverage: f64,
    pub leverage_mode: LeverageMode,
    pub size_type: SizeType,
    pub min_order_size_value: f64,
    pub max_order_size_value: f64,
    pub sl_to_be_then_trail: bool,
    pub allow_position_increase: bool,
    pub close_at_end_of_data: bool,
    pub divide_records_array_size_by: f64,
    pub gains_pct_filter: f64,
    pub total_trade_filter: usize,
    pub upside_filter: f64,
}

impl Default for StaticConfig {
    fn default() -> Self {
        let sv = StaticVariables::default();
        Self {
            equity: sv.equity,
            side: Side::Long,
            fee_pct: sv.fee_pct * 100.0,
            mmr_pct: sv.mmr_pct * 100.0,
            max_leverage: sv.max_leverage,
            leverage_mode: sv.leverage_mode,
            size_type: sv.size_type,
            min_order_size_value: sv.min_order_size_value,
            max_order_size_value: sv.max_order_size_value,
            sl_to_be_then_trail: sv.sl_to_be_then_trail,
            allow_position_increase: sv.allow_position_increase,
            close_at_end_of_data: sv.close_at_end_of_data,
            divide_records_array_size_by: sv.divide_records_array_size_by,
            gains_pct_filter: sv.gains_pct_filter,
            total_trade_filter: sv.total_trade_filter,
            upside_filter: sv.upside_filter,
        }
    }
}

impl StaticConfig {
    pub fn to_static_variables(&self) -> StaticVariables {
        StaticVariables {
            equity: self.equity,
            order_type: match self.side {
                Side::Long => OrderType::LongEntry,
                Side::Short => OrderType::ShortEntry,
            },
            fee_pct: self.fee_pct / 100.0,
            mmr_pct: self.mmr_pct / 100.0,
            max_leverage: self.max_leverage,
            leverage_mode: self.leverage_mode,
            size_type: self.size_type,
            min_order_size_value: self.min_order_size_value,
            max_order_size_value: self.max_order_size_value,
            sl_to_be_then_trail: self.sl_to_be_then_trail,
            allow_position_increase: self.allow_position_increase,
            close_at_end_of_data: self.close_at_end_of_data,
            divide_records_array_size_by: self.divide_records_array_size_by,
            gains_pct_filter: self.gains_pct_filter,
            total_trade_filter: self.total_trade_filter,
            upside_filter: self.upside_filter,
        }
    }
}

/// `[grid]`: candidate values per order-settings field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSettingsGrid {
    pub leverage: Vec<f64>,
    pub max_equity_risk_pct: Vec<f64>,
    pub max_equity_risk_value: Vec<f64>,
    pub risk_reward: Vec<f64>,
    pub size_pct: Vec<f64>,
    pub size_value: Vec<f64>,
    pub sl_based_on: Vec<Basis>,
    pub sl_based_on_lookback: Vec<usize>,
    pub sl_based_on_add_pct: Vec<f64>,
    pub sl_pct: Vec<f64>,
    pub sl_to_be_based_on: Vec<Basis>,
    pub sl_to_be_zero_or_entry: Vec<BreakEvenTarget>,
    pub sl_to_be_when_pct_from_avg_entry: Vec<f64>,
    pub tp_pct: Vec<f64>,
    pub trail_sl_based_on: Vec<Basis>,
    pub trail_sl_by_pct: Vec<f64>,
    pub trail_sl_when_pct_from_avg_entry: Vec<f64>,
}

impl Default for OrderSettingsGrid {
    fn default() -> Self {
        Self {
            leverage: vec![1.0],
            max_equity_risk_pct: vec![3.0],
            max_equity_risk_value: vec![f64::NAN],
            risk_reward: vec![f64::NAN],
            size_pct: vec![1.0],
            size_value: vec![f64::NAN],
            sl_based_on: vec![Basis::None],
            sl_based_on_lookback: vec![0],
            sl_based_on_add_pct: vec![0.0],
            sl_pct: vec![2.0],
            sl_to_be_based_on: vec![Basis::None],
            sl_to_be_zero_or_entry: vec![BreakEvenTarget::ZeroLoss],
            sl_to_be_when_pct_from_avg_entry: vec![f64::NAN],
            tp_pct: vec![f64::NAN],
            trail_sl_based_on: vec![Basis::None],
            trail_sl_by_pct: vec![f64::NAN],
            trail_sl_when_pct_from_avg_entry: vec![f64::NAN],
        }
    }
}

fn value(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

fn pct(v: f64) -> Option<f64> {
    value(v).map(|p| p / 100.0)
}

impl OrderSettingsGrid {
    fn lengths(&self) -> [(&'static str, usize); 17] {
        [
            ("leverage", self.leverage.len()),
            ("max_equity_risk_pct", self.max_equity_risk_pct.len()),
            ("max_equity_risk_value", self.max_equity_risk_value.len()),
            ("risk_reward", self.risk_reward.len()),
            ("size_pct", self.size_pct.len()),
            ("size_value", self.size_value.len()),
            ("sl_based_on", self.sl_based_on.len()),
            ("sl_based_on_lookback", self.sl_based_on_lookback.len()),
            ("sl_based_on_add_pct", self.sl_based_on_add_pct.len()),
            ("sl_pct", self.sl_pct.len()),
            ("sl_to_be_based_on", self.sl_to_be_based_on.len()),
            ("sl_to_be_zero_or_entry", self.sl_to_be_zero_or_entry.len()),
            (
                "sl_to_be_when_pct_from_avg_entry",
                self.sl_to_be_when_pct_from_avg_entry.len(),
            ),
            ("tp_pct", self.tp_pct.len()),
            ("trail_sl_based_on", self.trail_sl_based_on.len()),
            ("trail_sl_by_pct", self.trail_sl_by_pct.len()),
            (
                "trail_sl_when_pct_from_avg_entry",
                self.trail_sl_when_pct_from_avg_entry.len(),
            ),
        ]
    }

    /// Number of combinations the grid expands to.
    pub fn size(&self) -> Result<usize, SettingsError> {
        let mut total: usize = 1;
        for (field, len) in self.lengths() {
            if len == 0 {
                return Err(SettingsError::EmptyCandidates(field));
            }
            total = total
                .checked_mul(len)
                .filter(|&t| t <= MAX_GRID_COMBINATIONS)
                .ok_or(SettingsError::TooLarge {
                    max: MAX_GRID_COMBINATIONS,
                })?;
        }
        Ok(total)
    }

    /// Expand to the cartesian product. The last field varies fastest.
    pub fn cartesian(&self) -> Result<OrderSettingsArrays, SettingsError> {
        let total = self.size()?;
        let lengths = self.lengths().map(|(_, len)| len);
        let mut arrays = OrderSettingsArrays::with_capacity(total);
        let mut digits = [0usize; 17];

        for _ in 0..total {
            let [lev, mer_pct, mer_val, rr, size_pct, size_value, sl_on, sl_lb, sl_add, sl, be_on, be_target, be_when, tp, tr_on, tr_by, tr_when] =
                digits;
            arrays.push(OrderSettings {
                leverage: self.leverage[lev],
                max_equity_risk_pct: pct(self.max_equity_risk_pct[mer_pct]),
                max_equity_risk_value: value(self.max_equity_risk_value[mer_val]),
                risk_reward: value(self.risk_reward[rr]),
                size_pct: pct(self.size_pct[size_pct]),
                size_value: value(self.size_value[size_value]),
                sl_based_on: self.sl_based_on[sl_on].into(),
                sl_based_on_lookback: self.sl_based_on_lookback[sl_lb],
                sl_based_on_add_pct: pct(self.sl_based_on_add_pct[sl_add]).unwrap_or(0.0),
                sl_pct: pct(self.sl_pct[sl]),
                sl_to_be_based_on: self.sl_to_be_based_on[be_on].into(),
                sl_to_be_zero_or_entry: self.sl_to_be_zero_or_entry[be_target],
                sl_to_be_when_pct_from_avg_entry: pct(self.sl_to_be_when_pct_from_avg_entry[be_when]),
                tp_pct: pct(self.tp_pct[tp]),
                trail_sl_based_on: self.trail_sl_based_on[tr_on].into(),
                trail_sl_by_pct: pct(self.trail_sl_by_pct[tr_by]),
                trail_sl_when_pct_from_avg_entry: pct(self.trail_sl_when_pct_from_avg_entry[tr_when]),
            });

            // mixed-radix increment, last digit fastest
            for pos in (0..digits.len()).rev() {
                digits[pos] += 1;
                if digits[pos] < lengths[pos] {
                    break;
                }
                digits[pos] = 0;
            }
        }
        Ok(arrays)
    }
}

/// `[output]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Keep the per-order event log (can be large).
    pub order_records: bool,
    pub csv: bool,
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            order_records: true,
            csv: true,
            json: true,
        }
    }
}

/// `[run]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub parallel: bool,
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Complete sweep configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub static_variables: StaticConfig,
    pub grid: OrderSettingsGrid,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub run: RunSettings,
}

impl SweepConfig {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn static_variables(&self) -> StaticVariables {
        self.static_variables.to_static_variables()
    }

    /// Validate statics and every grid row; returns the expanded grid.
    pub fn validate(&self) -> Result<OrderSettingsArrays, SettingsError> {
        let statics = self.static_variables();
        statics.validate()?;
        let arrays = self.grid.cartesian()?;
        arrays.validate(&statics)?;
        Ok(arrays)
    }
}
