//! Run-wide parameters shared by every combination of a sweep.

use serde::{Deserialize, Serialize};

use super::codes::{LeverageMode, OrderType, Side, SizeType};
use super::ConfigError;

/// Static run parameters. Values are fractions (`fee_pct = 0.0006` is 0.06%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticVariables {
    /// Starting balance of every combination.
    pub equity: f64,
    /// `LongEntry` or `ShortEntry`; fixes the direction of the run.
    pub order_type: OrderType,
    /// Fee on notional, charged at entry and at exit.
    pub fee_pct: f64,
    /// Maintenance margin rate used by the liquidation price.
    pub mmr_pct: f64,
    pub max_leverage: f64,
    pub leverage_mode: LeverageMode,
    pub size_type: SizeType,
    pub min_order_size_value: f64,
    pub max_order_size_value: f64,
    /// Only trail the stop once it has been moved to break-even.
    pub sl_to_be_then_trail: bool,
    /// Entry signals while a position is open average into it instead of being ignored.
    pub allow_position_increase: bool,
    /// Close an open position at the last bar's close.
    pub close_at_end_of_data: bool,
    /// Summary buffer capacity divisor (`combinations / divisor` rows).
    pub divide_records_array_size_by: f64,
    /// Minimum `gains_pct` (percent) for a summary row to be kept.
    pub gains_pct_filter: f64,
    /// Minimum closed trades for a summary row to be kept.
    pub total_trade_filter: usize,
    /// Minimum `to_the_upside` for a summary row to be kept.
    pub upside_filter: f64,
}

impl Default for StaticVariables {
    fn default() -> Self {
        Self {
            equity: 1_000.0,
            order_type: OrderType::LongEntry,
            fee_pct: 0.0006,
            mmr_pct: 0.005,
            max_leverage: 100.0,
            leverage_mode: LeverageMode::Isolated,
            size_type: SizeType::RiskPercentOfAccount,
            min_order_size_value: 1.0,
            max_order_size_value: f64::INFINITY,
            sl_to_be_then_trail: false,
            allow_position_increase: false,
            close_at_end_of_data: false,
            divide_records_array_size_by: 1.0,
            gains_pct_filter: f64::NEG_INFINITY,
            total_trade_filter: 1,
            upside_filter: -1.0,
        }
    }
}

impl StaticVariables {
    /// Direction of the run. Only valid after [`validate`](Self::validate).
    pub fn side(&self) -> Side {
        self.order_type.entry_side().unwrap_or(Side::Long)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.equity.is_finite() && self.equity > 0.0) {
            return Err(ConfigError::invalid("equity", "must be a positive amount"));
        }
        if self.order_type.entry_side().is_none() {
            return Err(ConfigError::invalid(
                "order_type",
                "must be LongEntry (0) or ShortEntry (1)",
            ));
        }
        if !(0.0..1.0).contains(&self.fee_pct) {
            return Err(ConfigError::invalid("fee_pct", "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.mmr_pct) {
            return Err(ConfigError::invalid("mmr_pct", "must be in [0, 1)"));
        }
        if !(self.max_leverage >= 1.0) {
            return Err(ConfigError::invalid("max_leverage", "must be at least 1"));
        }
        if !(self.min_order_size_value >= 0.0) {
            return Err(ConfigError::invalid(
                "min_order_size_value",
                "must not be negative",
            ));
        }
        if !(self.max_order_size_value >= self.min_order_size_value) {
            return Err(ConfigError::invalid(
                "max_order_size_value",
                "must not be below min_order_size_value",
            ));
        }
        if !(self.divide_records_array_size_by >= 1.0)
            || !self.divide_records_array_size_by.is_finite()
        {
            return Err(ConfigError::invalid(
                "divide_records_array_size_by",
                "must be a finite number >= 1",
            ));
        }
        if self.upside_filter.is_nan() || self.gains_pct_filter.is_nan() {
            return Err(ConfigError::invalid(
                "filters",
                "gains_pct_filter and upside_filter must not be NaN",
            ));
        }
        Ok(())
    }
}
