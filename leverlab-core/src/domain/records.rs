//! Fixed-schema output rows.

use serde::{Deserialize, Serialize};

use super::account::AccountState;
use super::codes::{BreakEvenTarget, CandleBody, OrderStatus, OrderStatusInfo, OrderType};
use super::order_result::OrderResult;
use super::settings::OrderSettings;

/// One (symbol, indicator-setting, order-setting) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinationId {
    pub symbol_idx: u32,
    pub indicator_settings_idx: u32,
    pub order_settings_idx: u32,
}

impl CombinationId {
    pub fn new(symbol_idx: usize, indicator_settings_idx: usize, order_settings_idx: usize) -> Self {
        Self {
            symbol_idx: symbol_idx as u32,
            indicator_settings_idx: indicator_settings_idx as u32,
            order_settings_idx: order_settings_idx as u32,
        }
    }
}

/// Order event log row, written for every executed action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub symbol_idx: u32,
    pub indicator_settings_idx: u32,
    pub order_settings_idx: u32,
    pub bar_index: u32,
    pub order_type: OrderType,
    pub order_status: OrderStatus,
    pub order_status_info: OrderStatusInfo,
    pub price: f64,
    pub average_entry: f64,
    pub position: f64,
    pub size_value: f64,
    pub leverage: f64,
    pub fees_paid: f64,
    pub realized_pnl: f64,
    pub pct_chg_trade: f64,
    pub sl_price: f64,
    pub sl_pct: f64,
    pub tp_price: f64,
    pub tp_pct: f64,
    pub liq_price: f64,
    pub moved_sl_to_be: bool,
    pub available_balance: f64,
    pub equity: f64,
}

impl OrderRecord {
    /// Snapshot `result` and `account` as they stand right after an action.
    pub fn capture(
        id: CombinationId,
        bar_index: usize,
        result: &OrderResult,
        account: &AccountState,
    ) -> Self {
        Self {
            symbol_idx: id.symbol_idx,
            indicator_settings_idx: id.indicator_settings_idx,
            order_settings_idx: id.order_settings_idx,
            bar_index: bar_index as u32,
            order_type: result.order_type,
            order_status: result.order_status,
            order_status_info: result.order_status_info,
            price: result.price,
            average_entry: result.average_entry,
            position: result.position,
            size_value: result.size_value,
            leverage: result.leverage,
            fees_paid: result.fees_paid,
            realized_pnl: result.realized_pnl,
            pct_chg_trade: result.pct_chg_trade,
            sl_price: result.sl_price,
            sl_pct: result.sl_pct,
            tp_price: result.tp_price,
            tp_pct: result.tp_pct,
            liq_price: result.liq_price,
            moved_sl_to_be: result.moved_sl_to_be,
            available_balance: account.available_balance,
            equity: account.equity,
        }
    }

    pub fn combination(&self) -> CombinationId {
        CombinationId {
            symbol_idx: self.symbol_idx,
            indicator_settings_idx: self.indicator_settings_idx,
            order_settings_idx: self.order_settings_idx,
        }
    }
}

/// Final performance of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub symbol_idx: u32,
    pub indicator_settings_idx: u32,
    pub order_settings_idx: u32,
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub break_evens: u32,
    pub win_rate: f64,
    pub gains_pct: f64,
    pub to_the_upside: f64,
    pub total_fees: f64,
    pub total_pnl: f64,
    pub ending_equity: f64,
}

/// Settings echo row written alongside each [`StrategyRecord`].
///
/// Disabled values are written as `NaN`, disabled bases as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSettingsRecord {
    pub symbol_idx: u32,
    pub indicator_settings_idx: u32,
    pub order_settings_idx: u32,
    pub leverage: f64,
    pub max_equity_risk_pct: f64,
    pub max_equity_risk_value: f64,
    pub risk_reward: f64,
    pub size_pct: f64,
    pub size_value: f64,
    pub sl_based_on: i8,
    pub sl_based_on_lookback: u32,
    pub sl_based_on_add_pct: f64,
    pub sl_pct: f64,
    pub sl_to_be_based_on: i8,
    pub sl_to_be_zero_or_entry: u8,
    pub sl_to_be_when_pct_from_avg_entry: f64,
    pub tp_pct: f64,
    pub trail_sl_based_on: i8,
    pub trail_sl_by_pct: f64,
    pub trail_sl_when_pct_from_avg_entry: f64,
}

fn or_nan(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

fn basis_code(b: Option<CandleBody>) -> i8 {
    match b {
        None => -1,
        Some(CandleBody::Open) => 0,
        Some(CandleBody::High) => 1,
        Some(CandleBody::Low) => 2,
        Some(CandleBody::Close) => 3,
    }
}

impl OrderSettingsRecord {
    pub fn new(id: CombinationId, s: &OrderSettings) -> Self {
        Self {
            symbol_idx: id.symbol_idx,
            indicator_settings_idx: id.indicator_settings_idx,
            order_settings_idx: id.order_settings_idx,
            leverage: s.leverage,
            max_equity_risk_pct: or_nan(s.max_equity_risk_pct),
            max_equity_risk_value: or_nan(s.max_equity_risk_value),
            risk_reward: or_nan(s.risk_reward),
            size_pct: or_nan(s.size_pct),
            size_value: or_nan(s.size_value),
            sl_based_on: basis_code(s.sl_based_on),
            sl_based_on_lookback: s.sl_based_on_lookback as u32,
            sl_based_on_add_pct: s.sl_based_on_add_pct,
            sl_pct: or_nan(s.sl_pct),
            sl_to_be_based_on: basis_code(s.sl_to_be_based_on),
            sl_to_be_zero_or_entry: match s.sl_to_be_zero_or_entry {
                BreakEvenTarget::ZeroLoss => 0,
                BreakEvenTarget::AverageEntry => 1,
            },
            sl_to_be_when_pct_from_avg_entry: or_nan(s.sl_to_be_when_pct_from_avg_entry),
            tp_pct: or_nan(s.tp_pct),
            trail_sl_based_on: basis_code(s.trail_sl_based_on),
            trail_sl_by_pct: or_nan(s.trail_sl_by_pct),
            trail_sl_when_pct_from_avg_entry: or_nan(s.trail_sl_when_pct_from_avg_entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_copies_result_and_account() {
        let id = CombinationId::new(1, 2, 3);
        let mut result = OrderResult::new(OrderType::LongEntry);
        result.position = 1.5;
        result.price = 101.0;
        result.order_status = OrderStatus::Filled;
        let account = AccountState::new(900.0);

        let rec = OrderRecord::capture(id, 7, &result, &account);
        assert_eq!(rec.combination(), id);
        assert_eq!(rec.bar_index, 7);
        assert_eq!(rec.position, 1.5);
        assert_eq!(rec.price, 101.0);
        assert_eq!(rec.order_status, OrderStatus::Filled);
        assert_eq!(rec.equity, 900.0);
    }

    #[test]
    fn settings_record_marks_disabled_fields() {
        let s = OrderSettings {
            sl_based_on: Some(CandleBody::Low),
            ..OrderSettings::default()
        };
        let rec = OrderSettingsRecord::new(CombinationId::new(0, 0, 4), &s);
        assert_eq!(rec.order_settings_idx, 4);
        assert_eq!(rec.sl_based_on, 2);
        assert_eq!(rec.trail_sl_based_on, -1);
        assert!(rec.tp_pct.is_nan());
        assert_eq!(rec.sl_pct, 0.02);
    }
}
