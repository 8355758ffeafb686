use serde::{Deserialize, Serialize};

use super::codes::{OrderStatus, OrderStatusInfo, OrderType};

/// Mutable per-combination position state, updated bar by bar.
///
/// While `position == 0` every position-carrying field sits at its reset
/// default. The fields describing the last action (`price`, `fees_paid`,
/// `realized_pnl`, `pct_chg_trade`, status codes, `order_type`) stay readable
/// after an exit until the next action overwrites them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Open size in asset units, never negative.
    pub position: f64,
    pub average_entry: f64,
    /// Fill price of the last action.
    pub price: f64,
    /// Notional of the last fill.
    pub size_value: f64,
    pub leverage: f64,
    /// Fees of the last fill.
    pub fees_paid: f64,
    /// Net pnl of the last closed trade (both fees deducted).
    pub realized_pnl: f64,
    pub pct_chg_trade: f64,
    pub sl_price: f64,
    pub sl_pct: f64,
    pub tp_price: f64,
    pub tp_pct: f64,
    pub liq_price: f64,
    pub moved_sl_to_be: bool,
    /// Stop has moved since the fill (break-even or trailing).
    pub sl_moved: bool,
    /// Entry fees of the fills that built the open position.
    pub entry_fees: f64,
    pub order_status: OrderStatus,
    pub order_status_info: OrderStatusInfo,
    pub order_type: OrderType,
}

impl OrderResult {
    /// Reset state for a new combination.
    pub fn new(order_type: OrderType) -> Self {
        Self {
            position: 0.0,
            average_entry: 0.0,
            price: 0.0,
            size_value: 0.0,
            leverage: 0.0,
            fees_paid: 0.0,
            realized_pnl: 0.0,
            pct_chg_trade: 0.0,
            sl_price: 0.0,
            sl_pct: 0.0,
            tp_price: 0.0,
            tp_pct: 0.0,
            liq_price: f64::NAN,
            moved_sl_to_be: false,
            sl_moved: false,
            entry_fees: 0.0,
            order_status: OrderStatus::NoAction,
            order_status_info: OrderStatusInfo::HopefullyNoProblems,
            order_type,
        }
    }

    #[inline]
    pub fn has_position(&self) -> bool {
        self.position > 0.0
    }

    /// Clear every position-carrying field after an exit.
    pub(crate) fn clear_position(&mut self) {
        self.position = 0.0;
        self.average_entry = 0.0;
        self.size_value = 0.0;
        self.leverage = 0.0;
        self.sl_price = 0.0;
        self.sl_pct = 0.0;
        self.tp_price = 0.0;
        self.tp_pct = 0.0;
        self.liq_price = f64::NAN;
        self.moved_sl_to_be = false;
        self.sl_moved = false;
        self.entry_fees = 0.0;
    }

    /// Record the status of the last action.
    #[inline]
    pub(crate) fn set_status(&mut self, status: OrderStatus, info: OrderStatusInfo) {
        self.order_status = status;
        self.order_status_info = info;
    }
}
