use serde::{Deserialize, Serialize};

/// Below this available balance a combination stops trading.
pub const MIN_AVAILABLE_BALANCE: f64 = 5.0;

/// Cash bookkeeping for one combination.
///
/// `equity == available_balance + cash_used` after every fill. Equity is
/// realized-only: open positions are carried at their margin, not marked to market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub available_balance: f64,
    pub cash_used: f64,
    pub cash_borrowed: f64,
    pub equity: f64,
}

impl AccountState {
    /// Fresh account holding `equity` in free cash.
    pub fn new(equity: f64) -> Self {
        Self {
            available_balance: equity,
            cash_used: 0.0,
            cash_borrowed: 0.0,
            equity,
        }
    }

    /// True once the kill switch threshold has been crossed.
    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.available_balance < MIN_AVAILABLE_BALANCE
    }

    /// Debug-only check of the equity identity.
    #[inline]
    pub fn debug_check(&self) {
        debug_assert!(
            (self.equity - (self.available_balance + self.cash_used)).abs()
                <= 1e-6 * self.equity.abs().max(1.0),
            "equity accounting violated: equity={}, available={} + used={}",
            self.equity,
            self.available_balance,
            self.cash_used
        );
    }
}
