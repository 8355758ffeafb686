//! Fee model: a flat rate on notional, charged at entry and again at exit.

use crate::domain::Side;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeModel {
    /// Fee as a fraction of notional, per side.
    pub fee_pct: f64,
}

impl FeeModel {
    pub fn new(fee_pct: f64) -> Self {
        Self { fee_pct }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0)
    }

    #[inline]
    pub fn fee(&self, notional: f64) -> f64 {
        notional * self.fee_pct
    }

    /// Loss per unit of notional if the position is stopped out `sl_pct` away,
    /// entry and exit fees included.
    #[inline]
    pub fn loss_per_notional(&self, side: Side, sl_pct: f64) -> f64 {
        sl_pct + self.fee_pct + self.fee_pct * (1.0 - side.sign() * sl_pct)
    }

    /// Worst-case loss of a position of `units` at `average_entry` stopped at
    /// `sl_price`, with `entry_fees` already paid.
    #[inline]
    pub fn loss_at_stop(
        &self,
        side: Side,
        average_entry: f64,
        sl_price: f64,
        units: f64,
        entry_fees: f64,
    ) -> f64 {
        side.sign() * (average_entry - sl_price) * units + entry_fees + self.fee(sl_price * units)
    }

    /// Exit price at which the trade nets zero after both fees.
    #[inline]
    pub fn zero_loss_price(&self, side: Side, average_entry: f64) -> f64 {
        match side {
            Side::Long => average_entry * (1.0 + self.fee_pct) / (1.0 - self.fee_pct),
            Side::Short => average_entry * (1.0 - self.fee_pct) / (1.0 + self.fee_pct),
        }
    }
}
