//! Summary statistics — pure functions over the closed-trade pnl list.
//!
//! No dependencies on the sweep driver or the engine state.

use serde::{Deserialize, Serialize};

use leverlab_core::domain::{CombinationId, StaticVariables, StrategyRecord};

/// A trade with `|pnl|` below this is a break-even.
pub const BREAK_EVEN_EPS: f64 = 1e-9;

/// Aggregate statistics of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub break_evens: usize,
    pub win_rate: f64,
    pub gains_pct: f64,
    pub to_the_upside: f64,
    pub total_fees: f64,
    pub total_pnl: f64,
    pub ending_equity: f64,
}

impl TradeStats {
    /// Compute all statistics from closed-trade net pnls.
    pub fn from_pnls(pnls: &[f64], starting_equity: f64, ending_equity: f64, total_fees: f64) -> Self {
        let (wins, losses, break_evens) = count_outcomes(pnls);
        let gains_pct = gains_pct(starting_equity, ending_equity);
        Self {
            total_trades: pnls.len(),
            wins,
            losses,
            break_evens,
            win_rate: win_rate(wins, losses),
            gains_pct,
            to_the_upside: to_the_upside(pnls, gains_pct),
            total_fees,
            total_pnl: pnls.iter().sum(),
            ending_equity,
        }
    }

    /// The summary row is kept only when every filter passes.
    pub fn passes_filters(&self, statics: &StaticVariables) -> bool {
        self.total_trades >= statics.total_trade_filter
            && self.gains_pct >= statics.gains_pct_filter
            && self.to_the_upside >= statics.upside_filter
    }

    pub fn to_record(&self, id: CombinationId) -> StrategyRecord {
        StrategyRecord {
            symbol_idx: id.symbol_idx,
            indicator_settings_idx: id.indicator_settings_idx,
            order_settings_idx: id.order_settings_idx,
            total_trades: self.total_trades as u32,
            wins: self.wins as u32,
            losses: self.losses as u32,
            break_evens: self.break_evens as u32,
            win_rate: self.win_rate,
            gains_pct: self.gains_pct,
            to_the_upside: self.to_the_upside,
            total_fees: self.total_fees,
            total_pnl: self.total_pnl,
            ending_equity: self.ending_equity,
        }
    }
}

// ─── Individual statistics ──────────────────────────────────────────

/// `(wins, losses, break_evens)`.
pub fn count_outcomes(pnls: &[f64]) -> (usize, usize, usize) {
    pnls.iter().fold((0, 0, 0), |(w, l, be), &p| {
        if p.abs() < BREAK_EVEN_EPS {
            (w, l, be + 1)
        } else if p > 0.0 {
            (w + 1, l, be)
        } else {
            (w, l + 1, be)
        }
    })
}

/// Wins over decisive (non-break-even) trades. 0.0 when there are none.
pub fn win_rate(wins: usize, losses: usize) -> f64 {
    let decisive = wins + losses;
    if decisive == 0 {
        return 0.0;
    }
    wins as f64 / decisive as f64
}

/// Percent change of equity over the run.
pub fn gains_pct(starting_equity: f64, ending_equity: f64) -> f64 {
    if starting_equity <= 0.0 {
        return 0.0;
    }
    (ending_equity - starting_equity) / starting_equity * 100.0
}

/// Cumulative pnl of the decisive trades.
pub fn cumulative_curve(pnls: &[f64]) -> Vec<f64> {
    pnls.iter()
        .filter(|p| p.abs() >= BREAK_EVEN_EPS)
        .scan(0.0, |acc, &p| {
            *acc += p;
            Some(*acc)
        })
        .collect()
}

/// Coefficient of determination of the least-squares line through `y`
/// against its index. 0.0 for fewer than two points or a flat series.
pub fn r_squared(y: &[f64]) -> f64 {
    let n = y.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (sxy * sxy) / (sxx * syy)
}

/// Straightness of the equity climb: R² of the cumulative decisive pnl,
/// negated when the run did not make money.
pub fn to_the_upside(pnls: &[f64], gains_pct: f64) -> f64 {
    let r2 = r_squared(&cumulative_curve(pnls));
    if gains_pct <= 0.0 {
        -r2
    } else {
        r2
    }
}
