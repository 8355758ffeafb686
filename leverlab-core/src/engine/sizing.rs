//! Leverage selection and entry notional.

use super::cost_model::FeeModel;
use crate::domain::{LeverageMode, OrderSettings, Side, SizeType, StaticVariables};

/// Margin buffer applied to the stop distance under `LeastFreeCashUsed`.
const STOP_BUFFER: f64 = 1.2;

/// Leverage for an entry whose stop sits `sl_pct` away.
pub fn select_leverage(statics: &StaticVariables, settings: &OrderSettings, sl_pct: f64) -> f64 {
    match statics.leverage_mode {
        LeverageMode::Isolated => settings.leverage,
        LeverageMode::LeastFreeCashUsed => {
            let raw = 1.0 / (sl_pct * STOP_BUFFER + statics.mmr_pct);
            let rounded = (raw * 10.0).floor() / 10.0;
            rounded.clamp(1.0, statics.max_leverage)
        }
    }
}

/// Notional the size type asks for, before any risk or margin bound.
///
/// Risk-based types size the order so the loss at the stop, fees included,
/// equals the risk amount.
pub fn target_notional(
    statics: &StaticVariables,
    settings: &OrderSettings,
    fees: &FeeModel,
    side: Side,
    equity: f64,
    sl_pct: f64,
) -> f64 {
    let value = settings.size_value.unwrap_or(0.0);
    let pct = settings.size_pct.unwrap_or(0.0);
    match statics.size_type {
        SizeType::Amount => value,
        SizeType::PercentOfAccount => pct * equity,
        SizeType::RiskAmount => value / fees.loss_per_notional(side, sl_pct),
        SizeType::RiskPercentOfAccount => pct * equity / fees.loss_per_notional(side, sl_pct),
    }
}

/// Largest notional whose margin plus entry fee fits in `available`.
#[inline]
pub fn max_affordable_notional(available: f64, leverage: f64, fees: &FeeModel) -> f64 {
    (available / (1.0 / leverage + fees.fee_pct)).max(0.0)
}

/// Isolated-margin liquidation price.
#[inline]
pub fn liquidation_price(side: Side, average_entry: f64, leverage: f64, mmr_pct: f64) -> f64 {
    match side {
        Side::Long => average_entry * (1.0 - 1.0 / leverage + mmr_pct),
        Side::Short => average_entry * (1.0 + 1.0 / leverage - mmr_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statics(mode: LeverageMode) -> StaticVariables {
        StaticVariables {
            leverage_mode: mode,
            mmr_pct: 0.005,
            max_leverage: 50.0,
            ..StaticVariables::default()
        }
    }

    #[test]
    fn isolated_uses_setting() {
        let s = OrderSettings {
            leverage: 7.0,
            ..OrderSettings::default()
        };
        assert_eq!(select_leverage(&statics(LeverageMode::Isolated), &s, 0.02), 7.0);
    }

    #[test]
    fn least_free_cash_rounds_down_and_clamps() {
        let s = OrderSettings::default();
        let sv = statics(LeverageMode::LeastFreeCashUsed);
        // 1 / (0.02 * 1.2 + 0.005) = 34.48...
        assert_eq!(select_leverage(&sv, &s, 0.02), 34.4);
        // tiny stop distance hits the cap
        assert_eq!(select_leverage(&sv, &s, 0.0001), 50.0);
        // huge stop distance floors at 1x
        assert_eq!(select_leverage(&sv, &s, 0.9), 1.0);
    }

    #[test]
    fn least_free_cash_keeps_liquidation_beyond_stop() {
        let s = OrderSettings::default();
        let sv = statics(LeverageMode::LeastFreeCashUsed);
        for sl_pct in [0.005, 0.01, 0.03, 0.1] {
            let lev = select_leverage(&sv, &s, sl_pct);
            let liq = liquidation_price(Side::Long, 100.0, lev, sv.mmr_pct);
            assert!(liq < 100.0 * (1.0 - sl_pct), "sl_pct {sl_pct} lev {lev} liq {liq}");
        }
    }

    #[test]
    fn risk_sizing_targets_loss() {
        let sv = StaticVariables {
            size_type: SizeType::RiskAmount,
            ..StaticVariables::default()
        };
        let s = OrderSettings {
            size_value: Some(10.0),
            ..OrderSettings::default()
        };
        let fees = FeeModel::new(0.0);
        let notional = target_notional(&sv, &s, &fees, Side::Long, 1_000.0, 0.02);
        assert!((notional - 500.0).abs() < 1e-9);
    }

    #[test]
    fn percent_of_account() {
        let sv = StaticVariables {
            size_type: SizeType::PercentOfAccount,
            ..StaticVariables::default()
        };
        let s = OrderSettings {
            size_pct: Some(0.25),
            ..OrderSettings::default()
        };
        let n = target_notional(&sv, &s, &FeeModel::new(0.001), Side::Short, 2_000.0, 0.02);
        assert_eq!(n, 500.0);
    }

    #[test]
    fn affordable_notional_covers_margin_and_fee() {
        let fees = FeeModel::new(0.001);
        let n = max_affordable_notional(100.0, 10.0, &fees);
        assert!((n / 10.0 + fees.fee(n) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn liquidation_mirrors_by_side() {
        assert!((liquidation_price(Side::Long, 100.0, 10.0, 0.005) - 90.5).abs() < 1e-9);
        assert!((liquidation_price(Side::Short, 100.0, 10.0, 0.005) - 109.5).abs() < 1e-9);
    }
}
