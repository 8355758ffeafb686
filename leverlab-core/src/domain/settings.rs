//! Order settings: one concrete record per combination, resolved from a
//! structure-of-arrays grid.

use serde::{Deserialize, Serialize};

use super::codes::{BreakEvenTarget, CandleBody, LeverageMode, SizeType};
use super::static_vars::StaticVariables;
use super::ConfigError;

/// Risk and order-management settings of one combination.
///
/// Percentages are fractions. `None` disables the feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSettings {
    pub leverage: f64,
    pub max_equity_risk_pct: Option<f64>,
    pub max_equity_risk_value: Option<f64>,
    pub risk_reward: Option<f64>,
    pub size_pct: Option<f64>,
    pub size_value: Option<f64>,
    pub sl_based_on: Option<CandleBody>,
    pub sl_based_on_lookback: usize,
    pub sl_based_on_add_pct: f64,
    pub sl_pct: Option<f64>,
    pub sl_to_be_based_on: Option<CandleBody>,
    pub sl_to_be_zero_or_entry: BreakEvenTarget,
    pub sl_to_be_when_pct_from_avg_entry: Option<f64>,
    pub tp_pct: Option<f64>,
    pub trail_sl_based_on: Option<CandleBody>,
    pub trail_sl_by_pct: Option<f64>,
    pub trail_sl_when_pct_from_avg_entry: Option<f64>,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            leverage: 1.0,
            max_equity_risk_pct: Some(0.03),
            max_equity_risk_value: None,
            risk_reward: None,
            size_pct: Some(0.01),
            size_value: None,
            sl_based_on: None,
            sl_based_on_lookback: 0,
            sl_based_on_add_pct: 0.0,
            sl_pct: Some(0.02),
            sl_to_be_based_on: None,
            sl_to_be_zero_or_entry: BreakEvenTarget::ZeroLoss,
            sl_to_be_when_pct_from_avg_entry: None,
            tp_pct: None,
            trail_sl_based_on: None,
            trail_sl_by_pct: None,
            trail_sl_when_pct_from_avg_entry: None,
        }
    }
}

impl OrderSettings {
    /// Largest loss a single position may carry, given the current equity.
    pub fn max_equity_risk(&self, equity: f64) -> f64 {
        match (self.max_equity_risk_value, self.max_equity_risk_pct) {
            (Some(value), _) => value,
            (None, Some(pct)) => equity * pct,
            (None, None) => f64::INFINITY,
        }
    }

    /// Reject settings that cannot run under `statics`.
    pub fn validate(&self, statics: &StaticVariables) -> Result<(), ConfigError> {
        if statics.leverage_mode == LeverageMode::Isolated
            && !(self.leverage >= 1.0 && self.leverage <= statics.max_leverage)
        {
            return Err(ConfigError::invalid(
                "leverage",
                format!("{} outside [1, {}]", self.leverage, statics.max_leverage),
            ));
        }
        if self.sl_pct.is_none() && self.sl_based_on.is_none() {
            return Err(ConfigError::invalid(
                "sl_pct",
                "a stop loss is required: set sl_pct or sl_based_on",
            ));
        }
        check_pct("sl_pct", self.sl_pct, true)?;
        if let Some(sl) = self.sl_pct {
            if sl >= 1.0 {
                return Err(ConfigError::invalid("sl_pct", "must be below 100%"));
            }
        }
        check_pct("sl_based_on_add_pct", Some(self.sl_based_on_add_pct), false)?;
        check_pct("tp_pct", self.tp_pct, true)?;
        check_pct("risk_reward", self.risk_reward, true)?;
        check_pct(
            "sl_to_be_when_pct_from_avg_entry",
            self.sl_to_be_when_pct_from_avg_entry,
            false,
        )?;
        check_pct(
            "trail_sl_when_pct_from_avg_entry",
            self.trail_sl_when_pct_from_avg_entry,
            false,
        )?;
        check_pct("trail_sl_by_pct", self.trail_sl_by_pct, true)?;
        if let Some(by) = self.trail_sl_by_pct {
            if by >= 1.0 {
                return Err(ConfigError::invalid("trail_sl_by_pct", "must be below 100%"));
            }
        }

        match statics.size_type {
            SizeType::Amount | SizeType::RiskAmount => {
                check_pct("size_value", self.size_value, true)?;
                if self.size_value.is_none() {
                    return Err(ConfigError::invalid(
                        "size_value",
                        format!("required by size type {:?}", statics.size_type),
                    ));
                }
            }
            SizeType::PercentOfAccount | SizeType::RiskPercentOfAccount => {
                check_pct("size_pct", self.size_pct, true)?;
                if self.size_pct.is_none() {
                    return Err(ConfigError::invalid(
                        "size_pct",
                        format!("required by size type {:?}", statics.size_type),
                    ));
                }
            }
        }

        if self.max_equity_risk_pct.is_none() && self.max_equity_risk_value.is_none() {
            return Err(ConfigError::invalid(
                "max_equity_risk",
                "set max_equity_risk_pct or max_equity_risk_value",
            ));
        }
        check_pct("max_equity_risk_pct", self.max_equity_risk_pct, true)?;
        check_pct("max_equity_risk_value", self.max_equity_risk_value, true)?;
        if self.max_equity_risk(statics.equity) > statics.equity {
            return Err(ConfigError::invalid(
                "max_equity_risk",
                "risk cap exceeds the starting equity",
            ));
        }
        Ok(())
    }
}

/// `value` must be finite and non-negative (strictly positive when `positive`).
fn check_pct(field: &'static str, value: Option<f64>, positive: bool) -> Result<(), ConfigError> {
    let Some(v) = value else {
        return Ok(());
    };
    let ok = v.is_finite() && if positive { v > 0.0 } else { v >= 0.0 };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{v} must be finite and {}", if positive { "> 0" } else { ">= 0" }),
        ))
    }
}

/// Columnar order-settings grid. Every column has the same length: the number
/// of order-setting combinations, already expanded upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSettingsArrays {
    pub leverage: Vec<f64>,
    pub max_equity_risk_pct: Vec<Option<f64>>,
    pub max_equity_risk_value: Vec<Option<f64>>,
    pub risk_reward: Vec<Option<f64>>,
    pub size_pct: Vec<Option<f64>>,
    pub size_value: Vec<Option<f64>>,
    pub sl_based_on: Vec<Option<CandleBody>>,
    pub sl_based_on_lookback: Vec<usize>,
    pub sl_based_on_add_pct: Vec<f64>,
    pub sl_pct: Vec<Option<f64>>,
    pub sl_to_be_based_on: Vec<Option<CandleBody>>,
    pub sl_to_be_zero_or_entry: Vec<BreakEvenTarget>,
    pub sl_to_be_when_pct_from_avg_entry: Vec<Option<f64>>,
    pub tp_pct: Vec<Option<f64>>,
    pub trail_sl_based_on: Vec<Option<CandleBody>>,
    pub trail_sl_by_pct: Vec<Option<f64>>,
    pub trail_sl_when_pct_from_avg_entry: Vec<Option<f64>>,
}

impl OrderSettingsArrays {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            leverage: Vec::with_capacity(n),
            max_equity_risk_pct: Vec::with_capacity(n),
            max_equity_risk_value: Vec::with_capacity(n),
            risk_reward: Vec::with_capacity(n),
            size_pct: Vec::with_capacity(n),
            size_value: Vec::with_capacity(n),
            sl_based_on: Vec::with_capacity(n),
            sl_based_on_lookback: Vec::with_capacity(n),
            sl_based_on_add_pct: Vec::with_capacity(n),
            sl_pct: Vec::with_capacity(n),
            sl_to_be_based_on: Vec::with_capacity(n),
            sl_to_be_zero_or_entry: Vec::with_capacity(n),
            sl_to_be_when_pct_from_avg_entry: Vec::with_capacity(n),
            tp_pct: Vec::with_capacity(n),
            trail_sl_based_on: Vec::with_capacity(n),
            trail_sl_by_pct: Vec::with_capacity(n),
            trail_sl_when_pct_from_avg_entry: Vec::with_capacity(n),
        }
    }

    pub fn from_settings<I: IntoIterator<Item = OrderSettings>>(settings: I) -> Self {
        let iter = settings.into_iter();
        let mut arrays = Self::with_capacity(iter.size_hint().0);
        for s in iter {
            arrays.push(s);
        }
        arrays
    }

    pub fn push(&mut self, s: OrderSettings) {
        self.leverage.push(s.leverage);
        self.max_equity_risk_pct.push(s.max_equity_risk_pct);
        self.max_equity_risk_value.push(s.max_equity_risk_value);
        self.risk_reward.push(s.risk_reward);
        self.size_pct.push(s.size_pct);
        self.size_value.push(s.size_value);
        self.sl_based_on.push(s.sl_based_on);
        self.sl_based_on_lookback.push(s.sl_based_on_lookback);
        self.sl_based_on_add_pct.push(s.sl_based_on_add_pct);
        self.sl_pct.push(s.sl_pct);
        self.sl_to_be_based_on.push(s.sl_to_be_based_on);
        self.sl_to_be_zero_or_entry.push(s.sl_to_be_zero_or_entry);
        self.sl_to_be_when_pct_from_avg_entry
            .push(s.sl_to_be_when_pct_from_avg_entry);
        self.tp_pct.push(s.tp_pct);
        self.trail_sl_based_on.push(s.trail_sl_based_on);
        self.trail_sl_by_pct.push(s.trail_sl_by_pct);
        self.trail_sl_when_pct_from_avg_entry
            .push(s.trail_sl_when_pct_from_avg_entry);
    }

    /// Number of order-setting combinations.
    pub fn len(&self) -> usize {
        self.leverage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leverage.is_empty()
    }

    /// Materialize the settings at `idx`. The caller guarantees `idx < len()`.
    #[inline]
    pub fn get(&self, idx: usize) -> OrderSettings {
        OrderSettings {
            leverage: self.leverage[idx],
            max_equity_risk_pct: self.max_equity_risk_pct[idx],
            max_equity_risk_value: self.max_equity_risk_value[idx],
            risk_reward: self.risk_reward[idx],
            size_pct: self.size_pct[idx],
            size_value: self.size_value[idx],
            sl_based_on: self.sl_based_on[idx],
            sl_based_on_lookback: self.sl_based_on_lookback[idx],
            sl_based_on_add_pct: self.sl_based_on_add_pct[idx],
            sl_pct: self.sl_pct[idx],
            sl_to_be_based_on: self.sl_to_be_based_on[idx],
            sl_to_be_zero_or_entry: self.sl_to_be_zero_or_entry[idx],
            sl_to_be_when_pct_from_avg_entry: self.sl_to_be_when_pct_from_avg_entry[idx],
            tp_pct: self.tp_pct[idx],
            trail_sl_based_on: self.trail_sl_based_on[idx],
            trail_sl_by_pct: self.trail_sl_by_pct[idx],
            trail_sl_when_pct_from_avg_entry: self.trail_sl_when_pct_from_avg_entry[idx],
        }
    }

    fn column_lengths(&self) -> [(&'static str, usize); 17] {
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

    /// Validate shape and every row before a sweep starts.
    pub fn validate(&self, statics: &StaticVariables) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::EmptyGrid);
        }
        let expected = self.len();
        for (column, len) in self.column_lengths() {
            if len != expected {
                return Err(ConfigError::ColumnLength {
                    column,
                    expected,
                    actual: len,
                });
            }
        }
        for idx in 0..expected {
            self.get(idx)
                .validate(statics)
                .map_err(|source| ConfigError::Row {
                    index: idx,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}
