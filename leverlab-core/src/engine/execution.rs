//! Order execution: entry sizing and fills, forced exits.
//!
//! Entries are filled at the bar's open, exits at the price the stop evaluator
//! hands over. A rejected or ignored request changes only the status codes on
//! the order result; account and position stay untouched and no record is written.

use super::context::OrderContext;
use super::sizing::{liquidation_price, max_affordable_notional, select_leverage, target_notional};
use crate::buffer::{RecordBuffer, RecordError};
use crate::domain::{
    AccountState, OrderRecord, OrderResult, OrderStatus, OrderStatusInfo, OrderType, Side,
};
use crate::prices::PriceWindow;

/// Relative slack on the risk cap, so a risk target equal to the cap is accepted.
const RISK_CAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub enum OrderRequest<'a> {
    /// Entry signal at `bar_index`, filled at `window.entry`.
    Entry {
        bar_index: usize,
        window: PriceWindow<'a>,
    },
    /// Forced exit of the whole position at `price`.
    Exit {
        bar_index: usize,
        price: f64,
        order_type: OrderType,
        info: OrderStatusInfo,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderOutcome {
    Filled,
    Exited { realized_pnl: f64 },
    Ignored(OrderStatusInfo),
    Rejected(OrderStatusInfo),
}

impl OrderOutcome {
    pub fn is_fill(&self) -> bool {
        matches!(self, OrderOutcome::Filled | OrderOutcome::Exited { .. })
    }
}

/// Process one request against the combination's account and position.
///
/// The only error is a full record buffer.
pub fn process_order(
    ctx: &OrderContext<'_>,
    account: &mut AccountState,
    result: &mut OrderResult,
    request: OrderRequest<'_>,
    writer: &mut RecordBuffer<OrderRecord>,
) -> Result<OrderOutcome, RecordError> {
    let outcome = match request {
        OrderRequest::Entry { bar_index, window } => {
            match plan_entry(ctx, account, result, &window) {
                Ok(plan) => {
                    fill_entry(ctx, account, result, &plan);
                    writer.push(OrderRecord::capture(ctx.combination, bar_index, result, account))?;
                    OrderOutcome::Filled
                }
                Err(refusal) => {
                    result.set_status(refusal.status(), refusal.info());
                    refusal.into_outcome()
                }
            }
        }
        OrderRequest::Exit {
            bar_index,
            price,
            order_type,
            info,
        } => {
            if !result.has_position() {
                result.set_status(OrderStatus::Ignored, OrderStatusInfo::HopefullyNoProblems);
                return Ok(OrderOutcome::Ignored(OrderStatusInfo::HopefullyNoProblems));
            }
            let realized_pnl = fill_exit(ctx, account, result, price, order_type, info);
            writer.push(OrderRecord::capture(ctx.combination, bar_index, result, account))?;
            result.clear_position();
            OrderOutcome::Exited { realized_pnl }
        }
    };
    account.debug_check();
    Ok(outcome)
}

/// Why an entry request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refusal {
    Ignored(OrderStatusInfo),
    Rejected(OrderStatusInfo),
}

impl Refusal {
    fn status(self) -> OrderStatus {
        match self {
            Refusal::Ignored(_) => OrderStatus::Ignored,
            Refusal::Rejected(_) => OrderStatus::Rejected,
        }
    }

    fn info(self) -> OrderStatusInfo {
        match self {
            Refusal::Ignored(info) | Refusal::Rejected(info) => info,
        }
    }

    fn into_outcome(self) -> OrderOutcome {
        match self {
            Refusal::Ignored(info) => OrderOutcome::Ignored(info),
            Refusal::Rejected(info) => OrderOutcome::Rejected(info),
        }
    }
}

/// A sized entry, ready to fill.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EntryPlan {
    price: f64,
    notional: f64,
    margin: f64,
    fee: f64,
    units: f64,
    average_entry: f64,
    sl_price: f64,
    leverage: f64,
}

fn plan_entry(
    ctx: &OrderContext<'_>,
    account: &AccountState,
    result: &OrderResult,
    window: &PriceWindow<'_>,
) -> Result<EntryPlan, Refusal> {
    let statics = ctx.statics;
    let settings = &ctx.settings;
    let side = ctx.side;
    let sign = side.sign();
    let increasing = result.has_position();

    if increasing && !statics.allow_position_increase {
        return Err(Refusal::Ignored(OrderStatusInfo::PositionAlreadyOpen));
    }

    let price = window.entry;
    let basis_stop = settings.sl_based_on.map(|basis| match side {
        Side::Long => window.lowest(basis) * (1.0 - settings.sl_based_on_add_pct),
        Side::Short => window.highest(basis) * (1.0 + settings.sl_based_on_add_pct),
    });
    let sl_from_entry = match (basis_stop, settings.sl_pct) {
        (Some(sl), _) => sl,
        (None, Some(pct)) => price * (1.0 - sign * pct),
        (None, None) => f64::NAN,
    };
    let sl_pct = sign * (price - sl_from_entry) / price;
    if !(sl_pct > 0.0 && sl_pct.is_finite()) {
        return Err(Refusal::Rejected(OrderStatusInfo::InvalidStopLoss));
    }

    let leverage = select_leverage(statics, settings, sl_pct);
    let mut notional = target_notional(statics, settings, &ctx.fees, side, account.equity, sl_pct);
    if !(notional.is_finite() && notional > 0.0) {
        return Err(Refusal::Rejected(OrderStatusInfo::SizeTooSmall));
    }

    let (units, average_entry, sl_price) = resulting_position(ctx, result, price, notional, basis_stop);
    if !(sign * (price - sl_price) > 0.0) {
        return Err(Refusal::Rejected(OrderStatusInfo::InvalidStopLoss));
    }

    let cap = settings.max_equity_risk(account.equity);
    let entry_fees = result.entry_fees + ctx.fees.fee(notional);
    let possible_loss = ctx
        .fees
        .loss_at_stop(side, average_entry, sl_price, units, entry_fees);
    if possible_loss > cap * (1.0 + RISK_CAP_TOLERANCE) {
        return Err(Refusal::Rejected(OrderStatusInfo::MaxEquityRisk));
    }

    let mut scaled = false;
    if notional / leverage + ctx.fees.fee(notional) > account.available_balance {
        notional = max_affordable_notional(account.available_balance, leverage, &ctx.fees);
        scaled = true;
    }
    if notional < statics.min_order_size_value || notional <= 0.0 {
        let info = if scaled {
            OrderStatusInfo::InsufficientBalance
        } else {
            OrderStatusInfo::SizeTooSmall
        };
        return Err(Refusal::Rejected(info));
    }
    if notional > statics.max_order_size_value {
        return Err(Refusal::Rejected(OrderStatusInfo::SizeTooLarge));
    }

    let (units, average_entry, sl_price) = if scaled {
        resulting_position(ctx, result, price, notional, basis_stop)
    } else {
        (units, average_entry, sl_price)
    };

    Ok(EntryPlan {
        price,
        notional,
        margin: notional / leverage,
        fee: ctx.fees.fee(notional),
        units,
        average_entry,
        sl_price,
        leverage,
    })
}

/// Units, average entry and stop of the position after adding `notional` at `price`.
///
/// A percentage stop is placed off the new average entry. When adding to a
/// position the stop never loosens.
fn resulting_position(
    ctx: &OrderContext<'_>,
    result: &OrderResult,
    price: f64,
    notional: f64,
    basis_stop: Option<f64>,
) -> (f64, f64, f64) {
    let add_units = notional / price;
    let units = result.position + add_units;
    let average_entry = (result.average_entry * result.position + price * add_units) / units;
    let sl = match (basis_stop, ctx.settings.sl_pct) {
        (Some(sl), _) => sl,
        (None, Some(pct)) => average_entry * (1.0 - ctx.side.sign() * pct),
        (None, None) => f64::NAN,
    };
    let sl = if result.has_position() && !ctx.side.is_tighter(sl, result.sl_price) {
        result.sl_price
    } else {
        sl
    };
    (units, average_entry, sl)
}

fn fill_entry(ctx: &OrderContext<'_>, account: &mut AccountState, result: &mut OrderResult, plan: &EntryPlan) {
    let side = ctx.side;
    let sign = side.sign();
    let settings = &ctx.settings;

    account.available_balance -= plan.margin + plan.fee;
    account.cash_used += plan.margin;
    account.cash_borrowed += plan.notional - plan.margin;
    account.equity = account.available_balance + account.cash_used;

    let avg = plan.average_entry;
    let sl = plan.sl_price;
    // Effective leverage of the whole position, so stacked fills share one liquidation price.
    let leverage = (plan.units * avg) / account.cash_used;

    result.position = plan.units;
    result.average_entry = avg;
    result.price = plan.price;
    result.size_value = plan.notional;
    result.leverage = leverage;
    result.fees_paid = plan.fee;
    result.entry_fees += plan.fee;
    result.realized_pnl = 0.0;
    result.pct_chg_trade = 0.0;
    result.sl_price = sl;
    result.sl_pct = sign * (avg - sl) / avg;
    result.tp_price = match (settings.risk_reward, settings.tp_pct) {
        (Some(rr), _) => avg + rr * (avg - sl),
        (None, Some(tp)) => avg * (1.0 + sign * tp),
        (None, None) => f64::NAN,
    };
    result.tp_pct = if result.tp_price.is_nan() {
        f64::NAN
    } else {
        sign * (result.tp_price - avg) / avg
    };
    result.liq_price = liquidation_price(side, avg, leverage, ctx.statics.mmr_pct);
    result.order_type = side.entry_type();
    result.set_status(OrderStatus::Filled, OrderStatusInfo::HopefullyNoProblems);
}

/// Close the whole position at `price`. Returns the net realized pnl.
fn fill_exit(
    ctx: &OrderContext<'_>,
    account: &mut AccountState,
    result: &mut OrderResult,
    price: f64,
    order_type: OrderType,
    info: OrderStatusInfo,
) -> f64 {
    let sign = ctx.side.sign();
    let units = result.position;
    let avg = result.average_entry;

    let gross = sign * (price - avg) * units;
    let exit_fee = ctx.fees.fee(price * units);
    let realized = gross - exit_fee - result.entry_fees;

    account.available_balance += account.cash_used + gross - exit_fee;
    account.cash_used = 0.0;
    account.cash_borrowed = 0.0;
    account.equity = account.available_balance;

    result.price = price;
    result.fees_paid = exit_fee;
    result.realized_pnl = realized;
    result.pct_chg_trade = sign * (price - avg) / avg;
    result.order_type = order_type;
    result.set_status(OrderStatus::Filled, info);
    realized
}
