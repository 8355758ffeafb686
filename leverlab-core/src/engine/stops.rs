//! Stop evaluator: breach detection, break-even moves and trailing stops.
//!
//! Priority per bar is liquidation, then stop loss, then take profit. The first
//! breach exits at its trigger level. A bar with no breach may move the stop.

use super::context::OrderContext;
use super::ratchet::StopRatchet;
use crate::buffer::{RecordBuffer, RecordError};
use crate::domain::{
    AccountState, BreakEvenTarget, OrderRecord, OrderResult, OrderStatus, OrderStatusInfo,
    OrderType, Side,
};
use crate::prices::Bar;

/// New stop state produced by a bar without a breach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopAdjustment {
    pub sl_price: f64,
    pub moved_sl_to_be: bool,
    pub order_type: OrderType,
    pub info: OrderStatusInfo,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopDecision {
    Hold,
    Exit {
        price: f64,
        order_type: OrderType,
        info: OrderStatusInfo,
    },
    Adjust(StopAdjustment),
}

/// Level has been touched by this bar on the adverse side.
#[inline]
fn adverse_touch(side: Side, bar: &Bar, level: f64) -> bool {
    match side {
        Side::Long => bar.low <= level,
        Side::Short => bar.high >= level,
    }
}

/// Level has been touched by this bar on the favorable side.
#[inline]
fn favorable_touch(side: Side, bar: &Bar, level: f64) -> bool {
    match side {
        Side::Long => bar.high >= level,
        Side::Short => bar.low <= level,
    }
}

/// Evaluate the open position against `bar`.
pub fn check_stops(ctx: &OrderContext<'_>, result: &OrderResult, bar: Bar, is_last_bar: bool) -> StopDecision {
    if !result.has_position() {
        return StopDecision::Hold;
    }
    let side = ctx.side;

    if result.liq_price.is_finite() && adverse_touch(side, &bar, result.liq_price) {
        return StopDecision::Exit {
            price: result.liq_price,
            order_type: side.liquidation_type(),
            info: OrderStatusInfo::Liquidation,
        };
    }
    if result.sl_price.is_finite() && adverse_touch(side, &bar, result.sl_price) {
        let (order_type, info) = if result.sl_moved {
            (side.trailing_stop_type(), OrderStatusInfo::TrailingStop)
        } else {
            (side.stop_loss_type(), OrderStatusInfo::StopLoss)
        };
        return StopDecision::Exit {
            price: result.sl_price,
            order_type,
            info,
        };
    }
    if result.tp_price.is_finite() && favorable_touch(side, &bar, result.tp_price) {
        return StopDecision::Exit {
            price: result.tp_price,
            order_type: side.take_profit_type(),
            info: OrderStatusInfo::TakeProfit,
        };
    }
    if is_last_bar && ctx.statics.close_at_end_of_data {
        return StopDecision::Exit {
            price: bar.close,
            order_type: side.exit_type(),
            info: OrderStatusInfo::EndOfData,
        };
    }

    match adjust_stop(ctx, result, &bar) {
        Some(adj) => StopDecision::Adjust(adj),
        None => StopDecision::Hold,
    }
}

fn adjust_stop(ctx: &OrderContext<'_>, result: &OrderResult, bar: &Bar) -> Option<StopAdjustment> {
    let settings = &ctx.settings;
    let side = ctx.side;
    let avg = result.average_entry;
    let mut ratchet = StopRatchet::new(side, result.sl_price);
    let mut moved_to_be = false;
    let mut trailed = false;

    if let (Some(basis), Some(when), false) = (
        settings.sl_to_be_based_on,
        settings.sl_to_be_when_pct_from_avg_entry,
        result.moved_sl_to_be,
    ) {
        if side.favorable_pct(avg, bar.get(basis)) >= when {
            let target = match settings.sl_to_be_zero_or_entry {
                BreakEvenTarget::AverageEntry => avg,
                BreakEvenTarget::ZeroLoss => ctx.fees.zero_loss_price(side, avg),
            };
            ratchet.apply(target);
            moved_to_be = true;
        }
    }

    let be_reached = result.moved_sl_to_be || moved_to_be;
    if let (Some(basis), Some(by), Some(when)) = (
        settings.trail_sl_based_on,
        settings.trail_sl_by_pct,
        settings.trail_sl_when_pct_from_avg_entry,
    ) {
        if be_reached || !ctx.statics.sl_to_be_then_trail {
            let level = bar.get(basis);
            if side.favorable_pct(avg, level) >= when {
                let before = ratchet.level();
                trailed = ratchet.apply(level * (1.0 - side.sign() * by)) != before;
            }
        }
    }

    let (order_type, info) = if trailed {
        (OrderType::MovedTrailingStop, OrderStatusInfo::MovedTrailingStop)
    } else if moved_to_be {
        (OrderType::MovedStopToBreakEven, OrderStatusInfo::MovedToBreakEven)
    } else {
        return None;
    };
    Some(StopAdjustment {
        sl_price: ratchet.level(),
        moved_sl_to_be: be_reached,
        order_type,
        info,
    })
}

/// Write `adjustment` into the order result and record it.
pub fn apply_adjustment(
    ctx: &OrderContext<'_>,
    bar_index: usize,
    account: &AccountState,
    result: &mut OrderResult,
    adjustment: StopAdjustment,
    writer: &mut RecordBuffer<OrderRecord>,
) -> Result<(), RecordError> {
    let avg = result.average_entry;
    if adjustment.sl_price != result.sl_price {
        result.sl_moved = true;
    }
    result.sl_price = adjustment.sl_price;
    result.sl_pct = ctx.side.sign() * (avg - adjustment.sl_price) / avg;
    result.moved_sl_to_be |= adjustment.moved_sl_to_be;
    result.order_type = adjustment.order_type;
    result.set_status(OrderStatus::Adjusted, adjustment.info);
    writer.push(OrderRecord::capture(ctx.combination, bar_index, result, account))?;
    Ok(())
}
