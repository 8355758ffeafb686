//! One combination, bar by bar.
//!
//! Per bar: kill switch, then the entry signal, then the stop evaluator on the
//! open position. State is private to the call, so combinations can run on
//! any worker.

use leverlab_core::buffer::{RecordBuffer, RecordError};
use leverlab_core::domain::{
    AccountState, OrderRecord, OrderResult, OrderStatus, OrderStatusInfo, StrategyRecord,
};
use leverlab_core::engine::{
    apply_adjustment, check_stops, process_order, OrderContext, OrderOutcome, OrderRequest,
    StopDecision,
};
use leverlab_core::prices::{price_window, Ohlc};

use crate::metrics::TradeStats;

/// Everything one combination produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationOutcome {
    /// Order event log; empty when recording is off.
    pub order_records: Vec<OrderRecord>,
    /// Net pnl of every closed trade, in exit order.
    pub trade_pnls: Vec<f64>,
    pub account: AccountState,
    /// Entry and exit fees of every fill.
    pub total_fees: f64,
    /// Bar at which the kill switch fired.
    pub halted_at: Option<usize>,
    /// Whether a position was still open after the last processed bar.
    pub open_at_end: bool,
    pub stats: TradeStats,
    /// Summary row, present only when the statistics pass the filters.
    pub summary: Option<StrategyRecord>,
}

/// Order record capacity for a series of `bars`: at most two actions per bar.
pub fn order_record_capacity(bars: usize) -> usize {
    bars.saturating_mul(2).max(1)
}

/// Replay `entries` over `ohlc` for the combination described by `ctx`.
///
/// Starts from a fresh account holding the static equity and a flat position.
/// The only error is an exhausted order record buffer.
pub fn run_combination(
    ohlc: &Ohlc,
    entries: &[bool],
    ctx: &OrderContext<'_>,
    record_orders: bool,
) -> Result<CombinationOutcome, RecordError> {
    let statics = ctx.statics;
    let bars = ohlc.len().min(entries.len());
    let mut account = AccountState::new(statics.equity);
    let mut result = OrderResult::new(statics.order_type);
    let mut writer = RecordBuffer::with_capacity(order_record_capacity(bars));
    let mut trade_pnls = Vec::new();
    let mut total_fees = 0.0;
    let mut halted_at = None;

    for bar_index in 0..bars {
        if account.is_depleted() {
            result.order_status = OrderStatus::Halted;
            result.order_status_info = OrderStatusInfo::KillSwitch;
            writer.push(OrderRecord::capture(ctx.combination, bar_index, &result, &account))?;
            halted_at = Some(bar_index);
            break;
        }

        if entries[bar_index] {
            let window = price_window(bar_index, ohlc, &ctx.settings);
            let outcome = process_order(
                ctx,
                &mut account,
                &mut result,
                OrderRequest::Entry { bar_index, window },
                &mut writer,
            )?;
            if outcome == OrderOutcome::Filled {
                total_fees += result.fees_paid;
            }
        }

        if !result.has_position() {
            continue;
        }
        match check_stops(ctx, &result, ohlc.bar(bar_index), bar_index + 1 == bars) {
            StopDecision::Hold => {}
            StopDecision::Exit {
                price,
                order_type,
                info,
            } => {
                let outcome = process_order(
                    ctx,
                    &mut account,
                    &mut result,
                    OrderRequest::Exit {
                        bar_index,
                        price,
                        order_type,
                        info,
                    },
                    &mut writer,
                )?;
                if let OrderOutcome::Exited { realized_pnl } = outcome {
                    total_fees += result.fees_paid;
                    trade_pnls.push(realized_pnl);
                }
            }
            StopDecision::Adjust(adjustment) => {
                apply_adjustment(ctx, bar_index, &account, &mut result, adjustment, &mut writer)?;
            }
        }
    }

    let stats = TradeStats::from_pnls(&trade_pnls, statics.equity, account.equity, total_fees);
    let summary = stats
        .passes_filters(statics)
        .then(|| stats.to_record(ctx.combination));

    Ok(CombinationOutcome {
        order_records: if record_orders {
            writer.into_vec()
        } else {
            Vec::new()
        },
        trade_pnls,
        account,
        total_fees,
        halted_at,
        open_at_end: result.has_position(),
        stats,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use leverlab_core::domain::{CombinationId, OrderSettings, OrderType, StaticVariables};
    use leverlab_core::prices::Bar;

    fn flat(n: usize) -> Ohlc {
        Ohlc::from_bars(&vec![Bar::new(100.0, 100.0, 100.0, 100.0); n])
    }

    #[test]
    fn no_signals_no_records() {
        let statics = StaticVariables::default();
        let ctx = OrderContext::new(&statics, OrderSettings::default(), CombinationId::new(0, 0, 0));
        let out = run_combination(&flat(5), &[false; 5], &ctx, true).unwrap();
        assert!(out.order_records.is_empty());
        assert!(out.trade_pnls.is_empty());
        assert_eq!(out.account, AccountState::new(1_000.0));
        // total_trade_filter defaults to 1
        assert!(out.summary.is_none());
    }

    #[test]
    fn end_of_data_exit_counts_as_trade() {
        let statics = StaticVariables {
            close_at_end_of_data: true,
            total_trade_filter: 0,
            ..StaticVariables::default()
        };
        let ctx = OrderContext::new(&statics, OrderSettings::default(), CombinationId::new(1, 2, 3));
        let mut entries = [false; 4];
        entries[0] = true;
        let out = run_combination(&flat(4), &entries, &ctx, true).unwrap();

        assert_eq!(out.order_records.len(), 2);
        assert_eq!(out.order_records[0].order_type, OrderType::LongEntry);
        assert_eq!(out.order_records[1].order_status_info, OrderStatusInfo::EndOfData);
        assert_eq!(out.trade_pnls.len(), 1);
        // a flat round trip loses exactly the fees
        assert!((out.trade_pnls[0] + out.total_fees).abs() < 1e-9);
        assert!(!out.open_at_end);

        let summary = out.summary.unwrap();
        assert_eq!(summary.order_settings_idx, 3);
        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.losses, 1);
    }

    #[test]
    fn long_run_keeps_only_written_records() {
        let statics = StaticVariables {
            close_at_end_of_data: true,
            ..StaticVariables::default()
        };
        let ctx = OrderContext::new(&statics, OrderSettings::default(), CombinationId::new(0, 0, 0));
        let mut entries = vec![false; 10_000];
        entries[0] = true;
        let out = run_combination(&flat(10_000), &entries, &ctx, true).unwrap();
        assert_eq!(out.order_records.len(), 2);
        assert_eq!(out.order_records.capacity(), out.order_records.len());
    }

    #[test]
    fn recording_off_keeps_statistics() {
        let statics = StaticVariables {
            close_at_end_of_data: true,
            ..StaticVariables::default()
        };
        let ctx = OrderContext::new(&statics, OrderSettings::default(), CombinationId::new(0, 0, 0));
        let entries = [true, false, false];
        let on = run_combination(&flat(3), &entries, &ctx, true).unwrap();
        let off = run_combination(&flat(3), &entries, &ctx, false).unwrap();
        assert!(off.order_records.is_empty());
        assert_eq!(on.trade_pnls, off.trade_pnls);
        assert_eq!(on.account, off.account);
    }

    #[test]
    fn capacity_two_per_bar() {
        assert_eq!(order_record_capacity(10), 20);
        assert_eq!(order_record_capacity(0), 1);
    }
}
