//! Sweep driver: every (symbol, indicator-setting, order-setting) combination.
//!
//! Combinations are flattened row-major, order settings varying fastest.
//! Parallel mode maps the flat index range with rayon and collects in index
//! order, so the output is identical to a sequential run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use leverlab_core::buffer::{RecordBuffer, RecordError};
use leverlab_core::domain::{
    CombinationId, ConfigError, OrderRecord, OrderSettingsArrays, OrderSettingsRecord,
    StaticVariables, StrategyRecord,
};
use leverlab_core::engine::OrderContext;
use leverlab_core::prices::{DataError, EntrySignals, PriceData};

use crate::combination::{run_combination, CombinationOutcome};
use crate::config::SweepConfig;
use crate::logging::{LogLevel, LogSink, NoOpSink};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("record error: {0}")]
    Records(#[from] RecordError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("sweep aborted after {completed} of {total} combinations")]
    Aborted { completed: usize, total: usize },
}

/// Price and entry-signal inputs, checked against each other.
#[derive(Debug, Clone)]
pub struct SweepInputs {
    prices: PriceData,
    entries: EntrySignals,
    indicators_per_symbol: usize,
}

impl SweepInputs {
    pub fn new(prices: PriceData, entries: EntrySignals) -> Result<Self, DataError> {
        if entries.bars() != prices.bars() {
            return Err(DataError::BarMismatch {
                entries: entries.bars(),
                prices: prices.bars(),
            });
        }
        let indicators_per_symbol = entries.per_symbol(prices.num_symbols())?;
        Ok(Self {
            prices,
            entries,
            indicators_per_symbol,
        })
    }

    pub fn prices(&self) -> &PriceData {
        &self.prices
    }

    pub fn entries(&self) -> &EntrySignals {
        &self.entries
    }

    pub fn num_symbols(&self) -> usize {
        self.prices.num_symbols()
    }

    pub fn indicators_per_symbol(&self) -> usize {
        self.indicators_per_symbol
    }

    pub fn bars(&self) -> usize {
        self.prices.bars()
    }

    /// Combinations a grid of `order_settings` rows expands to.
    pub fn combinations(&self, order_settings: usize) -> usize {
        self.num_symbols() * self.indicators_per_symbol * order_settings
    }
}

/// Results of a completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutput {
    /// Order event log of every combination, in combination order.
    pub order_records: Vec<OrderRecord>,
    /// Summary rows that passed the filters.
    pub strategy_records: RecordBuffer<StrategyRecord>,
    /// Settings echo, one row per summary row.
    pub settings_records: RecordBuffer<OrderSettingsRecord>,
    pub combinations_run: usize,
    /// Combinations stopped by the kill switch.
    pub halted: usize,
}

/// Summary buffer capacity: `floor(combinations / divisor)`, at least 1.
pub fn summary_capacity(combinations: usize, divisor: f64) -> usize {
    ((combinations as f64 / divisor).floor() as usize).max(1)
}

/// Split a flat combination index into its triple.
pub fn combination_at(flat: usize, indicators_per_symbol: usize, order_settings: usize) -> CombinationId {
    let order = flat % order_settings;
    let rest = flat / order_settings;
    CombinationId::new(rest / indicators_per_symbol, rest % indicators_per_symbol, order)
}

pub struct SweepDriver {
    statics: StaticVariables,
    logger: Arc<dyn LogSink>,
    abort: Arc<AtomicBool>,
    parallel: bool,
    threads: Option<usize>,
    record_orders: bool,
}

impl SweepDriver {
    pub fn new(statics: StaticVariables) -> Self {
        Self {
            statics,
            logger: Arc::new(NoOpSink),
            abort: Arc::new(AtomicBool::new(false)),
            parallel: true,
            threads: None,
            record_orders: true,
        }
    }

    /// Driver with statics, parallelism and recording taken from `config`.
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.static_variables())
            .with_parallelism(config.run.parallel)
            .with_threads(config.run.threads)
            .record_orders(config.output.order_records)
    }

    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = logger;
        self
    }

    /// Flag checked between combinations; setting it ends the sweep with
    /// [`SweepError::Aborted`].
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn record_orders(mut self, record: bool) -> Self {
        self.record_orders = record;
        self
    }

    pub fn statics(&self) -> &StaticVariables {
        &self.statics
    }

    pub fn logger(&self) -> &dyn LogSink {
        self.logger.as_ref()
    }

    /// Run every combination of `inputs` against `grid`.
    pub fn run(&self, inputs: &SweepInputs, grid: &OrderSettingsArrays) -> Result<SweepOutput, SweepError> {
        self.statics.validate()?;
        grid.validate(&self.statics)?;

        let per_symbol = inputs.indicators_per_symbol();
        let total = inputs.combinations(grid.len());
        self.logger.info(&format!(
            "sweep started: {} symbols x {} indicator settings x {} order settings = {} combinations over {} bars ({})",
            inputs.num_symbols(),
            per_symbol,
            grid.len(),
            total,
            inputs.bars(),
            if self.parallel { "parallel" } else { "sequential" },
        ));

        let results: Vec<Result<Option<CombinationOutcome>, RecordError>> = if self.parallel {
            match self.threads {
                Some(threads) => {
                    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                    pool.install(|| {
                        (0..total)
                            .into_par_iter()
                            .map(|flat| self.run_flat(inputs, grid, flat))
                            .collect()
                    })
                }
                None => (0..total)
                    .into_par_iter()
                    .map(|flat| self.run_flat(inputs, grid, flat))
                    .collect(),
            }
        } else {
            (0..total).map(|flat| self.run_flat(inputs, grid, flat)).collect()
        };

        let output = self.compact(inputs, grid, results, total)?;
        self.logger.info(&format!(
            "sweep finished: {} combinations, {} halted, {} summary rows kept, {} order records",
            output.combinations_run,
            output.halted,
            output.strategy_records.filled(),
            output.order_records.len(),
        ));
        if let Err(e) = self.logger.flush() {
            log::warn!("failed to flush sweep log: {e}");
        }
        Ok(output)
    }

    /// `None` when the abort flag was set before the combination started.
    fn run_flat(
        &self,
        inputs: &SweepInputs,
        grid: &OrderSettingsArrays,
        flat: usize,
    ) -> Result<Option<CombinationOutcome>, RecordError> {
        if self.abort.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let id = combination_at(flat, inputs.indicators_per_symbol(), grid.len());
        let symbol = id.symbol_idx as usize;
        let indicator = id.indicator_settings_idx as usize;
        let settings = grid.get(id.order_settings_idx as usize);
        let ctx = OrderContext::new(&self.statics, settings, id);

        let entries = inputs
            .entries()
            .column(symbol, indicator, inputs.indicators_per_symbol());
        let outcome = run_combination(inputs.prices().symbol(symbol), entries, &ctx, self.record_orders)?;

        if let Some(bar) = outcome.halted_at {
            self.logger.warn(&format!(
                "kill switch: combination ({symbol}, {indicator}, {}) halted at bar {bar} with available balance {:.2}",
                id.order_settings_idx, outcome.account.available_balance,
            ));
        } else if self.logger.enabled(LogLevel::Debug) {
            self.logger.debug(&format!(
                "combination ({symbol}, {indicator}, {}): {} trades, equity {:.2}",
                id.order_settings_idx, outcome.stats.total_trades, outcome.account.equity,
            ));
        }
        Ok(Some(outcome))
    }

    fn compact(
        &self,
        inputs: &SweepInputs,
        grid: &OrderSettingsArrays,
        results: Vec<Result<Option<CombinationOutcome>, RecordError>>,
        total: usize,
    ) -> Result<SweepOutput, SweepError> {
        let capacity = summary_capacity(total, self.statics.divide_records_array_size_by);
        let mut strategy_records = RecordBuffer::with_capacity(capacity);
        let mut settings_records = RecordBuffer::with_capacity(capacity);
        let mut order_records = Vec::new();
        let mut completed = 0;
        let mut halted = 0;

        for (flat, result) in results.into_iter().enumerate() {
            let Some(outcome) = result? else {
                continue;
            };
            completed += 1;
            if outcome.halted_at.is_some() {
                halted += 1;
            }
            order_records.extend(outcome.order_records);
            if let Some(summary) = outcome.summary {
                let id = combination_at(flat, inputs.indicators_per_symbol(), grid.len());
                let settings = grid.get(id.order_settings_idx as usize);
                strategy_records.push(summary)?;
                settings_records.push(OrderSettingsRecord::new(id, &settings))?;
            }
        }

        if completed < total {
            self.logger.warn(&format!("sweep aborted after {completed} of {total} combinations"));
            if let Err(e) = self.logger.flush() {
                log::warn!("failed to flush sweep log: {e}");
            }
            return Err(SweepError::Aborted { completed, total });
        }

        Ok(SweepOutput {
            order_records,
            strategy_records,
            settings_records,
            combinations_run: completed,
            halted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_index_is_row_major() {
        // 2 indicators per symbol, 3 order settings
        assert_eq!(combination_at(0, 2, 3), CombinationId::new(0, 0, 0));
        assert_eq!(combination_at(2, 2, 3), CombinationId::new(0, 0, 2));
        assert_eq!(combination_at(3, 2, 3), CombinationId::new(0, 1, 0));
        assert_eq!(combination_at(6, 2, 3), CombinationId::new(1, 0, 0));
        assert_eq!(combination_at(11, 2, 3), CombinationId::new(1, 1, 2));
    }

    #[test]
    fn summary_capacity_floors_with_minimum() {
        assert_eq!(summary_capacity(10, 1.0), 10);
        assert_eq!(summary_capacity(10, 3.0), 3);
        assert_eq!(summary_capacity(2, 5.0), 1);
    }

    #[test]
    fn inputs_reject_mismatched_bars() {
        let prices = PriceData::from_columns(vec![vec![10.0; 3]; 4]).unwrap();
        let entries = EntrySignals::from_columns(vec![vec![false; 2]]).unwrap();
        assert!(matches!(
            SweepInputs::new(prices, entries),
            Err(DataError::BarMismatch { entries: 2, prices: 3 })
        ));
    }

    #[test]
    fn inputs_reject_uneven_entry_columns() {
        let prices = PriceData::from_columns(vec![vec![10.0; 3]; 8]).unwrap();
        let entries = EntrySignals::from_columns(vec![vec![false; 3]; 3]).unwrap();
        assert!(matches!(
            SweepInputs::new(prices, entries),
            Err(DataError::EntryColumns { entries: 3, symbols: 2 })
        ));
    }
}
