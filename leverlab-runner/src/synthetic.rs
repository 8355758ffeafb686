//! Seeded synthetic inputs for demos, benchmarks and tests.
//!
//! Prices follow a multiplicative random walk with wicks; entry signals fire
//! independently per bar with a fixed probability. The same seed always
//! produces the same inputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use leverlab_core::prices::{Bar, DataError, EntrySignals, Ohlc, PriceData};

use crate::sweep::SweepInputs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub symbols: usize,
    pub bars: usize,
    pub indicators_per_symbol: usize,
    pub seed: u64,
    pub start_price: f64,
    /// Half-width of the per-bar close-to-close return.
    pub max_step: f64,
    /// Largest wick beyond the body, as a fraction of price.
    pub max_wick: f64,
    pub entry_probability: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            symbols: 1,
            bars: 500,
            indicators_per_symbol: 1,
            seed: 42,
            start_price: 100.0,
            max_step: 0.02,
            max_wick: 0.01,
            entry_probability: 0.05,
        }
    }
}

/// Random-walk OHLC series of `bars` bars.
pub fn random_walk(rng: &mut StdRng, bars: usize, start_price: f64, max_step: f64, max_wick: f64) -> Ohlc {
    let mut close = start_price;
    let series: Vec<Bar> = (0..bars)
        .map(|_| {
            let open = close;
            let step = if max_step > 0.0 {
                rng.gen_range(-max_step..max_step)
            } else {
                0.0
            };
            close = (open * (1.0 + step)).max(0.01);
            let (up, down) = if max_wick > 0.0 {
                (rng.gen_range(0.0..max_wick), rng.gen_range(0.0..max_wick))
            } else {
                (0.0, 0.0)
            };
            let high = open.max(close) * (1.0 + up);
            let low = open.min(close) * (1.0 - down);
            Bar::new(open, high, low, close)
        })
        .collect();
    Ohlc::from_bars(&series)
}

/// Independent entry signals firing with probability `p`.
pub fn random_signals(rng: &mut StdRng, bars: usize, p: f64) -> Vec<bool> {
    let p = p.clamp(0.0, 1.0);
    (0..bars).map(|_| rng.gen_bool(p)).collect()
}

/// Generate validated sweep inputs.
pub fn generate(config: &SyntheticConfig) -> Result<SweepInputs, DataError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let symbols = (0..config.symbols)
        .map(|_| {
            random_walk(
                &mut rng,
                config.bars,
                config.start_price,
                config.max_step,
                config.max_wick,
            )
        })
        .collect();
    let prices = PriceData::from_symbols(symbols)?;
    let columns = (0..config.symbols * config.indicators_per_symbol)
        .map(|_| random_signals(&mut rng, config.bars, config.entry_probability))
        .collect();
    let entries = EntrySignals::from_columns(columns)?;
    SweepInputs::new(prices, entries)
}
