//! Price and entry-signal inputs, plus the price window used for stop bases.
//!
//! Inputs arrive column-wise (4 OHLC columns per symbol, one boolean column per
//! symbol × indicator-setting) and are kept that way: each series is a
//! contiguous `Vec`, so the bar loop walks memory sequentially.

pub mod entries;
pub mod ohlc;
pub mod window;

pub use entries::EntrySignals;
pub use ohlc::{Bar, Ohlc, PriceData};
pub use window::{price_window, PriceWindow};

use thiserror::Error;

/// Malformed input arrays.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("no price data")]
    Empty,

    #[error("price data has {0} columns; expected a multiple of 4 (open, high, low, close)")]
    ColumnCount(usize),

    #[error("column {column} has {actual} bars, expected {expected}")]
    RaggedColumn {
        column: usize,
        expected: usize,
        actual: usize,
    },

    #[error("symbol {symbol} bar {bar}: {reason}")]
    BadBar {
        symbol: usize,
        bar: usize,
        reason: &'static str,
    },

    #[error("{entries} entry columns cannot be split evenly across {symbols} symbols")]
    EntryColumns { entries: usize, symbols: usize },

    #[error("entries have {entries} bars but prices have {prices}")]
    BarMismatch { entries: usize, prices: usize },
}
