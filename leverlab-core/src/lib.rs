//! LeverLab Core — domain types, price windows, order execution, stop evaluation.
//!
//! This crate holds everything a single combination needs to simulate:
//! - Domain types (account state, order settings grid, order results, records)
//! - Price and entry-signal inputs and the price window extractor
//! - Order execution engine (sizing, fees, liquidation, exits)
//! - Stop evaluator (liquidation / stop loss / take profit, break-even, trailing)
//! - Growth-bounded record buffers
//!
//! The sweep over combinations lives in `leverlab-runner`.

pub mod buffer;
pub mod domain;
pub mod engine;
pub mod prices;
