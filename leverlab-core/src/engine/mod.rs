//! Order engine: execution of entries and exits, and per-bar stop evaluation.
//!
//! Per bar the driver calls, in order:
//!
//! 1. [`process_order`] with an entry request when the bar has an entry signal
//! 2. [`check_stops`] while a position is open, then either
//!    [`process_order`] with the exit it returned or [`apply_adjustment`]

pub mod context;
pub mod cost_model;
pub mod execution;
pub mod ratchet;
pub mod sizing;
pub mod stops;

pub use context::OrderContext;
pub use cost_model::FeeModel;
pub use execution::{process_order, OrderOutcome, OrderRequest};
pub use ratchet::StopRatchet;
pub use stops::{apply_adjustment, check_stops, StopAdjustment, StopDecision};
