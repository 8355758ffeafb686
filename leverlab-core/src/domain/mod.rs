//! Domain types: account state, order settings, order results, records, codes.

pub mod account;
pub mod codes;
pub mod order_result;
pub mod records;
pub mod settings;
pub mod static_vars;

pub use account::{AccountState, MIN_AVAILABLE_BALANCE};
pub use codes::{
    BreakEvenTarget, CandleBody, LeverageMode, OrderStatus, OrderStatusInfo, OrderType, Side,
    SizeType, UnknownCode,
};
pub use order_result::OrderResult;
pub use records::{CombinationId, OrderRecord, OrderSettingsRecord, StrategyRecord};
pub use settings::{OrderSettings, OrderSettingsArrays};
pub use static_vars::StaticVariables;

use thiserror::Error;

/// Invalid run configuration, detected before a sweep starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("order settings grid is empty")]
    EmptyGrid,

    #[error("order settings column '{column}' has {actual} rows, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("order settings row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
