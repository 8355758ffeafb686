//! Numeric codes carried on order results and records.
//!
//! Every code is a `u8` on the wire: records serialize the discriminant, not the
//! variant name, so downstream tools can store them in fixed-width columns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a raw code does not map to a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code {value}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: u8,
}

macro_rules! u8_code {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u8", try_from = "u8")]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl From<$name> for u8 {
            fn from(code: $name) -> u8 {
                code as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(UnknownCode { kind: $kind, value }),
                }
            }
        }
    };
}

u8_code! {
    /// What kind of order an action was.
    OrderType, "order type" {
        LongEntry = 0,
        ShortEntry = 1,
        LongStopLoss = 2,
        LongTrailingStop = 3,
        LongTakeProfit = 4,
        LongLiquidation = 5,
        /// Long position closed at the last bar's close.
        LongExit = 6,
        ShortStopLoss = 7,
        ShortTrailingStop = 8,
        ShortTakeProfit = 9,
        ShortLiquidation = 10,
        ShortExit = 11,
        MovedStopToBreakEven = 12,
        MovedTrailingStop = 13,
    }
}

u8_code! {
    /// Outcome of the last order action.
    OrderStatus, "order status" {
        /// Reset default: nothing has happened yet.
        NoAction = 0,
        Filled = 1,
        Ignored = 2,
        Rejected = 3,
        /// Stop moved, no fill.
        Adjusted = 4,
        /// Combination stopped by the kill switch.
        Halted = 5,
    }
}

u8_code! {
    /// Reason attached to the last order action.
    OrderStatusInfo, "order status info" {
        HopefullyNoProblems = 0,
        MaxEquityRisk = 1,
        SizeTooSmall = 2,
        SizeTooLarge = 3,
        InsufficientBalance = 4,
        InvalidStopLoss = 5,
        PositionAlreadyOpen = 6,
        StopLoss = 7,
        TrailingStop = 8,
        TakeProfit = 9,
        Liquidation = 10,
        MovedToBreakEven = 11,
        MovedTrailingStop = 12,
        EndOfData = 13,
        KillSwitch = 14,
    }
}

/// Trade direction, fixed per run by the entry order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// `+1.0` for long, `-1.0` for short.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// Signed percentage move from `reference` to `price`, positive when favorable.
    #[inline]
    pub fn favorable_pct(self, reference: f64, price: f64) -> f64 {
        self.sign() * (price - reference) / reference
    }

    /// True when `candidate` is a tighter stop than `current`.
    #[inline]
    pub fn is_tighter(self, candidate: f64, current: f64) -> bool {
        match self {
            Side::Long => candidate > current,
            Side::Short => candidate < current,
        }
    }

    pub fn entry_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongEntry,
            Side::Short => OrderType::ShortEntry,
        }
    }

    pub fn stop_loss_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongStopLoss,
            Side::Short => OrderType::ShortStopLoss,
        }
    }

    pub fn trailing_stop_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongTrailingStop,
            Side::Short => OrderType::ShortTrailingStop,
        }
    }

    pub fn take_profit_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongTakeProfit,
            Side::Short => OrderType::ShortTakeProfit,
        }
    }

    pub fn liquidation_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongLiquidation,
            Side::Short => OrderType::ShortLiquidation,
        }
    }

    pub fn exit_type(self) -> OrderType {
        match self {
            Side::Long => OrderType::LongExit,
            Side::Short => OrderType::ShortExit,
        }
    }
}

impl OrderType {
    /// Direction of an entry order type; `None` for exits and adjustments.
    pub fn entry_side(self) -> Option<Side> {
        match self {
            OrderType::LongEntry => Some(Side::Long),
            OrderType::ShortEntry => Some(Side::Short),
            _ => None,
        }
    }
}

/// Which price series of a candle to use as a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleBody {
    Open,
    High,
    Low,
    Close,
}

/// Where a break-even move puts the stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakEvenTarget {
    /// Price at which the trade nets zero after entry and exit fees.
    #[default]
    ZeroLoss,
    AverageEntry,
}

/// How the notional of an entry is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeType {
    /// Notional equals `size_value`.
    Amount,
    /// Notional equals `size_pct` of equity.
    PercentOfAccount,
    /// Loss at the stop (fees included) equals `size_value`.
    RiskAmount,
    /// Loss at the stop (fees included) equals `size_pct` of equity.
    #[default]
    RiskPercentOfAccount,
}

/// How leverage is chosen for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageMode {
    /// Use the configured leverage as-is.
    #[default]
    Isolated,
    /// Smallest margin that keeps liquidation beyond the stop loss.
    LeastFreeCashUsed,
}
