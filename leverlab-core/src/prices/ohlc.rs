use super::DataError;
use crate::domain::CandleBody;

/// Scalar OHLC values of one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    #[inline]
    pub fn get(&self, body: CandleBody) -> f64 {
        match body {
            CandleBody::Open => self.open,
            CandleBody::High => self.high,
            CandleBody::Low => self.low,
            CandleBody::Close => self.close,
        }
    }
}

/// OHLC series of one symbol.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ohlc {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl Ohlc {
    /// Build from per-bar values. Intended for tests and synthetic data.
    pub fn from_bars(bars: &[Bar]) -> Self {
        Self {
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    #[inline]
    pub fn bar(&self, idx: usize) -> Bar {
        Bar {
            open: self.open[idx],
            high: self.high[idx],
            low: self.low[idx],
            close: self.close[idx],
        }
    }

    #[inline]
    pub fn series(&self, body: CandleBody) -> &[f64] {
        match body {
            CandleBody::Open => &self.open,
            CandleBody::High => &self.high,
            CandleBody::Low => &self.low,
            CandleBody::Close => &self.close,
        }
    }

    fn validate(&self, symbol: usize) -> Result<(), DataError> {
        for bar in 0..self.len() {
            let b = self.bar(bar);
            if !(b.open.is_finite() && b.high.is_finite() && b.low.is_finite() && b.close.is_finite())
            {
                return Err(DataError::BadBar {
                    symbol,
                    bar,
                    reason: "non-finite price",
                });
            }
            if b.low <= 0.0 {
                return Err(DataError::BadBar {
                    symbol,
                    bar,
                    reason: "prices must be positive",
                });
            }
            if b.high < b.low
                || b.open > b.high
                || b.open < b.low
                || b.close > b.high
                || b.close < b.low
            {
                return Err(DataError::BadBar {
                    symbol,
                    bar,
                    reason: "open/close outside the high-low range",
                });
            }
        }
        Ok(())
    }
}

/// OHLC series for every symbol of a sweep, all with the same bar count.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceData {
    symbols: Vec<Ohlc>,
    bars: usize,
}

impl PriceData {
    /// Build from the column-wise layout: `open, high, low, close` per symbol.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self, DataError> {
        if columns.is_empty() {
            return Err(DataError::Empty);
        }
        if columns.len() % 4 != 0 {
            return Err(DataError::ColumnCount(columns.len()));
        }
        let bars = columns[0].len();
        if bars == 0 {
            return Err(DataError::Empty);
        }
        for (column, col) in columns.iter().enumerate() {
            if col.len() != bars {
                return Err(DataError::RaggedColumn {
                    column,
                    expected: bars,
                    actual: col.len(),
                });
            }
        }

        let mut symbols = Vec::with_capacity(columns.len() / 4);
        let mut iter = columns.into_iter();
        while let (Some(open), Some(high), Some(low), Some(close)) =
            (iter.next(), iter.next(), iter.next(), iter.next())
        {
            symbols.push(Ohlc {
                open,
                high,
                low,
                close,
            });
        }
        Self::from_symbols(symbols)
    }

    /// Build from one `Ohlc` per symbol.
    pub fn from_symbols(symbols: Vec<Ohlc>) -> Result<Self, DataError> {
        let Some(first) = symbols.first() else {
            return Err(DataError::Empty);
        };
        let bars = first.len();
        if bars == 0 {
            return Err(DataError::Empty);
        }
        for (idx, ohlc) in symbols.iter().enumerate() {
            let lens = [ohlc.open.len(), ohlc.high.len(), ohlc.low.len(), ohlc.close.len()];
            for (offset, len) in lens.into_iter().enumerate() {
                if len != bars {
                    return Err(DataError::RaggedColumn {
                        column: idx * 4 + offset,
                        expected: bars,
                        actual: len,
                    });
                }
            }
            ohlc.validate(idx)?;
        }
        Ok(Self { symbols, bars })
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn symbol(&self, idx: usize) -> &Ohlc {
        &self.symbols[idx]
    }

    pub fn symbols(&self) -> &[Ohlc] {
        &self.symbols
    }
}
