use super::DataError;

/// Boolean entry signals, one column per (symbol, indicator-setting) pair.
///
/// Columns are grouped by symbol: the first `indicators_per_symbol` columns
/// belong to symbol 0, the next group to symbol 1, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignals {
    columns: Vec<Vec<bool>>,
    bars: usize,
}

impl EntrySignals {
    pub fn from_columns(columns: Vec<Vec<bool>>) -> Result<Self, DataError> {
        let Some(first) = columns.first() else {
            return Err(DataError::Empty);
        };
        let bars = first.len();
        for (column, col) in columns.iter().enumerate() {
            if col.len() != bars {
                return Err(DataError::RaggedColumn {
                    column,
                    expected: bars,
                    actual: col.len(),
                });
            }
        }
        Ok(Self { columns, bars })
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Indicator settings per symbol, if the columns split evenly.
    pub fn per_symbol(&self, num_symbols: usize) -> Result<usize, DataError> {
        if num_symbols == 0 || self.columns.len() % num_symbols != 0 {
            return Err(DataError::EntryColumns {
                entries: self.columns.len(),
                symbols: num_symbols,
            });
        }
        Ok(self.columns.len() / num_symbols)
    }

    /// Signals of `indicator` for `symbol`, given `per_symbol` columns per symbol.
    #[inline]
    pub fn column(&self, symbol: usize, indicator: usize, per_symbol: usize) -> &[bool] {
        &self.columns[symbol * per_symbol + indicator]
    }

    pub fn count_true(&self, column: usize) -> usize {
        self.columns[column].iter().filter(|&&e| e).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_by_symbol() {
        let entries = EntrySignals::from_columns(vec![
            vec![true, false],
            vec![false, false],
            vec![false, true],
            vec![true, true],
        ])
        .unwrap();
        let per = entries.per_symbol(2).unwrap();
        assert_eq!(per, 2);
        assert_eq!(entries.column(1, 0, per), &[false, true]);
        assert_eq!(entries.count_true(3), 2);
    }

    #[test]
    fn uneven_split_rejected() {
        let entries = EntrySignals::from_columns(vec![vec![true]; 3]).unwrap();
        assert_eq!(
            entries.per_symbol(2),
            Err(DataError::EntryColumns {
                entries: 3,
                symbols: 2
            })
        );
    }

    #[test]
    fn ragged_rejected() {
        let err = EntrySignals::from_columns(vec![vec![true, false], vec![true]]).unwrap_err();
        assert!(matches!(err, DataError::RaggedColumn { column: 1, .. }));
    }
}
