//! CSV loading of sweep inputs.
//!
//! Prices: a header row, then one row per bar with `open, high, low, close`
//! for each symbol in turn (`4 * symbols` columns). Entries: a header row,
//! then one row per bar with one `0/1/true/false` column per
//! (symbol, indicator-setting), grouped by symbol.

use std::path::{Path, PathBuf};

use thiserror::Error;

use leverlab_core::prices::{DataError, EntrySignals, PriceData};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row}, column {column}: cannot parse '{value}' as {expected}", path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
        expected: &'static str,
    },

    #[error("{}: row {row} has {actual} columns, header has {expected}", path.display())]
    RowWidth {
        path: PathBuf,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Read every record and parse each cell with `parse`, column-major.
fn read_columns<T>(
    path: &Path,
    expected: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<(Vec<String>, Vec<Vec<T>>), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let header: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let width = header.len();
    let mut columns: Vec<Vec<T>> = (0..width).map(|_| Vec::new()).collect();

    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        if record.len() != width {
            return Err(LoadError::RowWidth {
                path: path.to_path_buf(),
                row: row + 1,
                expected: width,
                actual: record.len(),
            });
        }
        for (column, cell) in record.iter().enumerate() {
            let value = parse(cell).ok_or_else(|| LoadError::Parse {
                path: path.to_path_buf(),
                row: row + 1,
                column,
                value: cell.to_string(),
                expected,
            })?;
            columns[column].push(value);
        }
    }
    Ok((header, columns))
}

fn parse_price(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok()
}

fn parse_signal(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" | "" => Some(false),
        _ => None,
    }
}

/// Load OHLC prices. Returns the data and the header names.
pub fn load_prices(path: &Path) -> Result<(PriceData, Vec<String>), LoadError> {
    let (header, columns) = read_columns(path, "a price", parse_price)?;
    Ok((PriceData::from_columns(columns)?, header))
}

/// Load entry signals.
pub fn load_entries(path: &Path) -> Result<EntrySignals, LoadError> {
    let (_, columns) = read_columns(path, "an entry signal", parse_signal)?;
    Ok(EntrySignals::from_columns(columns)?)
}

/// Write prices in the layout [`load_prices`] reads.
pub fn write_prices_csv(path: &Path, prices: &PriceData) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    let mut header = Vec::with_capacity(prices.num_symbols() * 4);
    for s in 0..prices.num_symbols() {
        for field in ["open", "high", "low", "close"] {
            header.push(format!("s{s}_{field}"));
        }
    }
    wtr.write_record(&header).map_err(csv_err)?;
    for bar in 0..prices.bars() {
        let mut row = Vec::with_capacity(header.len());
        for ohlc in prices.symbols() {
            let b = ohlc.bar(bar);
            row.extend([b.open, b.high, b.low, b.close].map(|v| v.to_string()));
        }
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| csv_err(e.into()))?;
    Ok(())
}

/// Write entries in the layout [`load_entries`] reads, `indicators` columns per symbol.
pub fn write_entries_csv(path: &Path, entries: &EntrySignals, indicators: usize) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let indicators = indicators.max(1);
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    let header: Vec<String> = (0..entries.num_columns())
        .map(|c| format!("s{}_i{}", c / indicators, c % indicators))
        .collect();
    wtr.write_record(&header).map_err(csv_err)?;
    for bar in 0..entries.bars() {
        let row: Vec<&str> = (0..entries.num_columns())
            .map(|c| {
                if entries.column(c / indicators, c % indicators, indicators)[bar] {
                    "1"
                } else {
                    "0"
                }
            })
            .collect();
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| csv_err(e.into()))?;
    Ok(())
}
