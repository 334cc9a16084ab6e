//! Bar loading for the runner.
//!
//! Reads a CSV export with `date,time,Open,High,Low,Close` columns and an
//! optional indicator column (`rsi14` by default). Rows are validated one by
//! one and the first bad row fails the whole load, naming its line.
//! The result is sorted by timestamp.
//!
//! When the indicator column is absent, or has gaps, and `rsi_period` is set,
//! the gaps are filled with a Wilder RSI computed from the closes.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::domain::{Bar, BarError};
use replaylab_core::indicators::Rsi;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d.%m.%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: unparseable timestamp '{value}'")]
    Timestamp { line: u64, value: String },

    #[error("line {line}: unparseable indicator value '{value}'")]
    Indicator { line: u64, value: String },

    #[error("line {line}: {source}")]
    InvalidBar {
        line: u64,
        #[source]
        source: BarError,
    },

    #[error("no bars found")]
    Empty,

    #[error("RSI period must be >= 1, got {0}")]
    InvalidRsiPeriod(usize),
}

/// Options controlling how bars are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Header of the column feeding the policy's state.
    pub indicator_column: String,
    /// Fill missing indicator values with RSI of this period.
    pub rsi_period: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            indicator_column: "rsi14".to_string(),
            rsi_period: None,
        }
    }
}

/// Fixed OHLC columns. The indicator column is looked up by name at runtime.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    time: String,
    #[serde(rename = "Open", alias = "open")]
    open: f64,
    #[serde(rename = "High", alias = "high")]
    high: f64,
    #[serde(rename = "Low", alias = "low")]
    low: f64,
    #[serde(rename = "Close", alias = "close")]
    close: f64,
}

/// Load bars from a CSV file.
pub fn load_bars(path: &Path, opts: &LoadOptions) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars(file, opts)
}

/// Load bars from any CSV source.
pub fn read_bars<R: Read>(reader: R, opts: &LoadOptions) -> Result<Vec<Bar>, LoadError> {
    if opts.rsi_period == Some(0) {
        return Err(LoadError::InvalidRsiPeriod(0));
    }
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let indicator_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(&opts.indicator_column));

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row: CsvRow = record.deserialize(Some(&headers))?;

        let timestamp = parse_timestamp(&row.date, &row.time).ok_or_else(|| {
            LoadError::Timestamp {
                line,
                value: format!("{} {}", row.date, row.time),
            }
        })?;
        let indicator = match indicator_idx.and_then(|i| record.get(i)) {
            Some(cell) => parse_indicator(cell).ok_or_else(|| LoadError::Indicator {
                line,
                value: cell.to_string(),
            })?,
            None => None,
        };

        let bar = Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            indicator,
        };
        bar.validate()
            .map_err(|source| LoadError::InvalidBar { line, source })?;
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    bars.sort_by_key(|b| b.timestamp);

    if let Some(period) = opts.rsi_period {
        Rsi::new(period).fill_missing(&mut bars);
    }
    Ok(bars)
}

fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date, f).ok())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time, f).ok())?;
    Some(date.and_time(time))
}

/// Empty and NaN cells are warmup gaps; anything else must be a number.
fn parse_indicator(cell: &str) -> Option<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(|v| v.is_finite().then_some(v))
}
