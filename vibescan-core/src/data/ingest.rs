//! Series Loader — one raw CSV file in, one `RawSeries` out.
//!
//! Cleaning rules:
//! - rows whose date does not parse are dropped
//! - rows whose close does not parse are dropped
//! - unparseable high/low cells become `None`; the row is kept, and its
//!   typical price is undefined when the file has both range columns
//! - remaining rows are sorted ascending, repeated dates keep the first row
//!
//! The loader only reads; it never touches the source file.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use crate::data::canonicalize::canonicalize;
use crate::data::schema::{resolve_columns, ColumnError};
use crate::domain::{Observation, RawSeries, SeriesError};

/// Default upper bound on data rows per file.
pub const DEFAULT_MAX_ROWS: usize = 1_000_000;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing date column")]
    MissingDateColumn,

    #[error("missing close column")]
    MissingCloseColumn,

    #[error("file has no data rows")]
    Empty,

    #[error("no usable rows after cleaning ({rows} rows: {bad_dates} bad dates, {bad_closes} bad closes)")]
    NoValidRows {
        rows: usize,
        bad_dates: usize,
        bad_closes: usize,
    },

    #[error("file exceeds the {limit}-row limit")]
    TooManyRows { limit: usize },

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),
}

impl From<ColumnError> for LoadError {
    fn from(err: ColumnError) -> Self {
        match err {
            ColumnError::MissingDate => LoadError::MissingDateColumn,
            ColumnError::MissingClose => LoadError::MissingCloseColumn,
        }
    }
}

/// Options controlling how a file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reject files with more data rows than this.
    pub max_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Load one file from disk.
pub fn load_series(path: &Path, symbol: &str, opts: &LoadOptions) -> Result<RawSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_series_from_reader(file, symbol, opts)
}

/// Load a series from any CSV byte stream.
pub fn load_series_from_reader<R: Read>(
    reader: R,
    symbol: &str,
    opts: &LoadOptions,
) -> Result<RawSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }
    let header_refs: Vec<&str> = headers.iter().collect();
    let columns = resolve_columns(header_refs.iter().copied())?;

    let mut observations = Vec::new();
    let mut rows = 0usize;
    let mut bad_dates = 0usize;
    let mut bad_closes = 0usize;
    let mut record = csv::StringRecord::new();

    while rdr.read_record(&mut record)? {
        rows += 1;
        if rows > opts.max_rows {
            return Err(LoadError::TooManyRows {
                limit: opts.max_rows,
            });
        }

        let Some(date) = record.get(columns.date).and_then(parse_date) else {
            bad_dates += 1;
            continue;
        };
        let Some(close) = record.get(columns.close).and_then(parse_price) else {
            bad_closes += 1;
            continue;
        };
        let high = columns
            .high
            .and_then(|i| record.get(i))
            .and_then(parse_price);
        let low = columns.low.and_then(|i| record.get(i)).and_then(parse_price);

        observations.push(Observation {
            date,
            close,
            high,
            low,
        });
    }

    if rows == 0 {
        return Err(LoadError::Empty);
    }
    if observations.is_empty() {
        return Err(LoadError::NoValidRows {
            rows,
            bad_dates,
            bad_closes,
        });
    }

    let stats = canonicalize(&mut observations);
    debug!(
        symbol,
        rows,
        kept = observations.len(),
        bad_dates,
        bad_closes,
        duplicates = stats.duplicates_dropped,
        resorted = !stats.was_sorted,
        "loaded series"
    );

    let range_columns = columns.high.is_some() && columns.low.is_some();
    Ok(RawSeries::new(symbol, observations)?.with_range_columns(range_columns))
}

/// Parse a date-like cell. Time-of-day and zone offsets are discarded; the
/// calendar date as written is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local().date());
        }
    }
    None
}

/// Parse a price cell; `None` for blanks, text and non-finite values.
pub fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let value = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) => s.replace(',', "").parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}
