//! RawSeries — one instrument's cleaned, time-ordered price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One dated observation.
///
/// `close` is always a finite number. `high`/`low` are `None` when the source
/// file has no such column or the cell did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            high: None,
            low: None,
        }
    }

    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    /// (high + low + close) / 3, or `None` unless both extremes are defined
    /// on this row.
    pub fn typical_price(&self) -> Option<f64> {
        match (self.high, self.low) {
            (Some(high), Some(low)) => Some((high + low + self.close) / 3.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("series has no observations")]
    Empty,

    #[error("dates are not strictly ascending at index {index} ({date})")]
    NotAscending { index: usize, date: NaiveDate },

    #[error("close at index {index} is not a finite number")]
    NonFiniteClose { index: usize },
}

/// Immutable, strictly date-ascending series with no missing closes.
///
/// Built once per file and owned by the task that loaded it. Deserializing
/// goes through the same validation as [`RawSeries::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct RawSeries {
    symbol: String,
    observations: Vec<Observation>,
    range_columns: bool,
}

#[derive(Deserialize)]
struct SeriesParts {
    symbol: String,
    observations: Vec<Observation>,
    range_columns: bool,
}

impl TryFrom<SeriesParts> for RawSeries {
    type Error = SeriesError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        let series = RawSeries::new(parts.symbol, parts.observations)?;
        Ok(series.with_range_columns(parts.range_columns))
    }
}

impl RawSeries {
    /// Validate and wrap already-cleaned observations.
    ///
    /// The series is treated as having high/low columns if any row carries
    /// both; the loader overrides this from the file header.
    pub fn new(
        symbol: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Result<Self, SeriesError> {
        if observations.is_empty() {
            return Err(SeriesError::Empty);
        }
        for (index, obs) in observations.iter().enumerate() {
            if !obs.close.is_finite() {
                return Err(SeriesError::NonFiniteClose { index });
            }
            if index > 0 && observations[index - 1].date >= obs.date {
                return Err(SeriesError::NotAscending {
                    index,
                    date: obs.date,
                });
            }
        }
        let range_columns = observations
            .iter()
            .any(|o| o.high.is_some() && o.low.is_some());
        Ok(Self {
            symbol: symbol.into(),
            observations,
            range_columns,
        })
    }

    /// Mark whether the source had both high and low columns.
    pub fn with_range_columns(mut self, present: bool) -> Self {
        self.range_columns = present;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    /// Typical price per row when the series has high/low columns, else the
    /// closes. A row missing either extreme is undefined (NaN).
    pub fn typical_prices(&self) -> Vec<f64> {
        if !self.range_columns {
            return self.closes();
        }
        self.observations
            .iter()
            .map(|o| o.typical_price().unwrap_or(f64::NAN))
            .collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    /// True if the series has high and low columns.
    pub fn has_range_columns(&self) -> bool {
        self.range_columns
    }
}
