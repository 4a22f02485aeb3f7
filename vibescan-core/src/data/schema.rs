//! Column alias table for raw price files.
//!
//! Headers are compared after normalization (trim, lowercase, drop spaces,
//! underscores, dashes and dots), so "Adj Close", "adj_close" and "ADJCLOSE"
//! all resolve to the same alias. Within one canonical column the alias list
//! is a priority order: a file carrying both "Close" and "Adj Close" uses
//! "Close".

use thiserror::Error;

/// Columns the loader knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalColumn {
    Date,
    Close,
    High,
    Low,
}

/// Canonical column → normalized aliases, highest priority first.
pub const COLUMN_ALIASES: &[(CanonicalColumn, &[&str])] = &[
    (
        CanonicalColumn::Date,
        &["date", "datetime", "time", "timestamp"],
    ),
    (CanonicalColumn::Close, &["close", "adjclose", "closeprice"]),
    (CanonicalColumn::High, &["high", "highprice"]),
    (CanonicalColumn::Low, &["low", "lowprice"]),
];

/// Normalize a raw header for alias comparison.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Positions of the resolved columns within a header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub close: usize,
    pub high: Option<usize>,
    pub low: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error("missing date column")]
    MissingDate,

    #[error("missing close column")]
    MissingClose,
}

fn aliases_for(column: CanonicalColumn) -> &'static [&'static str] {
    COLUMN_ALIASES
        .iter()
        .find(|(c, _)| *c == column)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Find the header index for a canonical column, honouring alias priority.
pub fn find_column<'a, I>(headers: I, column: CanonicalColumn) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();
    aliases_for(column)
        .iter()
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

/// Resolve every column the loader needs from a header row.
pub fn resolve_columns<'a, I>(headers: I) -> Result<ColumnMap, ColumnError>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let headers = headers.into_iter();
    let date = find_column(headers.clone(), CanonicalColumn::Date).ok_or(ColumnError::MissingDate)?;
    let close =
        find_column(headers.clone(), CanonicalColumn::Close).ok_or(ColumnError::MissingClose)?;
    Ok(ColumnMap {
        date,
        close,
        high: find_column(headers.clone(), CanonicalColumn::High),
        low: find_column(headers, CanonicalColumn::Low),
    })
}
