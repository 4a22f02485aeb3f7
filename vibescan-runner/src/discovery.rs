//! Input discovery: directory listing, ticker derivation, ticker-list
//! filtering and duplicate detection.
//!
//! Files are always handled in lexicographic file-name order, so the same
//! directory yields the same jobs (and the same duplicate winners) on every run.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use vibescan_core::data::normalize_header;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read ticker list {path}: {source}")]
    TickerList {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// One file to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub path: PathBuf,
    pub ticker: String,
}

impl ScanJob {
    pub fn new(path: PathBuf) -> Self {
        let ticker = ticker_from_filename(&path);
        Self { path, ticker }
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// A discovered file that is not dispatched because another file already
/// provides its ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTicker {
    pub job: ScanJob,
    pub kept_file: String,
}

/// Discovery result, ready for dispatch.
#[derive(Debug, Clone, Default)]
pub struct JobPlan {
    pub jobs: Vec<ScanJob>,
    pub duplicates: Vec<DuplicateTicker>,
    /// Files excluded by the ticker list.
    pub skipped: usize,
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_ticker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

/// Derive a ticker from `{TICKER}[_{PERIOD}_{INTERVAL}].{ext}`.
///
/// The leading run of alphanumerics, dots and dashes counts as the ticker
/// when an underscore follows it; otherwise the file stem is used.
/// The result is upper-cased.
pub fn ticker_from_filename(path: &Path) -> String {
    let name = file_name_of(path);
    let run_len = name
        .char_indices()
        .find(|&(_, c)| !is_ticker_char(c))
        .map_or(name.len(), |(i, _)| i);
    if run_len > 0 && name[run_len..].starts_with('_') {
        return name[..run_len].to_uppercase();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| name.to_uppercase())
}

/// List candidate files in `dir`, sorted by file name.
pub fn discover_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        if dir.exists() {
            return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
        }
        return Err(DiscoveryError::ReadDir {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        });
    }
    let read_err = |source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|e| wanted.contains(&e));
        if matches {
            files.push(path);
        }
    }
    files.sort_by_key(|p| file_name_of(p));
    Ok(files)
}

/// Set of tickers allowed into a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerFilter {
    tickers: BTreeSet<String>,
}

impl TickerFilter {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tickers: tickers
                .into_iter()
                .map(|t| t.as_ref().trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Read a ticker list. A `Ticker` or `Symbol` header selects the column;
    /// without one, the first column is used and the first row is data.
    pub fn from_file(path: &Path) -> Result<Self, DiscoveryError> {
        let err = |source| DiscoveryError::TickerList {
            path: path.to_path_buf(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(err)?;

        let mut records = rdr.records();
        let Some(first) = records.next().transpose().map_err(err)? else {
            return Ok(Self::default());
        };

        let header_col = first
            .iter()
            .position(|h| matches!(normalize_header(h).as_str(), "ticker" | "symbol"));
        let column = header_col.unwrap_or(0);

        let mut tickers = Vec::new();
        if header_col.is_none() {
            tickers.extend(first.get(column).map(str::to_string));
        }
        for record in records {
            let record = record.map_err(err)?;
            tickers.extend(record.get(column).map(str::to_string));
        }
        Ok(Self::new(tickers))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.contains(&ticker.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Turn an ordered file list into dispatchable jobs.
///
/// Files outside the filter are counted as skipped. The first file for a
/// ticker wins; later ones are reported as duplicates.
pub fn plan_jobs(files: Vec<PathBuf>, filter: Option<&TickerFilter>) -> JobPlan {
    let mut plan = JobPlan::default();
    let mut owners: HashMap<String, String> = HashMap::new();

    for path in files {
        let job = ScanJob::new(path);
        if filter.is_some_and(|f| !f.contains(&job.ticker)) {
            debug!(file = %job.file_name(), ticker = %job.ticker, "not in ticker list");
            plan.skipped += 1;
            continue;
        }
        if let Some(kept_file) = owners.get(&job.ticker) {
            plan.duplicates.push(DuplicateTicker {
                kept_file: kept_file.clone(),
                job,
            });
            continue;
        }
        owners.insert(job.ticker.clone(), job.file_name());
        plan.jobs.push(job);
    }
    plan
}
