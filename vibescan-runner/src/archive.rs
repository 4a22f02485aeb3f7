//! Archive emission: ranked results CSV, failures CSV and a JSON manifest.
//!
//! All three files are written to `.tmp` siblings first and renamed into
//! place only once every one of them is complete. A bundle already present
//! under the final names (an earlier run on the same date) is moved to
//! `.bak` siblings while the new one is placed. On failure the new files are
//! removed and the earlier bundle is restored; on success the backups are
//! deleted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::report::RunReport;

/// Current schema version for the archive bundle.
pub const ARCHIVE_SCHEMA_VERSION: u32 = 1;

pub const RESULT_COLUMNS: [&str; 13] = [
    "Ticker",
    "Price",
    "SMA_Fast",
    "SMA_Slow",
    "CCI",
    "CCI_S",
    "MACD_H",
    "MACD_S",
    "RSI",
    "RSI_S",
    "Score",
    "Sentiment",
    "Action",
];

pub const FAILURE_COLUMNS: [&str; 3] = ["File", "Ticker", "Reason"];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to move {from} into place: {source}")]
    Rename {
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Final locations of one run's archive bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePaths {
    pub results: PathBuf,
    pub failures: PathBuf,
    pub manifest: PathBuf,
}

impl ArchivePaths {
    pub fn new(output_dir: &Path, prefix: &str, run_date: NaiveDate) -> Self {
        let stem = format!("{prefix}_{}", run_date.format("%Y-%m-%d"));
        Self {
            results: output_dir.join(format!("{stem}.csv")),
            failures: output_dir.join(format!("{stem}_failures.csv")),
            manifest: output_dir.join(format!("{stem}.json")),
        }
    }

    fn all(&self) -> [&Path; 3] {
        [&self.results, &self.failures, &self.manifest]
    }
}

/// JSON sidecar describing a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub schema_version: u32,
    pub run_date: NaiveDate,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub config_hash: String,
    pub config: ScanConfig,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn fmt6(v: f64) -> String {
    format!("{v:.6}")
}

fn write_results_csv(report: &RunReport, path: &Path) -> Result<(), ArchiveError> {
    let err = |source| ArchiveError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(err)?;
    wtr.write_record(RESULT_COLUMNS).map_err(err)?;
    for r in &report.results {
        wtr.write_record([
            r.ticker.clone(),
            fmt6(r.close),
            fmt6(r.sma_fast),
            fmt6(r.sma_slow),
            fmt6(r.cci),
            fmt6(r.cci_signal),
            fmt6(r.macd_hist),
            fmt6(r.macd_signal),
            fmt6(r.rsi),
            fmt6(r.rsi_signal),
            r.score.to_string(),
            r.sentiment.to_string(),
            r.action.to_string(),
        ])
        .map_err(err)?;
    }
    wtr.flush().map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_failures_csv(report: &RunReport, path: &Path) -> Result<(), ArchiveError> {
    let err = |source| ArchiveError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(err)?;
    wtr.write_record(FAILURE_COLUMNS).map_err(err)?;
    for f in &report.failures {
        wtr.write_record([&f.file, &f.ticker, &f.reason]).map_err(err)?;
    }
    wtr.flush().map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_manifest(report: &RunReport, config: &ScanConfig, path: &Path) -> Result<(), ArchiveError> {
    let manifest = ArchiveManifest {
        schema_version: ARCHIVE_SCHEMA_VERSION,
        run_date: report.run_date,
        succeeded: report.succeeded(),
        failed: report.failed(),
        skipped: report.skipped,
        config_hash: config.config_hash()?,
        config: config.clone(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(path, json).map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_quietly(paths: &[PathBuf]) {
    for p in paths {
        let _ = fs::remove_file(p);
    }
}

/// A destination touched while placing the bundle.
struct Placement {
    dest: PathBuf,
    backup: Option<PathBuf>,
}

fn roll_back(placed: &[Placement]) {
    for p in placed.iter().rev() {
        let _ = fs::remove_file(&p.dest);
        if let Some(backup) = &p.backup {
            let _ = fs::rename(backup, &p.dest);
        }
    }
}

/// Move one staged file into place, backing up whatever it replaces.
fn place(tmp: &Path, dest: &Path, placed: &mut Vec<Placement>) -> Result<(), ArchiveError> {
    let backup = if dest.exists() {
        let backup = backup_path(dest);
        fs::rename(dest, &backup).map_err(|source| ArchiveError::Rename {
            from: dest.to_path_buf(),
            source,
        })?;
        Some(backup)
    } else {
        None
    };
    placed.push(Placement {
        dest: dest.to_path_buf(),
        backup,
    });
    fs::rename(tmp, dest).map_err(|source| ArchiveError::Rename {
        from: tmp.to_path_buf(),
        source,
    })
}

/// Write the full archive bundle for `report` into `config.output_dir`.
pub fn write_archive(report: &RunReport, config: &ScanConfig) -> Result<ArchivePaths, ArchiveError> {
    let dir = &config.output_dir;
    fs::create_dir_all(dir).map_err(|source| ArchiveError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let paths = ArchivePaths::new(dir, &config.archive_prefix, report.run_date);
    let tmps: Vec<PathBuf> = paths.all().iter().map(|p| tmp_path(p)).collect();

    let staged = write_results_csv(report, &tmps[0])
        .and_then(|()| write_failures_csv(report, &tmps[1]))
        .and_then(|()| write_manifest(report, config, &tmps[2]));
    if let Err(e) = staged {
        remove_quietly(&tmps);
        return Err(e);
    }
    debug!(dir = %dir.display(), "archive staged");

    let mut placed = Vec::new();
    for (tmp, dest) in tmps.iter().zip(paths.all()) {
        if let Err(e) = place(tmp, dest, &mut placed) {
            roll_back(&placed);
            remove_quietly(&tmps);
            return Err(e);
        }
    }
    let backups: Vec<PathBuf> = placed.into_iter().filter_map(|p| p.backup).collect();
    remove_quietly(&backups);

    info!(
        results = %paths.results.display(),
        rows = report.succeeded(),
        failures = report.failed(),
        "archive written"
    );
    Ok(paths)
}
