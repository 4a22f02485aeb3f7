//! VibeScan Runner — scan orchestration over a directory of price files.
//!
//! This crate builds on `vibescan-core` to provide:
//! - `ScanConfig` (TOML + defaults + validation)
//! - File discovery, ticker derivation, ticker-list filter, duplicate handling
//! - Single-file evaluation (load, guard, build, score, classify)
//! - The concurrent Scan Orchestrator on a private rayon pool
//! - `RunReport` ranking and atomic archive emission

pub mod archive;
pub mod config;
pub mod discovery;
pub mod evaluate;
pub mod report;
pub mod scan;

pub use archive::{write_archive, ArchiveError, ArchiveManifest, ArchivePaths, ARCHIVE_SCHEMA_VERSION};
pub use config::{ConfigError, ScanConfig};
pub use discovery::{
    discover_files, plan_jobs, ticker_from_filename, DiscoveryError, JobPlan, ScanJob, TickerFilter,
};
pub use evaluate::{evaluate_file, evaluate_series, EvalError, EvalSettings, ScoreResult};
pub use report::{RunReport, ScanFailure, ScanOutcome};
pub use scan::{dispatch_jobs, run_scan, scan_directory, ScanError, ScanProgress, ScanSummary};
