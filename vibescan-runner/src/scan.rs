//! Scan Orchestrator — fan one evaluation task per file out to a private
//! worker pool, fan the outcomes back in over a single channel.
//!
//! Per task: `Pending → Running → Completed | Failed`. Tasks share nothing
//! mutable; the only shared structure is the result channel. Completion
//! order is arbitrary; the report is sorted only after every task is done.
//!
//! Cancellation is cooperative: tasks that start after the flag is raised
//! do no work, and a cancelled run returns `ScanError::Cancelled` without
//! writing an archive.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{write_archive, ArchiveError, ArchivePaths};
use crate::config::{ConfigError, ScanConfig};
use crate::discovery::{discover_files, plan_jobs, DiscoveryError, ScanJob, TickerFilter};
use crate::evaluate::{evaluate_file, EvalError, EvalSettings, ScoreResult};
use crate::report::{RunReport, ScanFailure, ScanOutcome};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    #[error("no input files with extensions {extensions:?} in {dir}")]
    NoInputFiles { dir: PathBuf, extensions: Vec<String> },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("scan cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Progress snapshot, delivered as each outcome arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Outcomes collected so far, successes and failures alike.
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub last_ticker: String,
}

/// A finished, archived run.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub report: RunReport,
    pub archive: ArchivePaths,
    pub workers: usize,
    pub elapsed: Duration,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_job<F>(job: &ScanJob, evaluate: &F) -> ScanOutcome
where
    F: Fn(&ScanJob) -> Result<ScoreResult, EvalError>,
{
    let failed = |reason: String| {
        ScanOutcome::Failed(ScanFailure {
            file: job.file_name(),
            ticker: job.ticker.clone(),
            reason,
        })
    };
    match panic::catch_unwind(AssertUnwindSafe(|| evaluate(job))) {
        Ok(Ok(result)) => ScanOutcome::Completed(result),
        Ok(Err(e)) => failed(e.to_string()),
        Err(payload) => failed(format!("evaluation panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Evaluate `jobs` on a private pool of `workers` threads.
///
/// Outcomes are returned in completion order. `progress_cb` runs on the
/// calling thread, once per outcome.
pub fn dispatch_jobs<F>(
    jobs: &[ScanJob],
    workers: usize,
    evaluate: F,
    progress_cb: Option<&dyn Fn(&ScanProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<ScanOutcome>, ScanError>
where
    F: Fn(&ScanJob) -> Result<ScoreResult, EvalError> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("vibescan-worker-{i}"))
        .build()?;

    let is_cancelled = || cancel.is_some_and(|f| f.load(Ordering::Relaxed));
    let total = jobs.len();
    let (tx, rx) = mpsc::channel::<ScanOutcome>();
    let mut outcomes = Vec::with_capacity(total);
    let mut failed = 0usize;

    std::thread::scope(|scope| {
        let evaluate = &evaluate;
        let pool = &pool;
        scope.spawn(move || {
            pool.install(|| {
                jobs.par_iter().for_each_with(tx, |tx, job| {
                    if is_cancelled() {
                        return;
                    }
                    // The collector only stops once every sender is gone.
                    let _ = tx.send(run_job(job, evaluate));
                });
            });
        });

        for outcome in rx {
            if let ScanOutcome::Failed(f) = &outcome {
                failed += 1;
                warn!(file = %f.file, ticker = %f.ticker, reason = %f.reason, "file failed");
            }
            if let Some(cb) = progress_cb {
                cb(&ScanProgress {
                    completed: outcomes.len() + 1,
                    failed,
                    total,
                    last_ticker: outcome.ticker().to_string(),
                });
            }
            outcomes.push(outcome);
        }
    });

    if is_cancelled() {
        return Err(ScanError::Cancelled {
            completed: outcomes.len(),
            total,
        });
    }
    Ok(outcomes)
}

/// Discover, filter and evaluate every input file, then rank the results.
/// No archive is written.
pub fn scan_directory(
    config: &ScanConfig,
    run_date: NaiveDate,
    progress_cb: Option<&dyn Fn(&ScanProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<RunReport, ScanError> {
    config.validate()?;
    let settings = EvalSettings::from_config(config)?;

    let files = discover_files(&config.input_dir, &config.extensions)?;
    if files.is_empty() {
        return Err(ScanError::NoInputFiles {
            dir: config.input_dir.clone(),
            extensions: config.extensions.clone(),
        });
    }

    let filter = config
        .ticker_list
        .as_deref()
        .map(TickerFilter::from_file)
        .transpose()?;
    let plan = plan_jobs(files, filter.as_ref());

    let workers = config.worker_count();
    info!(
        dir = %config.input_dir.display(),
        files = plan.jobs.len(),
        duplicates = plan.duplicates.len(),
        skipped = plan.skipped,
        workers,
        min_history = settings.min_history,
        "scan started"
    );

    let mut outcomes = dispatch_jobs(
        &plan.jobs,
        workers,
        |job| evaluate_file(&job.path, &job.ticker, &settings),
        progress_cb,
        cancel,
    )?;

    for dup in plan.duplicates {
        warn!(file = %dup.job.file_name(), ticker = %dup.job.ticker, kept = %dup.kept_file, "duplicate ticker");
        outcomes.push(ScanOutcome::Failed(ScanFailure {
            file: dup.job.file_name(),
            ticker: dup.job.ticker,
            reason: format!("duplicate ticker, already provided by {}", dup.kept_file),
        }));
    }

    Ok(RunReport::from_outcomes(run_date, outcomes, plan.skipped))
}

/// Full run: scan, rank and archive.
pub fn run_scan(
    config: &ScanConfig,
    run_date: NaiveDate,
    progress_cb: Option<&dyn Fn(&ScanProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<ScanSummary, ScanError> {
    let start = Instant::now();
    let report = scan_directory(config, run_date, progress_cb, cancel)?;
    let archive = write_archive(&report, config)?;
    let elapsed = start.elapsed();

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        skipped = report.skipped,
        elapsed_ms = elapsed.as_millis() as u64,
        "scan finished"
    );

    Ok(ScanSummary {
        report,
        archive,
        workers: config.worker_count(),
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::result;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn jobs(n: usize) -> Vec<ScanJob> {
        (0..n)
            .map(|i| ScanJob::new(PathBuf::from(format!("T{i:03}.csv"))))
            .collect()
    }

    #[test]
    fn every_job_yields_one_outcome() {
        let jobs = jobs(40);
        let outcomes = dispatch_jobs(&jobs, 4, |job| Ok(result(&job.ticker, 1)), None, None).unwrap();
        assert_eq!(outcomes.len(), 40);
        let mut tickers: Vec<&str> = outcomes.iter().map(|o| o.ticker()).collect();
        tickers.sort();
        tickers.dedup();
        assert_eq!(tickers.len(), 40);
    }

    #[test]
    fn panic_becomes_failure() {
        let jobs = jobs(5);
        let outcomes = dispatch_jobs(
            &jobs,
            2,
            |job| {
                if job.ticker == "T002" {
                    panic!("corrupt state");
                }
                Ok(result(&job.ticker, 0))
            },
            None,
            None,
        )
        .unwrap();
        assert_eq!(outcomes.len(), 5);
        let failures: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                ScanOutcome::Failed(f) => Some(f),
                ScanOutcome::Completed(_) => None,
            })
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file, "T002.csv");
        assert_eq!(failures[0].reason, "evaluation panicked: corrupt state");
    }

    #[test]
    fn errors_become_failures_with_reason() {
        let jobs = jobs(3);
        let outcomes = dispatch_jobs(
            &jobs,
            1,
            |_| {
                Err(EvalError::InsufficientHistory {
                    rows: 3,
                    required: 50,
                })
            },
            None,
            None,
        )
        .unwrap();
        assert!(outcomes.iter().all(ScanOutcome::is_failure));
    }

    #[test]
    fn progress_reaches_total() {
        let jobs = jobs(12);
        let seen = Mutex::new(Vec::new());
        let cb = |p: &ScanProgress| seen.lock().unwrap().push((p.completed, p.failed, p.total));
        dispatch_jobs(
            &jobs,
            3,
            |job| {
                if job.ticker.ends_with('0') {
                    Err(EvalError::InsufficientHistory {
                        rows: 0,
                        required: 50,
                    })
                } else {
                    Ok(result(&job.ticker, 2))
                }
            },
            Some(&cb),
            None,
        )
        .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 12);
        let completed: Vec<usize> = seen.iter().map(|s| s.0).collect();
        assert_eq!(completed, (1..=12).collect::<Vec<_>>());
        assert_eq!(seen.last(), Some(&(12, 2, 12)));
    }

    #[test]
    fn cancelled_run_is_an_error() {
        let jobs = jobs(20);
        let cancel = AtomicBool::new(false);
        let started = AtomicUsize::new(0);
        let err = dispatch_jobs(
            &jobs,
            1,
            |job| {
                if started.fetch_add(1, Ordering::SeqCst) == 3 {
                    cancel.store(true, Ordering::SeqCst);
                }
                Ok(result(&job.ticker, 0))
            },
            None,
            Some(&cancel),
        )
        .unwrap_err();
        match err {
            ScanError::Cancelled { completed, total } => {
                assert_eq!(total, 20);
                assert!(completed < 20);
            }
            other => panic!("expected Cancelled, got {other}"),
        }
    }

    #[test]
    fn pool_is_private() {
        let global = rayon::current_num_threads();
        dispatch_jobs(&jobs(4), 2, |job| Ok(result(&job.ticker, 0)), None, None).unwrap();
        assert_eq!(rayon::current_num_threads(), global);
    }
}
