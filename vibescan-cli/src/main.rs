//! VibeScan CLI — scan a directory of price files, score one file, or print
//! the default configuration.
//!
//! Commands:
//! - `scan` — evaluate every file in the input directory and write the archive
//! - `score` — evaluate a single file and print its indicator snapshot
//! - `config` — print the effective configuration as TOML

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vibescan_core::MacdSpans;
use vibescan_runner::{
    evaluate_file, run_scan, ticker_from_filename, EvalSettings, RunReport, ScanConfig,
    ScanProgress, ScoreResult,
};

/// Failure reasons printed after a scan.
const FAILURE_PREVIEW: usize = 15;

#[derive(Parser)]
#[command(
    name = "vibescan",
    about = "VibeScan: technical-indicator scan over downloaded price files"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MacdPreset {
    /// 12 / 26 / 9
    Standard,
    /// 15 / 30 / 9
    Alternate,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of per-instrument price files.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory the archive is written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Worker threads. Defaults to available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// MACD span preset.
    #[arg(long, value_enum)]
    macd: Option<MacdPreset>,

    /// Minimum rows per series (must cover the indicator windows).
    #[arg(long)]
    min_history: Option<usize>,

    /// Ticker list restricting which files are scanned.
    #[arg(long)]
    tickers: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ScanConfig::default(),
        };
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if let Some(preset) = self.macd {
            config.indicators.macd = match preset {
                MacdPreset::Standard => MacdSpans::Standard,
                MacdPreset::Alternate => MacdSpans::Alternate,
            };
        }
        if self.min_history.is_some() {
            config.min_history = self.min_history;
        }
        if let Some(path) = &self.tickers {
            config.ticker_list = Some(path.clone());
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every price file in the input directory and archive the ranking.
    Scan {
        #[command(flatten)]
        args: ConfigArgs,

        /// Ranked rows to print.
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Run date used for archive names (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Evaluate a single file and print its indicator snapshot.
    Score {
        /// Price file to evaluate.
        file: PathBuf,

        /// Ticker label. Defaults to the one derived from the file name.
        #[arg(long)]
        ticker: Option<String>,

        #[command(flatten)]
        args: ConfigArgs,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        args: ConfigArgs,
    },
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Scan { args, top, date } => run_scan_cmd(&args, top, date.as_deref()),
        Commands::Score { file, ticker, args } => run_score_cmd(&file, ticker, &args),
        Commands::Config { args } => run_config_cmd(&args),
    }
}

fn run_scan_cmd(args: &ConfigArgs, top: usize, date: Option<&str>) -> Result<()> {
    let config = args.resolve()?;
    let run_date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --date '{s}', expected YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };

    let progress = |p: &ScanProgress| {
        debug!(
            completed = p.completed,
            total = p.total,
            failed = p.failed,
            ticker = %p.last_ticker,
            "progress"
        );
    };
    let summary = run_scan(&config, run_date, Some(&progress), None).context("scan failed")?;

    print_report(&summary.report, top);
    println!();
    println!("Archive: {}", summary.archive.results.display());
    println!(
        "Elapsed: {:.2}s on {} workers",
        summary.elapsed.as_secs_f64(),
        summary.workers
    );
    Ok(())
}

fn print_report(report: &RunReport, top: usize) {
    println!(
        "Scanned {} files: {} scored, {} failed, {} skipped by ticker list",
        report.total(),
        report.succeeded(),
        report.failed(),
        report.skipped
    );

    let rows = report.top(top);
    if !rows.is_empty() {
        println!();
        println!(
            "{:<10} {:>10} {:>10} {:>10} {:>9} {:>9} {:>7} {:>7} {:>6}  {:<15} {}",
            "Ticker", "Price", "SMA_Fast", "SMA_Slow", "MACD_H", "CCI", "RSI", "RSI_S", "Score",
            "Sentiment", "Action"
        );
        for r in rows {
            println!(
                "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>9.3} {:>9.1} {:>7.1} {:>7.1} {:>6}  {:<15} {}",
                r.ticker,
                r.close,
                r.sma_fast,
                r.sma_slow,
                r.macd_hist,
                r.cci,
                r.rsi,
                r.rsi_signal,
                r.score,
                r.sentiment.as_str(),
                r.action.as_str()
            );
        }
    }

    let preview = report.failure_preview(FAILURE_PREVIEW);
    if !preview.is_empty() {
        println!();
        println!("Failures ({} total):", report.failed());
        for f in preview {
            println!("  {:<28} {}", f.file, f.reason);
        }
        if report.failed() > preview.len() {
            println!("  ... and {} more", report.failed() - preview.len());
        }
    }
}

fn run_score_cmd(file: &Path, ticker: Option<String>, args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    let settings = EvalSettings::from_config(&config)?;
    let ticker = ticker.unwrap_or_else(|| ticker_from_filename(file));

    let result = evaluate_file(file, &ticker, &settings)
        .with_context(|| format!("evaluating {}", file.display()))?;
    print_snapshot(&result);
    Ok(())
}

fn print_snapshot(r: &ScoreResult) {
    println!("{} as of {}", r.ticker, r.as_of);
    println!("  Close        {:>12.4}", r.close);
    println!("  SMA fast     {:>12.4}", r.sma_fast);
    println!("  SMA slow     {:>12.4}", r.sma_slow);
    println!("  MACD hist    {:>12.4}   signal {:>10.4}", r.macd_hist, r.macd_signal);
    println!("  RSI          {:>12.2}   signal {:>10.2}", r.rsi, r.rsi_signal);
    println!("  CCI          {:>12.2}   signal {:>10.2}", r.cci, r.cci_signal);
    println!(
        "  Score        {:>12}   (trend {:+}, momentum {:+}, volatility {:+})",
        r.score, r.breakdown.trend, r.breakdown.momentum, r.breakdown.volatility
    );
    println!("  Sentiment    {} / {}", r.sentiment, r.action);
}

fn run_config_cmd(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    print!("{}", config.to_toml().context("serializing config")?);
    Ok(())
}
