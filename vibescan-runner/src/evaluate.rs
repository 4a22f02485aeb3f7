//! Single-file evaluation: Load → minimum-history guard → Build → Score →
//! Classify. Runs entirely inside one worker task.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vibescan_core::{
    build_indicators, classify, load_series, score_row, Action, IndicatorConfig, LoadError,
    LoadOptions, RawSeries, ScoreBreakdown, ScoreError, Sentiment,
};

use crate::config::{ConfigError, ScanConfig};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("insufficient history: {rows} rows, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("{0}")]
    Score(#[from] ScoreError),
}

/// Per-run settings shared read-only by every task.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSettings {
    pub indicators: IndicatorConfig,
    pub min_history: usize,
    pub load: LoadOptions,
}

impl EvalSettings {
    pub fn from_config(config: &ScanConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            indicators: config.indicators,
            min_history: config.min_history_rows()?,
            load: config.load_options(),
        })
    }
}

/// One scored instrument: latest close, every indicator's latest value,
/// score and labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub close: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub cci: f64,
    pub cci_signal: f64,
    pub macd_hist: f64,
    pub macd_signal: f64,
    pub rsi: f64,
    pub rsi_signal: f64,
    pub breakdown: ScoreBreakdown,
    pub score: i32,
    pub sentiment: Sentiment,
    pub action: Action,
}

/// Evaluate a loaded series.
pub fn evaluate_series(series: &RawSeries, settings: &EvalSettings) -> Result<ScoreResult, EvalError> {
    if series.len() < settings.min_history {
        return Err(EvalError::InsufficientHistory {
            rows: series.len(),
            required: settings.min_history,
        });
    }

    let table = build_indicators(series, &settings.indicators);
    let row = table.last_row().ok_or(EvalError::InsufficientHistory {
        rows: 0,
        required: settings.min_history,
    })?;
    let breakdown = score_row(&row)?;
    let score = breakdown.total();
    let labels = classify(score);

    // score_row succeeded, so every cell below is defined
    let value = |cell: Option<f64>| cell.unwrap_or(f64::NAN);
    Ok(ScoreResult {
        ticker: series.symbol().to_string(),
        as_of: row.date,
        close: row.close,
        sma_fast: value(row.sma_fast),
        sma_slow: value(row.sma_slow),
        cci: value(row.cci),
        cci_signal: value(row.cci_signal),
        macd_hist: value(row.macd_hist),
        macd_signal: value(row.macd_signal),
        rsi: value(row.rsi),
        rsi_signal: value(row.rsi_signal),
        breakdown,
        score,
        sentiment: labels.sentiment,
        action: labels.action,
    })
}

/// Load and evaluate one file.
pub fn evaluate_file(path: &Path, ticker: &str, settings: &EvalSettings) -> Result<ScoreResult, EvalError> {
    let series = load_series(path, ticker, &settings.load)?;
    evaluate_series(&series, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibescan_core::Observation;

    fn settings() -> EvalSettings {
        EvalSettings::from_config(&ScanConfig::default()).unwrap()
    }

    fn rising(n: usize) -> RawSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        let obs = (0..n)
            .map(|i| Observation::new(start + chrono::Duration::weeks(i as i64), 10.0 + i as f64))
            .collect();
        RawSeries::new("UP", obs).unwrap()
    }

    #[test]
    fn scores_long_enough_series() {
        let result = evaluate_series(&rising(60), &settings()).unwrap();
        assert_eq!(result.ticker, "UP");
        assert_eq!(result.close, 69.0);
        assert_eq!(result.breakdown.trend, 4);
        assert_eq!(result.score, result.breakdown.total());
        assert!(result.rsi.is_finite() && result.cci.is_finite());
        assert_eq!(result.as_of, rising(60).last_date());
    }

    #[test]
    fn short_series_rejected_before_build() {
        let err = evaluate_series(&rising(49), &settings()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::InsufficientHistory {
                rows: 49,
                required: 50
            }
        ));
        assert_eq!(err.to_string(), "insufficient history: 49 rows, need at least 50");
    }

    #[test]
    fn explicit_min_history_is_honoured() {
        let config = ScanConfig {
            min_history: Some(80),
            ..ScanConfig::default()
        };
        let settings = EvalSettings::from_config(&config).unwrap();
        assert!(matches!(
            evaluate_series(&rising(60), &settings),
            Err(EvalError::InsufficientHistory { required: 80, .. })
        ));
    }

    #[test]
    fn load_errors_pass_through() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("X.csv");
        std::fs::write(&path, "Date,Open\n2024-01-02,1\n").unwrap();
        let err = evaluate_file(&path, "X", &settings()).unwrap_err();
        assert!(matches!(err, EvalError::Load(LoadError::MissingCloseColumn)));
        assert_eq!(err.to_string(), "missing close column");
    }
}
