//! Scorer — reduces one indicator row to an integer composite score.
//!
//! Three independent rule blocks, summed:
//! - trend      −4..=+4  (close vs. fast and slow moving averages)
//! - momentum   −3..=+3  (MACD vs. its signal, RSI vs. its signal)
//! - volatility −3..=+3  (CCI vs. its signal and vs. zero)
//!
//! All comparisons are strict. The composite range is −10..=+10.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::IndicatorRow;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("insufficient history: {field} is undefined in the last row")]
    InsufficientHistory { field: &'static str },
}

/// Per-block contributions to the composite score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend: i32,
    pub momentum: i32,
    pub volatility: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.trend + self.momentum + self.volatility
    }
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, ScoreError> {
    value.ok_or(ScoreError::InsufficientHistory { field })
}

/// Score a single row. Fails if any cell the rules read is undefined.
pub fn score_row(row: &IndicatorRow) -> Result<ScoreBreakdown, ScoreError> {
    let sma_fast = require(row.sma_fast, "sma_fast")?;
    let sma_slow = require(row.sma_slow, "sma_slow")?;
    let macd_hist = require(row.macd_hist, "macd_hist")?;
    let macd_signal = require(row.macd_signal, "macd_signal")?;
    let rsi = require(row.rsi, "rsi")?;
    let rsi_signal = require(row.rsi_signal, "rsi_signal")?;
    let cci = require(row.cci, "cci")?;
    let cci_signal = require(row.cci_signal, "cci_signal")?;

    Ok(ScoreBreakdown {
        trend: trend_score(row.close, sma_fast, sma_slow),
        momentum: momentum_score(macd_hist, macd_signal, rsi, rsi_signal),
        volatility: volatility_score(cci, cci_signal),
    })
}

pub fn trend_score(close: f64, fast: f64, slow: f64) -> i32 {
    if close > fast && fast > slow {
        4
    } else if close > fast {
        2
    } else if close < fast && fast < slow {
        -4
    } else {
        0
    }
}

pub fn momentum_score(macd_hist: f64, macd_signal: f64, rsi: f64, rsi_signal: f64) -> i32 {
    match (macd_hist > macd_signal, rsi > rsi_signal) {
        (true, true) => 3,
        (true, false) | (false, true) => 1,
        (false, false) => -3,
    }
}

pub fn volatility_score(cci: f64, cci_signal: f64) -> i32 {
    if cci > cci_signal && cci > 0.0 {
        3
    } else if cci < cci_signal && cci < 0.0 {
        -3
    } else {
        0
    }
}
