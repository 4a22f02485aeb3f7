//! VibeScan Core — series loading, indicator tables, scoring and classification.
//!
//! This crate holds the per-instrument pipeline:
//! - Domain types (observations, cleaned raw series)
//! - Series Loader with an explicit column alias table
//! - Vectorized indicator kernels (SMA, EMA, Wilder RSI, MACD, CCI)
//! - Indicator Builder producing an aligned `IndicatorTable`
//! - Three-block Scorer and five-band Classifier
//!
//! Everything here is a pure function of its inputs except the loader, which
//! only reads. Concurrency lives in `vibescan-runner`.

pub mod builder;
pub mod classify;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod scoring;

pub use builder::{build_indicators, IndicatorRow, IndicatorTable};
pub use classify::{classify, Action, Classification, Sentiment};
pub use config::{ConfigError, IndicatorConfig, MacdSpans, SignalSmoothing, SmoothingKind};
pub use data::{load_series, load_series_from_reader, LoadError, LoadOptions};
pub use domain::{Observation, RawSeries, SeriesError};
pub use scoring::{score_row, ScoreBreakdown, ScoreError};
