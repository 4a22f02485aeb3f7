//! Indicator configuration: window lengths, MACD spans and signal smoothing.
//!
//! One `IndicatorConfig` is applied uniformly to every instrument in a run.
//! It also owns the derivation of the minimum history a series needs before
//! its last indicator row can be fully defined.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::{cci, ema, macd, rsi, sma};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroWindow { field: &'static str },

    #[error("{fast_field} ({fast}) must be shorter than {slow_field} ({slow})")]
    FastNotBelowSlow {
        fast_field: &'static str,
        fast: usize,
        slow_field: &'static str,
        slow: usize,
    },

    #[error("min_history {given} is below the {required} rows the indicator windows need")]
    MinHistoryTooShort { given: usize, required: usize },
}

/// How a signal line smooths its source indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKind {
    Sma,
    Ema,
}

/// A signal line: a further smoothing of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalSmoothing {
    pub kind: SmoothingKind,
    pub window: usize,
}

impl SignalSmoothing {
    pub fn sma(window: usize) -> Self {
        Self {
            kind: SmoothingKind::Sma,
            window,
        }
    }

    pub fn ema(window: usize) -> Self {
        Self {
            kind: SmoothingKind::Ema,
            window,
        }
    }

    /// Smooth `values`, keeping undefined cells undefined.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self.kind {
            SmoothingKind::Sma => sma::sma_of_series(values, self.window),
            SmoothingKind::Ema => ema::ema_of_series(values, self.window),
        }
    }

    /// Undefined cells this smoothing adds after its source's first defined cell.
    pub fn lookback(&self) -> usize {
        match self.kind {
            SmoothingKind::Sma => sma::lookback(self.window),
            SmoothingKind::Ema => ema::LOOKBACK,
        }
    }
}

/// MACD span presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum MacdSpans {
    /// 12 / 26 / 9.
    #[default]
    Standard,
    /// 15 / 30 / 9.
    Alternate,
    Custom {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl MacdSpans {
    /// (fast, slow, signal) spans.
    pub fn spans(&self) -> (usize, usize, usize) {
        match *self {
            MacdSpans::Standard => (12, 26, 9),
            MacdSpans::Alternate => (15, 30, 9),
            MacdSpans::Custom { fast, slow, signal } => (fast, slow, signal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub cci_period: usize,
    pub macd: MacdSpans,
    pub rsi_signal: SignalSmoothing,
    pub cci_signal: SignalSmoothing,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_fast: 20,
            sma_slow: 50,
            rsi_period: 14,
            cci_period: 20,
            macd: MacdSpans::Standard,
            rsi_signal: SignalSmoothing::sma(10),
            cci_signal: SignalSmoothing::sma(10),
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (fast, slow, signal) = self.macd.spans();
        let windows = [
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("macd.fast", fast),
            ("macd.slow", slow),
            ("macd.signal", signal),
            ("rsi_period", self.rsi_period),
            ("rsi_signal.window", self.rsi_signal.window),
            ("cci_period", self.cci_period),
            ("cci_signal.window", self.cci_signal.window),
        ];
        if let Some(&(field, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(ConfigError::ZeroWindow { field });
        }
        if self.sma_fast >= self.sma_slow {
            return Err(ConfigError::FastNotBelowSlow {
                fast_field: "sma_fast",
                fast: self.sma_fast,
                slow_field: "sma_slow",
                slow: self.sma_slow,
            });
        }
        if fast >= slow {
            return Err(ConfigError::FastNotBelowSlow {
                fast_field: "macd.fast",
                fast,
                slow_field: "macd.slow",
                slow,
            });
        }
        Ok(())
    }

    /// Smallest series length whose last row has every column defined.
    ///
    /// Each column's first defined index is its kernel's lookback, plus the
    /// smoothing lookback for signal lines; the length is that index + 1.
    pub fn required_history(&self) -> usize {
        let rsi_lookback = rsi::LOOKBACK;
        let cci_lookback = cci::lookback(self.cci_period);
        [
            sma::lookback(self.sma_fast),
            sma::lookback(self.sma_slow),
            macd::LOOKBACK,
            rsi_lookback,
            rsi_lookback + self.rsi_signal.lookback(),
            cci_lookback,
            cci_lookback + self.cci_signal.lookback(),
        ]
        .into_iter()
        .max()
        .map_or(1, |lookback| lookback + 1)
    }

    /// Resolve an optional explicit minimum against the derived requirement.
    pub fn effective_min_history(&self, explicit: Option<usize>) -> Result<usize, ConfigError> {
        let required = self.required_history();
        match explicit {
            Some(given) if given < required => {
                Err(ConfigError::MinHistoryTooShort { given, required })
            }
            Some(given) => Ok(given),
            None => Ok(required),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_fifty_rows() {
        let config = IndicatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_history(), 50);
    }

    #[test]
    fn long_signal_window_can_dominate() {
        let config = IndicatorConfig {
            sma_fast: 5,
            sma_slow: 10,
            rsi_signal: SignalSmoothing::sma(20),
            ..IndicatorConfig::default()
        };
        // rsi from index 1 plus 19 rows of smoothing: 21 rows;
        // cci from index 19 plus 9 rows of smoothing: 29 rows
        assert_eq!(config.required_history(), 29);

        let config = IndicatorConfig {
            rsi_signal: SignalSmoothing::sma(40),
            ..config
        };
        assert_eq!(config.required_history(), 41);
    }

    #[test]
    fn ema_signal_adds_no_lookback() {
        let config = IndicatorConfig {
            sma_fast: 2,
            sma_slow: 3,
            rsi_signal: SignalSmoothing::ema(10),
            cci_signal: SignalSmoothing::ema(10),
            ..IndicatorConfig::default()
        };
        assert_eq!(config.required_history(), 20);
    }

    #[test]
    fn macd_presets() {
        assert_eq!(MacdSpans::Standard.spans(), (12, 26, 9));
        assert_eq!(MacdSpans::Alternate.spans(), (15, 30, 9));
        let custom = MacdSpans::Custom {
            fast: 5,
            slow: 35,
            signal: 5,
        };
        assert_eq!(custom.spans(), (5, 35, 5));
    }

    #[test]
    fn rejects_zero_window() {
        let config = IndicatorConfig {
            rsi_period: 0,
            ..IndicatorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroWindow {
                field: "rsi_period"
            })
        );
    }

    #[test]
    fn rejects_inverted_moving_averages() {
        let config = IndicatorConfig {
            sma_fast: 50,
            sma_slow: 20,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FastNotBelowSlow { .. })
        ));

        let config = IndicatorConfig {
            macd: MacdSpans::Custom {
                fast: 26,
                slow: 12,
                signal: 9,
            },
            ..IndicatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_min_history() {
        let config = IndicatorConfig::default();
        assert_eq!(config.effective_min_history(None), Ok(50));
        assert_eq!(config.effective_min_history(Some(80)), Ok(80));
        assert_eq!(
            config.effective_min_history(Some(30)),
            Err(ConfigError::MinHistoryTooShort {
                given: 30,
                required: 50
            })
        );
    }

    #[test]
    fn smoothing_applies_kind() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let sma = SignalSmoothing::sma(2).apply(&values);
        assert!(sma[0].is_nan());
        assert_eq!(sma[3], 3.5);
        let ema = SignalSmoothing::ema(3).apply(&values);
        assert_eq!(ema[0], 1.0);
        assert_eq!(ema[1], 1.5);
    }

    #[test]
    fn serde_round_trip_json() {
        let config = IndicatorConfig {
            macd: MacdSpans::Alternate,
            cci_signal: SignalSmoothing::ema(14),
            ..IndicatorConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"preset\":\"alternate\""));
        let back: IndicatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: IndicatorConfig = serde_json::from_str(r#"{"sma_fast": 10}"#).unwrap();
        assert_eq!(config.sma_fast, 10);
        assert_eq!(config.sma_slow, 50);
        assert_eq!(config.macd, MacdSpans::Standard);
    }
}
