//! Indicator Builder — one `RawSeries` in, one aligned `IndicatorTable` out.
//!
//! Every column is computed once over the whole series by a single-pass
//! kernel. Columns share the series' row count and ordering; cells without
//! enough history hold `f64::NAN`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::IndicatorConfig;
use crate::domain::RawSeries;
use crate::indicators::cci::cci_of_series;
use crate::indicators::macd::macd_bands;
use crate::indicators::rsi::wilder_rsi;
use crate::indicators::sma::sma_of_series;

/// Column-oriented indicator table. NaN marks an undefined cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub sma_fast: Vec<f64>,
    pub sma_slow: Vec<f64>,
    pub macd_hist: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub rsi: Vec<f64>,
    pub rsi_signal: Vec<f64>,
    pub cci: Vec<f64>,
    pub cci_signal: Vec<f64>,
}

/// One row of an `IndicatorTable`, with undefined cells as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub macd_hist: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_signal: Option<f64>,
    pub cci: Option<f64>,
    pub cci_signal: Option<f64>,
}

fn defined(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

impl IndicatorRow {
    /// Names of the cells that are undefined, in column order.
    pub fn undefined_fields(&self) -> Vec<&'static str> {
        [
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("macd_hist", self.macd_hist),
            ("macd_signal", self.macd_signal),
            ("rsi", self.rsi),
            ("rsi_signal", self.rsi_signal),
            ("cci", self.cci),
            ("cci_signal", self.cci_signal),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.undefined_fields().is_empty()
    }
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<IndicatorRow> {
        if i >= self.len() {
            return None;
        }
        Some(IndicatorRow {
            date: self.dates[i],
            close: self.close[i],
            sma_fast: defined(self.sma_fast[i]),
            sma_slow: defined(self.sma_slow[i]),
            macd_hist: defined(self.macd_hist[i]),
            macd_signal: defined(self.macd_signal[i]),
            rsi: defined(self.rsi[i]),
            rsi_signal: defined(self.rsi_signal[i]),
            cci: defined(self.cci[i]),
            cci_signal: defined(self.cci_signal[i]),
        })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Index of the first row with every cell defined.
    pub fn first_complete_index(&self) -> Option<usize> {
        (0..self.len()).find(|&i| self.row(i).is_some_and(|r| r.is_complete()))
    }
}

/// Compute every indicator column for `series`.
///
/// `config` is expected to have passed `IndicatorConfig::validate`; a zero
/// window yields an all-undefined column rather than a panic.
pub fn build_indicators(series: &RawSeries, config: &IndicatorConfig) -> IndicatorTable {
    let closes = series.closes();
    let typical = series.typical_prices();
    let (fast, slow, signal) = config.macd.spans();

    let (macd_hist, macd_signal) = macd_bands(&closes, fast, slow, signal);
    let rsi = wilder_rsi(&closes, config.rsi_period);
    let rsi_signal = config.rsi_signal.apply(&rsi);
    let cci = cci_of_series(&typical, config.cci_period);
    let cci_signal = config.cci_signal.apply(&cci);

    IndicatorTable {
        dates: series.observations().iter().map(|o| o.date).collect(),
        sma_fast: sma_of_series(&closes, config.sma_fast),
        sma_slow: sma_of_series(&closes, config.sma_slow),
        close: closes,
        macd_hist,
        macd_signal,
        rsi,
        rsi_signal,
        cci,
        cci_signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalSmoothing;
    use crate::domain::Observation;

    fn series_from(closes: &[f64]) -> RawSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let obs = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Observation::new(start + chrono::Duration::weeks(i as i64), c))
            .collect();
        RawSeries::new("TEST", obs).unwrap()
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn columns_align_with_series() {
        let series = series_from(&ramp(70));
        let table = build_indicators(&series, &IndicatorConfig::default());
        assert_eq!(table.len(), 70);
        for col in [
            &table.close,
            &table.sma_fast,
            &table.sma_slow,
            &table.macd_hist,
            &table.macd_signal,
            &table.rsi,
            &table.rsi_signal,
            &table.cci,
            &table.cci_signal,
        ] {
            assert_eq!(col.len(), 70);
        }
        assert_eq!(table.dates[0], series.first_date());
        assert_eq!(table.dates[69], series.last_date());
    }

    #[test]
    fn warmup_is_undefined_not_zero() {
        let series = series_from(&ramp(70));
        let table = build_indicators(&series, &IndicatorConfig::default());
        assert!(table.sma_fast[..19].iter().all(|v| v.is_nan()));
        assert!(table.sma_slow[..49].iter().all(|v| v.is_nan()));
        assert!(table.rsi[0].is_nan());
        assert!(table.cci[..19].iter().all(|v| v.is_nan()));
        assert!(!table.sma_fast[19].is_nan());
        assert!(!table.rsi[1].is_nan());
    }

    #[test]
    fn first_complete_row_matches_required_history() {
        let config = IndicatorConfig::default();
        let series = series_from(&ramp(70));
        let table = build_indicators(&series, &config);
        assert_eq!(table.first_complete_index(), Some(config.required_history() - 1));

        let config = IndicatorConfig {
            sma_fast: 3,
            sma_slow: 5,
            rsi_signal: SignalSmoothing::sma(15),
            ..IndicatorConfig::default()
        };
        let table = build_indicators(&series, &config);
        assert_eq!(table.first_complete_index(), Some(config.required_history() - 1));
    }

    #[test]
    fn short_series_last_row_reports_missing_fields() {
        let series = series_from(&ramp(30));
        let table = build_indicators(&series, &IndicatorConfig::default());
        let last = table.last_row().unwrap();
        assert_eq!(last.undefined_fields(), vec!["sma_slow"]);
        assert!(!last.is_complete());
    }

    #[test]
    fn row_out_of_range() {
        let series = series_from(&ramp(5));
        let table = build_indicators(&series, &IndicatorConfig::default());
        assert!(table.row(5).is_none());
        assert_eq!(table.last_row().unwrap().close, 104.0);
    }

    #[test]
    fn cci_uses_typical_price_when_range_present() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let obs: Vec<Observation> = (0..30)
            .map(|i| {
                let c = 100.0 + (i % 7) as f64;
                Observation::new(start + chrono::Duration::days(i), c).with_range(c + 3.0, c - 1.0)
            })
            .collect();
        let with_range = RawSeries::new("R", obs.clone()).unwrap();
        let close_only = RawSeries::new(
            "C",
            obs.iter().map(|o| Observation::new(o.date, o.close)).collect(),
        )
        .unwrap();
        let config = IndicatorConfig::default();
        let a = build_indicators(&with_range, &config);
        let b = build_indicators(&close_only, &config);
        // same shape, shifted by 2/3: deviations match, mean differs by a constant
        assert!((a.cci[29] - b.cci[29]).abs() < 1e-9);
        assert_eq!(a.sma_fast[29], b.sma_fast[29]);
    }

    #[test]
    fn missing_extreme_leaves_cci_undefined() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut obs: Vec<Observation> = ramp(60)
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                Observation::new(start + chrono::Duration::weeks(i as i64), c)
                    .with_range(c + 2.0, c - 1.0)
            })
            .collect();
        obs[59].high = None;
        let series = RawSeries::new("GAP", obs).unwrap();
        let table = build_indicators(&series, &IndicatorConfig::default());
        assert!(table.cci[58].is_finite());
        assert!(table.cci[59].is_nan());
        assert!(table.cci_signal[59].is_nan());
        let last = table.last_row().unwrap();
        assert_eq!(last.undefined_fields(), vec!["cci", "cci_signal"]);
    }
}
