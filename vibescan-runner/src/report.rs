//! RunReport — the ranked, immutable outcome of one scan.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::evaluate::ScoreResult;

/// A file that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub file: String,
    pub ticker: String,
    pub reason: String,
}

/// Result of one unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Completed(ScoreResult),
    Failed(ScanFailure),
}

impl ScanOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            ScanOutcome::Completed(r) => &r.ticker,
            ScanOutcome::Failed(f) => &f.ticker,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScanOutcome::Failed(_))
    }
}

/// Score descending, ticker ascending on ties.
pub fn rank_order(a: &ScoreResult, b: &ScoreResult) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.ticker.cmp(&b.ticker))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_date: NaiveDate,
    /// Ranked successes.
    pub results: Vec<ScoreResult>,
    /// Failures in file-name order.
    pub failures: Vec<ScanFailure>,
    /// Files excluded by the ticker list.
    pub skipped: usize,
}

impl RunReport {
    /// Collect outcomes in any completion order into a deterministic report.
    pub fn from_outcomes(
        run_date: NaiveDate,
        outcomes: impl IntoIterator<Item = ScanOutcome>,
        skipped: usize,
    ) -> Self {
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                ScanOutcome::Completed(r) => results.push(r),
                ScanOutcome::Failed(f) => failures.push(f),
            }
        }
        results.sort_by(rank_order);
        failures.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.ticker.cmp(&b.ticker)));
        Self {
            run_date,
            results,
            failures,
            skipped,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Files that were dispatched or reported (everything except skipped).
    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }

    pub fn top(&self, n: usize) -> &[ScoreResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn failure_preview(&self, limit: usize) -> &[ScanFailure] {
        &self.failures[..limit.min(self.failures.len())]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use vibescan_core::{classify, ScoreBreakdown};

    pub(crate) fn result(ticker: &str, score: i32) -> ScoreResult {
        let labels = classify(score);
        ScoreResult {
            ticker: ticker.to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            close: 100.0,
            sma_fast: 99.0,
            sma_slow: 98.0,
            cci: 10.0,
            cci_signal: 5.0,
            macd_hist: 0.5,
            macd_signal: 0.25,
            rsi: 55.0,
            rsi_signal: 50.0,
            breakdown: ScoreBreakdown {
                trend: score,
                momentum: 0,
                volatility: 0,
            },
            score,
            sentiment: labels.sentiment,
            action: labels.action,
        }
    }

    fn failure(file: &str) -> ScanFailure {
        ScanFailure {
            file: file.to_string(),
            ticker: file.trim_end_matches(".csv").to_string(),
            reason: "missing close column".to_string(),
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn ties_break_on_ticker() {
        let outcomes = vec![
            ScanOutcome::Completed(result("BBB", 5)),
            ScanOutcome::Completed(result("AAA", 5)),
            ScanOutcome::Completed(result("ZZZ", -2)),
        ];
        let report = RunReport::from_outcomes(run_date(), outcomes, 0);
        let order: Vec<(&str, i32)> = report
            .results
            .iter()
            .map(|r| (r.ticker.as_str(), r.score))
            .collect();
        assert_eq!(order, vec![("AAA", 5), ("BBB", 5), ("ZZZ", -2)]);
    }

    #[test]
    fn order_does_not_depend_on_arrival() {
        let a = vec![
            ScanOutcome::Completed(result("C", 1)),
            ScanOutcome::Failed(failure("Y.csv")),
            ScanOutcome::Completed(result("A", 7)),
            ScanOutcome::Failed(failure("X.csv")),
            ScanOutcome::Completed(result("B", 1)),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(
            RunReport::from_outcomes(run_date(), a, 2),
            RunReport::from_outcomes(run_date(), b, 2)
        );
    }

    #[test]
    fn failures_stay_out_of_ranking() {
        let outcomes = vec![
            ScanOutcome::Failed(failure("BAD.csv")),
            ScanOutcome::Completed(result("GOOD", 3)),
        ];
        let report = RunReport::from_outcomes(run_date(), outcomes, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total(), 2);
        assert_eq!(report.skipped, 1);
        assert!(report.results.iter().all(|r| r.ticker != "BAD"));
    }

    #[test]
    fn top_and_preview_are_bounded() {
        let outcomes: Vec<ScanOutcome> = (0..30)
            .map(|i| ScanOutcome::Failed(failure(&format!("F{i:02}.csv"))))
            .chain((0..5).map(|i| ScanOutcome::Completed(result(&format!("T{i}"), i))))
            .collect();
        let report = RunReport::from_outcomes(run_date(), outcomes, 0);
        assert_eq!(report.failure_preview(15).len(), 15);
        assert_eq!(report.failure_preview(15)[0].file, "F00.csv");
        assert_eq!(report.top(20).len(), 5);
        assert_eq!(report.top(2)[0].ticker, "T4");
    }
}
