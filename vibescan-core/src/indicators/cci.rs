//! Commodity Channel Index (CCI) over typical price.
//!
//! CCI[t] = (tp[t] - mean) / (0.015 * mean_abs_dev), both over the trailing
//! `period` window ending at t.
//! Lookback: period - 1.
//!
//! The mean absolute deviation is computed from a sliding window kept in two
//! Fenwick trees (count and sum, indexed by value rank), so each row costs
//! O(log n) instead of a rescan of the window:
//!   sum |x - m| = (m * n_le - sum_le) + (sum_gt - m * n_gt)
//!
//! A deviation of (numerically) zero is replaced by `DEVIATION_EPSILON` in the
//! denominator, so a flat window yields a finite value.

/// Lambert's scaling constant.
pub const CCI_CONSTANT: f64 = 0.015;

/// Floor for the CCI denominator.
pub const DEVIATION_EPSILON: f64 = 1e-9;

/// Leading undefined cells when the input is defined from index 0.
pub fn lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Count/sum Fenwick trees over value ranks.
struct RankedWindow {
    counts: Vec<i64>,
    sums: Vec<f64>,
}

impl RankedWindow {
    fn new(levels: usize) -> Self {
        Self {
            counts: vec![0; levels],
            sums: vec![0.0; levels],
        }
    }

    fn update(&mut self, rank: usize, count: i64, value: f64) {
        let mut i = rank + 1;
        while i <= self.counts.len() {
            self.counts[i - 1] += count;
            self.sums[i - 1] += value;
            i += i & i.wrapping_neg();
        }
    }

    /// Count and sum of the `k` lowest ranks.
    fn prefix(&self, k: usize) -> (i64, f64) {
        let mut count = 0;
        let mut sum = 0.0;
        let mut i = k;
        while i > 0 {
            count += self.counts[i - 1];
            sum += self.sums[i - 1];
            i &= i - 1;
        }
        (count, sum)
    }
}

/// CCI of an arbitrary series. A window containing an undefined cell yields
/// an undefined output.
pub fn cci_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut levels: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup();
    let rank_of = |v: f64| levels.partition_point(|&x| x < v);

    let mut window = RankedWindow::new(levels.len());
    let mut undefined_in_window = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            undefined_in_window += 1;
        } else {
            window.update(rank_of(entering), 1, entering);
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                undefined_in_window -= 1;
            } else {
                window.update(rank_of(leaving), -1, -leaving);
            }
        }

        if i + 1 < period || undefined_in_window > 0 {
            continue;
        }

        let (_, total) = window.prefix(levels.len());
        let mean = total / period as f64;
        let at_or_below = levels.partition_point(|&x| x <= mean);
        let (n_le, sum_le) = window.prefix(at_or_below);
        let n_gt = period as i64 - n_le;
        let sum_gt = total - sum_le;

        let abs_dev = (mean * n_le as f64 - sum_le) + (sum_gt - mean * n_gt as f64);
        let mean_abs_dev = (abs_dev / period as f64).max(0.0);

        let mut denom = CCI_CONSTANT * mean_abs_dev;
        if denom.abs() <= DEVIATION_EPSILON {
            denom = DEVIATION_EPSILON;
        }
        result[i] = (entering - mean) / denom;
    }

    result
}
