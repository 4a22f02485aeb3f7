//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA at the first defined input equals that input (no warmup window).
//! Lookback: 0.

use super::first_defined;

/// Leading undefined cells when the input is defined from index 0.
pub const LOOKBACK: usize = 0;

/// EMA of an arbitrary series.
///
/// Leading undefined cells stay undefined; an undefined cell after the seed
/// taints every later cell.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let Some(start) = first_defined(values) else {
        return result;
    };
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[start];
    result[start] = prev;

    for i in (start + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
