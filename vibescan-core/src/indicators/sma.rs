//! Simple Moving Average (SMA).
//!
//! Rolling mean over a fixed window, maintained as a running sum plus a
//! count of undefined cells in the window.
//! Lookback: period - 1 (first valid value at index period-1).

/// Leading undefined cells when the input is defined from index 0.
pub fn lookback(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Rolling mean of `values`; a cell is defined only when its whole window is.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut undefined_in_window = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            undefined_in_window += 1;
        } else {
            sum += entering;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                undefined_in_window -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && undefined_in_window == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, first_defined, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result = sma_of_series(&values, 5);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_identity() {
        let result = sma_of_series(&[100.0, 200.0, 300.0], 1);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_leading_undefined_input() {
        // An oscillator with warmup feeding a signal line.
        let values = [f64::NAN, f64::NAN, 3.0, 6.0, 9.0, 12.0];
        let result = sma_of_series(&values, 3);
        assert!(result[..4].iter().all(|v| v.is_nan()));
        assert_approx(result[4], 6.0, DEFAULT_EPSILON);
        assert_approx(result[5], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_gap_in_window() {
        let values = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let result = sma_of_series(&values, 3);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(lookback(20), 19);
        assert_eq!(lookback(1), 0);
        let out = sma_of_series(&[1.0; 30], 20);
        assert_eq!(first_defined(&out), Some(lookback(20)));
    }

    #[test]
    fn sma_too_few_values() {
        let result = sma_of_series(&[10.0, 11.0], 5);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
