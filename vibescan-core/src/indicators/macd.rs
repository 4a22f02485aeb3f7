//! MACD momentum histogram and its signal line.
//!
//! Histogram = EMA(close, fast) - EMA(close, slow)
//! Signal    = EMA(histogram, signal)
//! Both EMAs seed at the first input, so neither band has a warmup.

use super::ema::ema_of_series;

/// Leading undefined cells when the input is defined from index 0.
pub const LOOKBACK: usize = 0;

/// Compute both bands in one pass over the EMAs.
pub fn macd_bands(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    let histogram: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&histogram, signal);
    (histogram, signal_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, first_defined, DEFAULT_EPSILON};

    #[test]
    fn histogram_starts_at_zero() {
        let (hist, sig) = macd_bands(&[10.0, 11.0, 12.0], 12, 26, 9);
        assert_approx(hist[0], 0.0, DEFAULT_EPSILON);
        assert_approx(sig[0], 0.0, DEFAULT_EPSILON);
        assert_eq!(first_defined(&hist), Some(LOOKBACK));
        assert_eq!(first_defined(&sig), Some(LOOKBACK));
    }

    #[test]
    fn known_values_small_spans() {
        // fast=1 → EMA is the input; slow=3 → alpha 0.5
        // slow EMA: 10, 10.5, 11.25 → histogram 0, 0.5, 0.75
        // signal span 3 on histogram: 0, 0.25, 0.5
        let (hist, sig) = macd_bands(&[10.0, 11.0, 12.0], 1, 3, 3);
        assert_approx(hist[1], 0.5, DEFAULT_EPSILON);
        assert_approx(hist[2], 0.75, DEFAULT_EPSILON);
        assert_approx(sig[1], 0.25, DEFAULT_EPSILON);
        assert_approx(sig[2], 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn uptrend_histogram_leads_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.5 * i as f64).collect();
        let (hist, sig) = macd_bands(&closes, 12, 26, 9);
        assert!(hist[59] > 0.0);
        assert!(hist[59] > sig[59]);
        assert_approx(hist[59], 17.16741, 1e-4);
        assert_approx(sig[59], 17.01244, 1e-4);
    }

    #[test]
    fn alternate_spans_match_their_emas() {
        let closes: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).sin() * 5.0 + 50.0).collect();
        let (hist, sig) = macd_bands(&closes, 15, 30, 9);
        let fast = ema_of_series(&closes, 15);
        let slow = ema_of_series(&closes, 30);
        for i in 0..closes.len() {
            assert_approx(hist[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
        assert_eq!(sig, ema_of_series(&hist, 9));
    }
}
