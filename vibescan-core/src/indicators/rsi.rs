//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! Gains and losses are the positive and negative parts of each close-to-close
//! change. Both averages seed at the first change (index 1) and are then
//! smoothed with factor 1/period:
//!   avg = (1/period) * x + (1 - 1/period) * avg
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: 1 (the first row has no change).
//! Degenerate case: avg_loss == 0 saturates to 100 (this includes a flat series).

/// Leading undefined cells when the input is defined from index 0.
pub const LOOKBACK: usize = 1;

/// Wilder RSI of a value series.
///
/// An undefined input after the seed leaves every later cell undefined.
pub fn wilder_rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < 2 {
        return result;
    }

    let alpha = 1.0 / period as f64;
    let mut averages: Option<(f64, f64)> = None;

    for i in 1..n {
        let ch = values[i] - values[i - 1];
        if ch.is_nan() {
            return result;
        }

        let gain = ch.max(0.0);
        let loss = (-ch).max(0.0);

        let (avg_gain, avg_loss) = match averages {
            None => (gain, loss),
            Some((g, l)) => (alpha * gain + (1.0 - alpha) * g, alpha * loss + (1.0 - alpha) * l),
        };
        averages = Some((avg_gain, avg_loss));

        result[i] = compute_rsi(avg_gain, avg_loss);
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
