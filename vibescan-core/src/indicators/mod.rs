//! Indicator kernels.
//!
//! Every kernel is a pure function from a value series to an output series of
//! the same length. Cells that do not yet have enough history are `f64::NAN`
//! (the "undefined" marker); nothing is zero-filled or back-filled. All
//! kernels run in a single forward pass (CCI adds a log factor for its
//! sliding mean absolute deviation).
//!
//! Each kernel module also exports its lookback: the number of leading
//! undefined cells when the input is defined from index 0. Minimum-history
//! derivation in `config` is built from these.

pub mod cci;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use cci::cci_of_series;
pub use ema::ema_of_series;
pub use macd::macd_bands;
pub use rsi::wilder_rsi;
pub use sma::sma_of_series;

/// Index of the first defined cell, if any.
pub fn first_defined(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_nan())
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
