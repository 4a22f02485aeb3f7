//! Domain types for VibeScan.

pub mod series;

pub use series::{Observation, RawSeries, SeriesError};
