//! Canonicalization: stable sort by date, drop repeated dates.

use crate::domain::Observation;

/// What canonicalization changed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalizeStats {
    pub was_sorted: bool,
    pub duplicates_dropped: usize,
}

/// Sort observations ascending by date and keep the first occurrence of each
/// date (in file order), so the result is strictly ascending.
pub fn canonicalize(observations: &mut Vec<Observation>) -> CanonicalizeStats {
    let was_sorted = observations.windows(2).all(|w| w[0].date <= w[1].date);
    if !was_sorted {
        // sort_by_key is stable: equal dates keep file order
        observations.sort_by_key(|o| o.date);
    }
    let before = observations.len();
    observations.dedup_by_key(|o| o.date);
    CanonicalizeStats {
        was_sorted,
        duplicates_dropped: before - observations.len(),
    }
}
