//! Coverage Engine — 1-D vertical interval-union coverage.
//!
//! Callers clip intervals to their region before handing them over; this module
//! only merges and measures.

use serde::{Deserialize, Serialize};

/// A vertical `(y_start, y_end)` span, already clipped to the region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageInterval {
    pub y_start: f64,
    pub y_end: f64,
}

impl CoverageInterval {
    pub fn new(y_start: f64, y_end: f64) -> Self {
        Self { y_start, y_end }
    }

    pub fn is_degenerate(&self) -> bool {
        self.y_end <= self.y_start || self.y_start.is_nan() || self.y_end.is_nan()
    }
}

impl From<(f64, f64)> for CoverageInterval {
    fn from((y_start, y_end): (f64, f64)) -> Self {
        Self::new(y_start, y_end)
    }
}

/// Total length of the union of `intervals`. Degenerate spans contribute nothing.
///
/// Sort by start, then merge overlapping or touching spans in one pass.
pub fn union_length(intervals: &[CoverageInterval]) -> f64 {
    let mut spans: Vec<CoverageInterval> =
        intervals.iter().copied().filter(|i| !i.is_degenerate()).collect();
    if spans.is_empty() {
        return 0.0;
    }
    spans.sort_by(|a, b| a.y_start.total_cmp(&b.y_start));

    let mut total = 0.0;
    let mut current = spans[0];
    for span in &spans[1..] {
        if span.y_start <= current.y_end {
            current.y_end = current.y_end.max(span.y_end);
        } else {
            total += current.y_end - current.y_start;
            current = *span;
        }
    }
    total + (current.y_end - current.y_start)
}

/// `union_length / region_height`, clamped to `[0, 1]`. Empty input is 0, never 1.
pub fn coverage_ratio(intervals: &[CoverageInterval], region_height: f64) -> f64 {
    if region_height <= 0.0 {
        return 0.0;
    }
    (union_length(intervals) / region_height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spans(v: &[(f64, f64)]) -> Vec<CoverageInterval> {
        v.iter().copied().map(CoverageInterval::from).collect()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(union_length(&[]), 0.0);
        assert_eq!(coverage_ratio(&[], 720.0), 0.0);
    }

    #[test]
    fn test_overlapping_and_touching_merge() {
        let v = spans(&[(0.0, 10.0), (5.0, 20.0), (20.0, 30.0), (40.0, 45.0)]);
        assert!((union_length(&v) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_intervals_dropped() {
        let v = spans(&[(10.0, 10.0), (30.0, 20.0), (0.0, 5.0)]);
        assert!((union_length(&v) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_nested_interval_counts_once() {
        let v = spans(&[(0.0, 100.0), (10.0, 20.0), (30.0, 40.0)]);
        assert!((union_length(&v) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_clamped_to_one() {
        let v = spans(&[(0.0, 900.0)]);
        assert_eq!(coverage_ratio(&v, 720.0), 1.0);
    }

    #[test]
    fn test_zero_height_region() {
        assert_eq!(coverage_ratio(&spans(&[(0.0, 10.0)]), 0.0), 0.0);
    }

    fn interval_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        let interval = (0.0f64..700.0, 0.0f64..120.0).prop_map(|(a, len)| (a, a + len));
        prop::collection::vec(interval, 0..40)
    }

    proptest! {
        #[test]
        fn proptest_union_invariant_under_reordering(raw in interval_strategy()) {
            let forward = spans(&raw);
            let mut reversed = forward.clone();
            reversed.reverse();
            prop_assert!((union_length(&forward) - union_length(&reversed)).abs() < 1e-6);
        }

        #[test]
        fn proptest_union_idempotent_under_duplicates(raw in interval_strategy()) {
            let once = spans(&raw);
            let mut twice = once.clone();
            twice.extend(once.iter().copied());
            prop_assert!((union_length(&once) - union_length(&twice)).abs() < 1e-6);
        }

        #[test]
        fn proptest_ratio_within_unit_range(raw in interval_strategy(), height in 1.0f64..1000.0) {
            let r = coverage_ratio(&spans(&raw), height);
            prop_assert!((0.0..=1.0).contains(&r));
        }

        #[test]
        fn proptest_union_never_exceeds_sum(raw in interval_strategy()) {
            let v = spans(&raw);
            let sum: f64 = v.iter().map(|i| i.y_end - i.y_start).sum();
            prop_assert!(union_length(&v) <= sum + 1e-6);
        }
    }
}
