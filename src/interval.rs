//! Tool-busy interval merging
//!
//! Concurrent tool calls overlap in wall-clock time. Their busy windows are
//! merged into a non-overlapping set before summing, so overlapping time is
//! only subtracted once from the generation duration.

/// A closed time range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Build a range, rejecting non-finite bounds and `end <= start`
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return None;
        }
        Some(Self { start, end })
    }

    /// Length of the range in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.end - self.start
    }
}

/// Merge overlapping and adjacent ranges
///
/// The result is sorted by start and pairwise disjoint.
pub fn merge_ranges(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut active) = iter.next() else {
        return merged;
    };

    for range in iter {
        if range.start <= active.end {
            active.end = active.end.max(range.end);
            continue;
        }
        merged.push(active);
        active = range;
    }
    merged.push(active);
    merged
}

/// Total wall-clock milliseconds covered by the union of `ranges`
pub fn merged_duration_ms(ranges: &[TimeRange]) -> f64 {
    merge_ranges(ranges).iter().map(TimeRange::duration_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: f64, end: f64) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_overlapping_ranges_merge() {
        let ranges = [range(0.0, 100.0), range(50.0, 150.0)];
        assert_eq!(merge_ranges(&ranges), vec![range(0.0, 150.0)]);
        assert_eq!(merged_duration_ms(&ranges), 150.0);
    }

    #[test]
    fn test_disjoint_ranges_sum() {
        let ranges = [range(0.0, 50.0), range(100.0, 150.0)];
        assert_eq!(merge_ranges(&ranges).len(), 2);
        assert_eq!(merged_duration_ms(&ranges), 100.0);
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let ranges = [range(0.0, 50.0), range(50.0, 80.0)];
        assert_eq!(merge_ranges(&ranges), vec![range(0.0, 80.0)]);
    }

    #[test]
    fn test_unsorted_input() {
        let ranges = [range(300.0, 400.0), range(0.0, 100.0), range(90.0, 120.0)];
        assert_eq!(
            merge_ranges(&ranges),
            vec![range(0.0, 120.0), range(300.0, 400.0)]
        );
        assert_eq!(merged_duration_ms(&ranges), 220.0);
    }

    #[test]
    fn test_contained_range() {
        let ranges = [range(0.0, 1000.0), range(200.0, 300.0)];
        assert_eq!(merged_duration_ms(&ranges), 1000.0);
    }

    #[test]
    fn test_empty() {
        assert!(merge_ranges(&[]).is_empty());
        assert_eq!(merged_duration_ms(&[]), 0.0);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert!(TimeRange::new(100.0, 100.0).is_none());
        assert!(TimeRange::new(100.0, 50.0).is_none());
        assert!(TimeRange::new(f64::NAN, 50.0).is_none());
        assert!(TimeRange::new(0.0, f64::INFINITY).is_none());
    }
}
