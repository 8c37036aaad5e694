//! Column statistics: first, last, minimum, maximum, and mean of a numeric column.
//!
//! Statistics are always taken over raw, untransformed values so they read in
//! the column's original units.

use num_traits::ToPrimitive;

use crate::types::Stats;

/// Computes statistics over a full column. Returns `None` for an empty column
/// or one containing no value convertible to `f64`.
pub fn compute_column_stats<T: ToPrimitive>(column: &[T]) -> Option<Stats> {
    let mut values = column.iter().filter_map(|v| v.to_f64());
    let first = values.next()?;

    let mut stats = Stats {
        start: first,
        end: first,
        min: first,
        max: first,
        mean: 0.0,
        count: None,
    };
    let mut sum = first;
    let mut count = 1usize;
    for v in values {
        stats.end = v;
        stats.min = stats.min.min(v);
        stats.max = stats.max.max(v);
        sum += v;
        count += 1;
    }
    stats.mean = sum / count as f64;
    stats.count = Some(count as u64);
    Some(stats)
}

/// Folds appended values into existing statistics. `start` is kept, `end`
/// moves to the last appended value, and `mean` is re-weighted by the number
/// of values each side covers.
///
/// `fallback_count` stands in for `existing.count` when the stored statistics
/// carry no count.
pub fn merge_column_stats<T: ToPrimitive>(
    existing: &Stats,
    fallback_count: u64,
    appended: &[T],
) -> Stats {
    let Some(tail) = compute_column_stats(appended) else {
        return *existing;
    };
    let existing_count = existing.count.unwrap_or(fallback_count);
    let appended_count = tail.count.unwrap_or(0);
    let total = existing_count + appended_count;

    Stats {
        start: existing.start,
        end: tail.end,
        min: existing.min.min(tail.min),
        max: existing.max.max(tail.max),
        mean: (existing.mean * existing_count as f64 + tail.mean * appended_count as f64)
            / total as f64,
        count: Some(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let stats = compute_column_stats(&[20.5f64, 25.0, 18.2, 30.1, 22.8]).unwrap();
        assert_eq!(stats.start, 20.5);
        assert_eq!(stats.end, 22.8);
        assert_eq!(stats.min, 18.2);
        assert_eq!(stats.max, 30.1);
        assert!((stats.mean - 23.32).abs() < 1e-9);
    }

    #[test]
    fn test_integer_columns() {
        let stats = compute_column_stats(&[100i64, 150, 75, 200, 125]).unwrap();
        assert_eq!(stats.min, 75.0);
        assert_eq!(stats.max, 200.0);
        assert_eq!(stats.mean, 130.0);
    }

    #[test]
    fn test_empty_column_has_no_stats() {
        assert!(compute_column_stats::<f64>(&[]).is_none());
    }

    #[test]
    fn test_merge_matches_full_recompute() {
        let first = [3.0f64, 1.0, 4.0];
        let second = [1.0f64, 5.0];
        let merged = merge_column_stats(&compute_column_stats(&first).unwrap(), 3, &second);

        let all: Vec<f64> = first.iter().chain(second.iter()).copied().collect();
        let full = compute_column_stats(&all).unwrap();
        assert_eq!(merged.start, full.start);
        assert_eq!(merged.end, full.end);
        assert_eq!(merged.min, full.min);
        assert_eq!(merged.max, full.max);
        assert!((merged.mean - full.mean).abs() < 1e-12);
        assert_eq!(merged.count, Some(5));
    }

    #[test]
    fn test_merge_weights_by_covered_values_not_rows() {
        // Four rows were encoded but one was null, so the stats cover three values.
        let existing = compute_column_stats(&[1.0f64, 3.0, 5.0]).unwrap();
        assert_eq!(existing.count, Some(3));
        let merged = merge_column_stats(&existing, 4, &[7.0f64]);
        assert_eq!(merged.mean, 4.0);
        assert_eq!(merged.count, Some(4));
    }

    #[test]
    fn test_merge_falls_back_to_row_count_without_a_stored_count() {
        let existing = Stats {
            count: None,
            ..compute_column_stats(&[2.0f64, 4.0]).unwrap()
        };
        let merged = merge_column_stats(&existing, 2, &[6.0f64]);
        assert_eq!(merged.mean, 4.0);
        assert_eq!(merged.count, Some(3));
    }

    #[test]
    fn test_merge_with_nothing_appended_is_identity() {
        let stats = compute_column_stats(&[1.0f64, 2.0]).unwrap();
        assert_eq!(merge_column_stats::<f64>(&stats, 2, &[]), stats);
    }
}
