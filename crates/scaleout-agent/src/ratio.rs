//! Rescaling-time-ratio computation
//!
//! Estimates the fraction of a time window during which the cluster ran at a
//! transitional worker count, i.e. a count other than the stable counts
//! bracketing the window's start and end.

use crate::models::WorkerCountSample;

/// Division that yields `0.0` for a zero divisor instead of NaN/inf.
pub fn safe_div(dividend: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        0.0
    } else {
        dividend / divisor
    }
}

/// Compute the rescaling time ratio for the window `[start_ms, end_ms)`.
///
/// The sample history is sorted by timestamp; each sample's validity interval
/// runs to the next sample's timestamp, and an open-ended sample (no
/// successor) is assumed to last through the window. Samples whose validity
/// interval does not intersect the window are discarded, and the first and
/// last survivors are excluded from the transitional credit: they represent
/// the counts already stable at window start and still stable at window end.
/// The remaining overlap, clamped to the window, over the window length is
/// the ratio.
///
/// Returns `0.0` for an empty history, a degenerate window (`end <= start`),
/// or when fewer than three samples survive the intersection filter.
pub fn rescaling_time_ratio(history: &[WorkerCountSample], start_ms: i64, end_ms: i64) -> f64 {
    if end_ms <= start_ms || history.is_empty() {
        return 0.0;
    }

    let mut sorted = history.to_vec();
    sorted.sort_by_key(|s| s.timestamp_ms);

    // Validity intervals `[timestamp, effective_end)` clipped to the window.
    let mut intervals: Vec<(i64, i64)> = Vec::with_capacity(sorted.len());
    for (i, sample) in sorted.iter().enumerate() {
        let duration = sorted
            .get(i + 1)
            .map(|next| next.timestamp_ms - sample.timestamp_ms)
            .unwrap_or(0);
        // Duration zero means "still current at evaluation time": the state
        // is assumed to last through the window.
        let effective_end = if duration == 0 {
            end_ms
        } else {
            sample.timestamp_ms + duration
        };
        if sample.timestamp_ms < end_ms && effective_end > start_ms {
            intervals.push((sample.timestamp_ms, effective_end));
        }
    }

    // The first and last intersecting samples are the stable counts at the
    // window boundaries; only the ones strictly between count as rescaling.
    if intervals.len() <= 2 {
        return 0.0;
    }
    let transitional = &intervals[1..intervals.len() - 1];

    let dividend: i64 = transitional
        .iter()
        .map(|&(start, end)| (end.min(end_ms) - start.max(start_ms)).max(0))
        .sum();

    safe_div(dividend as f64, (end_ms - start_ms) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(scale_out: u32, timestamp_ms: i64) -> WorkerCountSample {
        WorkerCountSample {
            scale_out,
            timestamp_ms,
        }
    }

    #[test]
    fn test_safe_div_zero_divisor() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(-3.0, 0.0), 0.0);
    }

    #[test]
    fn test_safe_div_nonzero_divisor() {
        assert_eq!(safe_div(6.0, 3.0), 2.0);
        assert_eq!(safe_div(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_empty_history_is_zero() {
        assert_eq!(rescaling_time_ratio(&[], 0, 1_000), 0.0);
    }

    #[test]
    fn test_degenerate_window_is_zero() {
        let history = vec![sample(2, 100), sample(3, 150)];
        assert_eq!(rescaling_time_ratio(&history, 500, 500), 0.0);
        assert_eq!(rescaling_time_ratio(&history, 500, 100), 0.0);
    }

    #[test]
    fn test_two_intersecting_samples_is_zero() {
        // Only the two bracketing samples intersect [100, 500); the sample at
        // the window end has an empty validity interval and is discarded.
        let history = vec![sample(2, 100), sample(3, 150), sample(2, 500)];
        assert_eq!(rescaling_time_ratio(&history, 100, 500), 0.0);
    }

    #[test]
    fn test_single_transitional_sample() {
        // Survivors are the samples at 100, 150 and 300; after dropping the
        // bracketing ones, the sample at 150 (valid until 300) contributes
        // 150 ms of the 400 ms window.
        let history = vec![
            sample(2, 100),
            sample(3, 150),
            sample(5, 300),
            sample(2, 500),
        ];
        let ratio = rescaling_time_ratio(&history, 100, 500);
        assert!((ratio - 150.0 / 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unsorted_history_is_sorted_before_use() {
        let history = vec![
            sample(2, 500),
            sample(3, 150),
            sample(2, 100),
            sample(5, 300),
        ];
        let ratio = rescaling_time_ratio(&history, 100, 500);
        assert!((ratio - 150.0 / 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_transition_inside_window_is_zero() {
        // A real transition occurred strictly inside the window, but with no
        // third bracketing sample the drop-first/last rule zeroes the ratio.
        // This matches the reference heuristic.
        let history = vec![sample(2, 100), sample(4, 250)];
        assert_eq!(rescaling_time_ratio(&history, 0, 1_000), 0.0);
    }

    #[test]
    fn test_overlap_clamped_to_window() {
        // The transitional sample at 150 is valid until 900, past the window
        // end at 600; only the in-window portion counts.
        let history = vec![
            sample(2, 100),
            sample(3, 150),
            sample(5, 900),
            sample(2, 950),
        ];
        let ratio = rescaling_time_ratio(&history, 200, 600);
        // Survivors: 100 (valid to 150? no — [100,150) misses [200,600)),
        // 150 (to 900), 900 excluded, 950 excluded. Only one survivor.
        assert_eq!(ratio, 0.0);

        let history = vec![
            sample(2, 100),
            sample(3, 250),
            sample(5, 400),
            sample(2, 700),
        ];
        // Survivors: [100,250), [250,400), [400,700). Transitional: [250,400)
        // clamped to [200,600) -> 150 of 400.
        let ratio = rescaling_time_ratio(&history, 200, 600);
        assert!((ratio - 150.0 / 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_bounded_by_one() {
        let history = vec![
            sample(1, 0),
            sample(2, 100),
            sample(3, 200),
            sample(4, 300),
            sample(5, 400),
        ];
        let ratio = rescaling_time_ratio(&history, 100, 400);
        assert!(ratio >= 0.0 && ratio <= 1.0);
    }
}
