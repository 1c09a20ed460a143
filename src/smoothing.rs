//! Centered time window speed smoothing over irregularly sampled reports.

use std::time::Duration;

/// Centered rolling mean of `values` over the time `window`.
///
/// `timestamps_ms` must be sorted ascending. Sample `j` belongs to the window
/// of sample `i` when `|t_j - t_i| <= window / 2`, both ends inclusive. Missing
/// values are left out of the mean; a window without any value yields None.
pub fn centered_rolling_mean(
    timestamps_ms: &[i64],
    values: &[Option<f64>],
    window: Duration,
) -> Vec<Option<f64>> {
    debug_assert_eq!(timestamps_ms.len(), values.len());
    debug_assert!(timestamps_ms.windows(2).all(|w| w[0] <= w[1]));

    // Compare doubled offsets so odd millisecond windows stay exact
    let width = i128::try_from(window.as_millis()).unwrap_or(i128::MAX);
    let in_window = |center: i64, other: i64| {
        2 * (i128::from(center) - i128::from(other)).abs() <= width
    };

    let mut out = Vec::with_capacity(values.len());
    let mut lo = 0;
    let mut hi = 0;

    for &t in timestamps_ms {
        while hi < timestamps_ms.len() && in_window(t, timestamps_ms[hi]) {
            hi += 1;
        }
        while !in_window(t, timestamps_ms[lo]) {
            lo += 1;
        }
        out.push(mean(&values[lo..hi]));
    }

    out
}

fn mean(window: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = window
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value");
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn empty_input() {
        assert!(centered_rolling_mean(&[], &[], FIVE_MINUTES).is_empty());
    }

    #[test]
    fn single_sample_is_its_own_mean() {
        let out = centered_rolling_mean(&[1_000], &[Some(3.7)], FIVE_MINUTES);
        assert_eq!(out, vec![Some(3.7)]);
    }

    #[test]
    fn all_samples_within_window() {
        let out = centered_rolling_mean(
            &[0, 60_000, 120_000],
            &[Some(0.2), Some(3.0), Some(1.0)],
            FIVE_MINUTES,
        );
        for v in out {
            assert_close(v, 1.4);
        }
    }

    #[test]
    fn window_edges_are_inclusive() {
        // 150 s is exactly half of the window
        let out = centered_rolling_mean(
            &[0, 150_000, 300_001],
            &[Some(1.0), Some(3.0), Some(5.0)],
            FIVE_MINUTES,
        );
        assert_close(out[0], 2.0);
        // 150_001 ms away from the last sample, so it is left out
        assert_close(out[1], 2.0);
        assert_close(out[2], 5.0);
    }

    #[test]
    fn irregular_sampling() {
        let ts = [0, 10_000, 20_000, 400_000, 410_000];
        let vs = [Some(1.0), Some(2.0), Some(3.0), Some(10.0), Some(20.0)];
        let out = centered_rolling_mean(&ts, &vs, FIVE_MINUTES);
        assert_close(out[0], 2.0);
        assert_close(out[1], 2.0);
        assert_close(out[2], 2.0);
        assert_close(out[3], 15.0);
        assert_close(out[4], 15.0);
    }

    #[test]
    fn duplicate_timestamps_share_window() {
        let out = centered_rolling_mean(
            &[0, 0, 1_000_000],
            &[Some(1.0), Some(2.0), Some(9.0)],
            FIVE_MINUTES,
        );
        assert_close(out[0], 1.5);
        assert_close(out[1], 1.5);
        assert_close(out[2], 9.0);
    }

    #[test]
    fn missing_values_are_excluded() {
        let out = centered_rolling_mean(
            &[0, 60_000, 120_000, 1_000_000],
            &[Some(1.0), None, Some(2.0), None],
            FIVE_MINUTES,
        );
        assert_close(out[0], 1.5);
        assert_close(out[1], 1.5);
        assert_close(out[2], 1.5);
        assert_eq!(out[3], None);
    }

    #[test]
    fn long_track_matches_direct_mean() {
        let ts: Vec<i64> = (0..500).map(|i| i * 7_000).collect();
        let vs: Vec<Option<f64>> = (0..500)
            .map(|i| if i % 11 == 0 { None } else { Some((i % 13) as f64 * 0.3) })
            .collect();
        let window = Duration::from_secs(900);
        let out = centered_rolling_mean(&ts, &vs, window);

        for (i, &t) in ts.iter().enumerate() {
            let (sum, n) = ts
                .iter()
                .zip(&vs)
                .filter(|(o, _)| 2 * (t - **o).abs() <= 900_000)
                .filter_map(|(_, v)| *v)
                .fold((0.0, 0), |(s, n), v| (s + v, n + 1));
            assert_close(out[i], sum / n as f64);
        }
    }
}
