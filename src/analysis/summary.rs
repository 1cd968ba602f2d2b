//! Descriptive statistics over percentage series.
//!
//! Quantiles use linear interpolation between order statistics (R-7):
//! for sorted `x[0..n]` and `p`, `h = (n - 1) * p` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.

use crate::models::{Ratio, SummaryStatistics};

/// Statistics over a ratio series. Undefined values are left out and
/// counted in `excluded`; returns `None` if no defined value remains.
pub fn summary_statistics(values: &[Ratio]) -> Option<SummaryStatistics> {
    let defined: Vec<f64> = values.iter().filter_map(Ratio::value).collect();
    let excluded = values.len() - defined.len();

    describe(&defined).map(|stats| SummaryStatistics { excluded, ..stats })
}

/// Statistics over plain values. Non-finite values are left out.
pub fn describe(values: &[f64]) -> Option<SummaryStatistics> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (n - 1) as f64).sqrt())
    } else {
        None
    };

    Some(SummaryStatistics {
        count: n,
        excluded: values.len() - n,
        mean,
        std,
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// R-7 quantile of non-empty, ascending data.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        sorted[n - 1]
    } else {
        sorted[j] + g * (sorted[j + 1] - sorted[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_describe_matches_linear_quartiles() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(stats.count, 4);
        assert_close(stats.min, 1.0);
        assert_close(stats.q1, 1.75);
        assert_close(stats.median, 2.5);
        assert_close(stats.q3, 3.25);
        assert_close(stats.max, 4.0);
        assert_close(stats.mean, 2.5);
        assert_close(stats.std.unwrap(), 1.2909944487358056);
    }

    #[test]
    fn test_describe_unsorted_input() {
        let stats = describe(&[9.0, 1.0, 5.0]).unwrap();
        assert_close(stats.min, 1.0);
        assert_close(stats.q1, 3.0);
        assert_close(stats.median, 5.0);
        assert_close(stats.q3, 7.0);
        assert_close(stats.max, 9.0);
    }

    #[test]
    fn test_fewer_than_four_points() {
        let one = describe(&[42.0]).unwrap();
        assert_close(one.q1, 42.0);
        assert_close(one.q3, 42.0);
        assert!(one.std.is_none());

        let two = describe(&[10.0, 20.0]).unwrap();
        assert_close(two.q1, 12.5);
        assert_close(two.median, 15.0);
        assert_close(two.q3, 17.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(describe(&[]).is_none());
        assert!(summary_statistics(&[]).is_none());
        assert!(summary_statistics(&[Ratio::Undefined]).is_none());
    }

    #[test]
    fn test_undefined_values_are_excluded() {
        let values = [
            Ratio::Defined(10.0),
            Ratio::Undefined,
            Ratio::Defined(30.0),
            Ratio::Undefined,
        ];

        let stats = summary_statistics(&values).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.excluded, 2);
        assert_close(stats.mean, 20.0);
    }

    #[test]
    fn test_quartiles_are_ordered() {
        let samples: [&[f64]; 4] = [
            &[3.3],
            &[5.0, -1.0],
            &[0.5, 99.0, 12.0, 12.0, 7.25],
            &[100.0, 0.0, 50.0, 25.0, 75.0, 33.3, 66.6, 1.0],
        ];

        for data in samples {
            let s = describe(data).unwrap();
            assert!(s.min <= s.q1);
            assert!(s.q1 <= s.median);
            assert!(s.median <= s.q3);
            assert!(s.q3 <= s.max);
        }
    }
}
