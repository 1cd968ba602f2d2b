//! Text chart rendering.
//!
//! These helpers only draw values that were already computed; they do
//! not aggregate anything themselves.

use crate::models::SummaryStatistics;

const FULL: char = '█';

/// Horizontal bar for `value` scaled so that `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if !(value.is_finite() && max.is_finite()) || max <= 0.0 || value <= 0.0 {
        return String::new();
    }

    let cells = ((value / max) * width as f64).round() as usize;
    std::iter::repeat(FULL).take(cells.min(width)).collect()
}

/// Bar centred on a zero axis: negatives grow left, positives grow right.
pub fn signed_bar(value: f64, max_abs: f64, width: usize) -> String {
    let left = if value < 0.0 { bar(-value, max_abs, width) } else { String::new() };
    let right = if value > 0.0 { bar(value, max_abs, width) } else { String::new() };

    format!("{:>width$}|{:<width$}", left, right, width = width)
}

/// One-line box plot spanning `[stats.min, stats.max]`.
///
/// Whiskers are drawn with `-`, the quartile box with `=`, quartile edges
/// with `[` and `]`, the median with `|` and the highlighted value with `*`.
pub fn boxplot_line(stats: &SummaryStatistics, highlight: Option<f64>, width: usize) -> String {
    let width = width.max(2);
    let span = stats.max - stats.min;
    let position = |v: f64| -> usize {
        if span <= 0.0 {
            0
        } else {
            (((v - stats.min) / span) * (width - 1) as f64)
                .round()
                .clamp(0.0, (width - 1) as f64) as usize
        }
    };

    let mut cells = vec!['-'; width];
    let (q1, q3) = (position(stats.q1), position(stats.q3));
    for cell in cells.iter_mut().take(q3 + 1).skip(q1) {
        *cell = '=';
    }
    cells[q1] = '[';
    cells[q3] = ']';
    cells[position(stats.median)] = '|';
    if let Some(v) = highlight {
        cells[position(v)] = '*';
    }

    cells.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(50.0, 100.0, 10).chars().count(), 5);
        assert_eq!(bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar(150.0, 100.0, 10).chars().count(), 10);
        assert!(bar(0.0, 100.0, 10).is_empty());
        assert!(bar(5.0, 0.0, 10).is_empty());
        assert!(bar(f64::NAN, 10.0, 10).is_empty());
    }

    #[test]
    fn test_signed_bar_sides() {
        let positive = signed_bar(2.0, 4.0, 4);
        assert_eq!(positive, "    |██  ");

        let negative = signed_bar(-4.0, 4.0, 4);
        assert_eq!(negative, "████|    ");
    }

    #[test]
    fn test_boxplot_line() {
        let stats = SummaryStatistics {
            count: 5,
            excluded: 0,
            mean: 50.0,
            std: None,
            min: 0.0,
            q1: 25.0,
            median: 50.0,
            q3: 75.0,
            max: 100.0,
        };

        let line = boxplot_line(&stats, Some(100.0), 9);
        assert_eq!(line, "--[=|=]-*");
    }

    #[test]
    fn test_boxplot_constant_series() {
        let stats = SummaryStatistics {
            count: 1,
            excluded: 0,
            mean: 3.0,
            std: None,
            min: 3.0,
            q1: 3.0,
            median: 3.0,
            q3: 3.0,
            max: 3.0,
        };

        let line = boxplot_line(&stats, None, 5);
        assert_eq!(line.chars().count(), 5);
        assert!(line.starts_with('|'));
    }
}
