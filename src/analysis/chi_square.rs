//! Chi-square test of an area's wider group counts against national shares.
//!
//! National counts are rescaled to the area's population to give expected
//! counts, and the 2×k table `[observed; expected]` is tested for
//! independence. With one degree of freedom Yates' continuity correction
//! is applied unless disabled.

use super::{sum_by, AnalysisOptions};
use crate::dataset::Dataset;
use crate::error::AnalysisError;
use crate::models::ChiSquareResult;
use tracing::debug;

/// Run the chi-square test for one area.
pub fn chi_square_test(
    dataset: &Dataset,
    area: &str,
    options: &AnalysisOptions,
) -> Result<ChiSquareResult, AnalysisError> {
    dataset.require_area(area)?;

    let national = sum_by(dataset.records(), |r| r.wider_group.as_str());
    let local = sum_by(dataset.area_records(area), |r| r.wider_group.as_str());

    let national_total: u64 = national.values().sum();
    let local_total: u64 = local.values().sum();

    // Inner join: only categories present in both scopes.
    let mut categories = Vec::new();
    let mut observed = Vec::new();
    let mut expected = Vec::new();
    for (group, &local_count) in &local {
        if let Some(&national_count) = national.get(group) {
            categories.push(group.clone());
            observed.push(local_count as f64);
            expected.push(if national_total == 0 {
                0.0
            } else {
                national_count as f64 / national_total as f64 * local_total as f64
            });
        }
    }

    if categories.len() < 2 {
        return Err(AnalysisError::DegenerateTest(format!(
            "need at least 2 categories, found {}",
            categories.len()
        )));
    }
    if let Some(i) = expected.iter().position(|&e| e <= 0.0) {
        return Err(AnalysisError::DegenerateTest(format!(
            "expected count for '{}' is zero",
            categories[i]
        )));
    }

    let (statistic, dof) = contingency_statistic(&observed, &expected, options.yates_correction)?;
    let p_value = chi_square_sf(statistic, dof);

    debug!(
        "Chi-square for '{}': statistic={:.4}, p={:.4e}, dof={}",
        area, statistic, p_value, dof
    );

    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        categories,
        observed,
        expected,
    })
}

/// Pearson statistic of the 2×k table formed by two rows of equal length.
///
/// Cell expectations come from the row and column margins. Returns the
/// statistic and the degrees of freedom `k - 1`.
pub fn contingency_statistic(
    first: &[f64],
    second: &[f64],
    yates_correction: bool,
) -> Result<(f64, usize), AnalysisError> {
    if first.len() != second.len() || first.len() < 2 {
        return Err(AnalysisError::DegenerateTest(format!(
            "table needs two rows of at least 2 columns, got {} and {}",
            first.len(),
            second.len()
        )));
    }

    let rows = [first, second];
    let row_sums: Vec<f64> = rows.iter().map(|r| r.iter().sum()).collect();
    let col_sums: Vec<f64> = first.iter().zip(second).map(|(a, b)| a + b).collect();
    let grand: f64 = row_sums.iter().sum();

    let dof = first.len() - 1;
    let mut statistic = 0.0;

    for (i, row) in rows.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / grand;
            if expected.is_nan() || expected <= 0.0 {
                return Err(AnalysisError::DegenerateTest(format!(
                    "table cell ({}, {}) has zero expected frequency",
                    i, j
                )));
            }

            let mut diff = (observed - expected).abs();
            if yates_correction && dof == 1 {
                diff = (diff - 0.5).max(0.0);
            }
            statistic += diff * diff / expected;
        }
    }

    Ok((statistic, dof))
}

/// Upper tail probability of the chi-square distribution.
pub fn chi_square_sf(statistic: f64, dof: usize) -> f64 {
    if statistic <= 0.0 {
        return 1.0;
    }
    regularized_gamma_q(dof as f64 / 2.0, statistic / 2.0)
}

const EPSILON: f64 = 1e-15;
const MAX_ITERATIONS: usize = 500;

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + 7.5;
    let series = COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized upper incomplete gamma function Q(a, x).
fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

/// P(a, x) by its power series; converges quickly for x < a + 1.
fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut term = 1.0 / a;
    let mut sum = term;
    let mut n = a;

    for _ in 0..MAX_ITERATIONS {
        n += 1.0;
        term *= x / n;
        sum += term;
        if term.abs() < sum.abs() * EPSILON {
            break;
        }
    }

    (sum.ln() - x + a * x.ln() - ln_gamma(a)).exp()
}

/// Q(a, x) by modified Lentz evaluation of its continued fraction.
fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;

    for i in 1..=MAX_ITERATIONS {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;

        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;

        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}
