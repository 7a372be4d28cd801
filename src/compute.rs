// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

//! Per-file numeric computation: a two-variable cointegration score.
//!
//! An input file holds two semicolon-separated numeric rows (decimal commas
//! accepted). The score is computed Engle-Granger style:
//!
//! ```text
//! 1. OLS fit of the first row on the second:  y = a + b*x
//! 2. Lag-0 Dickey-Fuller regression on the residuals e:
//!        de_t = rho * e_(t-1),   t = rho_hat / se(rho_hat)
//! 3. Approximate p-value interpolated over the asymptotic two-variable
//!    critical values (1%: -3.90, 5%: -3.34, 10%: -3.04), extrapolated
//!    linearly and clamped to [0.0001, 0.9999].
//! ```
//!
//! The p-value is monotone in the t-statistic and exact at the anchor
//! points, which is all the surrounding program relies on.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Cell separator within a row.
const CELL_SEP: char = ';';

/// Minimum number of observations per row for the regression to be defined.
const MIN_OBS: usize = 3;

/// Interpolation anchors: (t-statistic, p-value) at the 1%/5%/10% levels
/// for the two-variable, constant-only case.
const TAU_ANCHORS: [(f64, f64); 3] = [(-3.90, 0.01), (-3.34, 0.05), (-3.04, 0.10)];

/// Clamp bounds for the interpolated p-value.
const P_MIN: f64 = 0.0001;
const P_MAX: f64 = 0.9999;

/// Result of scoring one pair of rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairScore {
    /// Dickey-Fuller t-statistic of the fit residuals.
    pub t_stat: f64,
    /// Approximate p-value for the t-statistic.
    pub p_value: f64,
}

/// Read the first two numeric rows from a reader.
///
/// Cells may use a decimal comma; non-finite cells are replaced with `0.0`;
/// the shorter row is padded with `0.0` to the length of the longer one.
/// Rows beyond the second are ignored.
pub fn read_pair<R: BufRead>(reader: R) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut rows = Vec::<Vec<f64>>::new();

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        rows.push(parse_row(&line)?);

        if rows.len() == 2 {
            break;
        }
    }

    if rows.len() < 2 {
        return Err(Error::Series(format!(
            "expected 2 rows, got {}",
            rows.len()
        )));
    }

    let mut second = rows.pop().unwrap();
    let mut first = rows.pop().unwrap();

    let len = first.len().max(second.len());
    first.resize(len, 0.0);
    second.resize(len, 0.0);

    Ok((first, second))
}

/// Open `path` and score its row pair.
pub fn score_file(path: &Path) -> Result<PairScore> {
    let file = File::open(path)?;
    let (y, x) = read_pair(BufReader::new(file))?;

    engle_granger(&y, &x)
}

/// Compute the cointegration score for a pair of equal-length series.
pub fn engle_granger(y: &[f64], x: &[f64]) -> Result<PairScore> {
    if y.len() != x.len() {
        return Err(Error::Series(format!(
            "row lengths differ: {} vs {}",
            y.len(),
            x.len()
        )));
    }

    if y.len() < MIN_OBS {
        return Err(Error::Series(format!(
            "need at least {} observations, got {}",
            MIN_OBS,
            y.len()
        )));
    }

    let (intercept, slope) = ols(y, x)?;

    let residuals: Vec<f64> = y
        .iter()
        .zip(x.iter())
        .map(|(yi, xi)| yi - intercept - slope * xi)
        .collect();

    let t_stat = df_stat(&residuals)?;

    Ok(PairScore {
        t_stat,
        p_value: tau_pvalue(t_stat),
    })
}

/// Least-squares fit `y = a + b*x`, returning `(a, b)`.
fn ols(y: &[f64], x: &[f64]) -> Result<(f64, f64)> {
    let n = x.len() as f64;

    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        sxx += (xi - x_mean) * (xi - x_mean);
        sxy += (xi - x_mean) * (yi - y_mean);
    }

    if sxx == 0.0 {
        return Err(Error::Series("constant regressor row".into()));
    }

    let slope = sxy / sxx;

    Ok((y_mean - slope * x_mean, slope))
}

/// Lag-0 Dickey-Fuller t-statistic for a residual series.
fn df_stat(e: &[f64]) -> Result<f64> {
    let mut num = 0.0;
    let mut denom = 0.0;

    for w in e.windows(2) {
        let prev = w[0];
        let diff = w[1] - w[0];

        num += prev * diff;
        denom += prev * prev;
    }

    if denom == 0.0 {
        return Err(Error::Series("degenerate residuals".into()));
    }

    let rho = num / denom;

    let m = (e.len() - 1) as f64;
    let mut ssr = 0.0;

    for w in e.windows(2) {
        let fitted = rho * w[0];
        let err = (w[1] - w[0]) - fitted;

        ssr += err * err;
    }

    let s2 = ssr / (m - 1.0);
    let se = (s2 / denom).sqrt();

    if se == 0.0 {
        return Err(Error::Series("degenerate residuals".into()));
    }

    Ok(rho / se)
}

/// Piecewise-linear p-value for a Dickey-Fuller t-statistic, anchored at
/// the two-variable critical values and clamped to `[P_MIN, P_MAX]`.
fn tau_pvalue(t: f64) -> f64 {
    let (lo, hi) = if t <= TAU_ANCHORS[1].0 {
        (TAU_ANCHORS[0], TAU_ANCHORS[1])
    } else {
        (TAU_ANCHORS[1], TAU_ANCHORS[2])
    };

    let slope = (hi.1 - lo.1) / (hi.0 - lo.0);
    let p = lo.1 + (t - lo.0) * slope;

    p.max(P_MIN).min(P_MAX)
}

/// Parse one semicolon-separated row, mapping decimal commas to points and
/// non-finite values to zero.
fn parse_row(line: &str) -> Result<Vec<f64>> {
    line.split(CELL_SEP)
        .map(|cell| {
            let cell = cell.trim().replace(',', ".");

            let value: f64 = cell
                .parse()
                .map_err(|_| Error::Series(format!("bad cell {:?}", cell)))?;

            Ok(if value.is_finite() { value } else { 0.0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn test_read_pair() {
        let data = "1,5;2,5;3,0\n2,0;3,0;4,0\n";

        let (first, second) = read_pair(Cursor::new(data)).unwrap();

        assert_eq!(first, vec![1.5, 2.5, 3.0]);
        assert_eq!(second, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_read_pair_ignores_extra_rows() {
        let data = "1;2;3\n4;5;6\n7;8;9\n";

        let (first, second) = read_pair(Cursor::new(data)).unwrap();

        assert_eq!(first, vec![1.0, 2.0, 3.0]);
        assert_eq!(second, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_read_pair_non_finite_is_zeroed() {
        let data = "inf;nan;1,0\n-inf;2;3\n";

        let (first, second) = read_pair(Cursor::new(data)).unwrap();

        assert_eq!(first, vec![0.0, 0.0, 1.0]);
        assert_eq!(second, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_pair_pads_shorter_row() {
        let data = "1;2;3\n4;5\n";

        let (first, second) = read_pair(Cursor::new(data)).unwrap();

        assert_eq!(first, vec![1.0, 2.0, 3.0]);
        assert_eq!(second, vec![4.0, 5.0, 0.0]);
    }

    #[test]
    fn test_read_pair_errors() {
        #[derive(Debug)]
        struct TestData<'a> {
            data: &'a str,
        }

        let tests = &[
            TestData { data: "" },
            TestData { data: "1;2;3\n" },
            TestData { data: "1;x;3\n4;5;6\n" },
            TestData { data: "1;;3\n4;5;6\n" },
        ];

        for (i, d) in tests.iter().enumerate() {
            let result = read_pair(Cursor::new(d.data));

            let msg = format!("test[{}]: {:?}, result: {:?}", i, d, result);

            assert!(matches!(result, Err(Error::Series(_))), "{}", msg);
        }
    }

    #[test]
    fn test_ols() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();

        let (a, b) = ols(&y, &x).unwrap();

        assert!((a - 1.0).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_fit_is_degenerate() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();

        // Zero residuals leave nothing for the unit-root regression.
        let result = engle_granger(&y, &x);

        assert!(matches!(result, Err(Error::Series(_))));
    }

    #[test]
    fn test_constant_regressor() {
        let x = vec![5.0, 5.0, 5.0, 5.0];
        let y = vec![1.0, 2.0, 3.0, 4.0];

        let result = engle_granger(&y, &x);

        assert!(matches!(result, Err(Error::Series(_))));
    }

    #[test]
    fn test_df_stat_known_case() {
        // Residuals orthogonal to x by construction, so the OLS fit is
        // exactly slope 1 / intercept 0 and the residuals are [1,-1,-1,1]:
        //   rho_hat = -4/3, se = 2/3, t = -2.
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![2.0, 1.0, 2.0, 5.0];

        let score = engle_granger(&y, &x).unwrap();

        assert!((score.t_stat - (-2.0)).abs() < 1e-9, "{:?}", score);

        let expected_p = 0.10 + (-2.0 + 3.04) / 6.0;
        assert!((score.p_value - expected_p).abs() < 1e-9, "{:?}", score);
    }

    #[test]
    fn test_cointegrated_pair_scores_low() {
        // A noisy level relationship around a shared random walk: the
        // residuals mean-revert hard, so the statistic is far negative.
        let mut seed = 42u64;
        let mut x = Vec::with_capacity(64);
        let mut level = 0.0;

        for _ in 0..64 {
            level += lcg(&mut seed);
            x.push(level);
        }

        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 2.0 * v + 1.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();

        let score = engle_granger(&y, &x).unwrap();

        assert!(score.t_stat < -3.9, "{:?}", score);
        assert!(score.p_value < 0.02, "{:?}", score);
    }

    #[test]
    fn test_tau_pvalue_anchors() {
        for &(t, p) in &TAU_ANCHORS {
            assert!((tau_pvalue(t) - p).abs() < 1e-12, "t: {}", t);
        }
    }

    #[test]
    fn test_tau_pvalue_monotone_and_clamped() {
        let points = [-10.0, -5.0, -4.0, -3.5, -3.2, -3.0, -2.0, 0.0, 10.0];

        let mut prev = 0.0;
        for &t in &points {
            let p = tau_pvalue(t);

            assert!(p >= prev, "t: {}, p: {}, prev: {}", t, p, prev);
            assert!((P_MIN..=P_MAX).contains(&p), "t: {}, p: {}", t, p);

            prev = p;
        }

        assert!((tau_pvalue(-10.0) - P_MIN).abs() < 1e-12);
        assert!((tau_pvalue(10.0) - P_MAX).abs() < 1e-12);
    }

    fn lcg(seed: &mut u64) -> f64 {
        *seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);

        ((*seed >> 33) as f64 / (1u64 << 31) as f64) - 1.0
    }
}
