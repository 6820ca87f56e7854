//! Descriptive statistics and simple linear regression.
//!
//! Conventions follow the usual numpy/scipy defaults so results line up with
//! hand calculations in lab reports:
//! - `variance` is the population variance (ddof = 0)
//! - `linregress` reports the two-sided p-value of the slope (Student t with
//!   n - 2 degrees of freedom) and the slope standard error

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::AppError;

/// Keeps the t statistic finite when |r| = 1.
const TINY: f64 = 1e-20;

/// Result of an ordinary least squares line `y = slope·x + intercept`.
#[derive(Debug, Clone, Serialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    /// Two-sided p-value for a zero slope (needs n ≥ 3).
    pub p_value: Option<f64>,
    /// Standard error of the slope (needs n ≥ 3).
    pub std_err: Option<f64>,
    pub n: usize,
}

impl LinearRegression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (ddof = 0).
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n < 2 || hi <= lo {
        return vec![lo];
    }
    (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect()
}

/// Pearson correlation coefficient.
///
/// Returns `None` for mismatched lengths, fewer than two points, or a constant series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Least squares line through `(x, y)`.
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearRegression, AppError> {
    if x.len() != y.len() {
        return Err(AppError::numeric(format!(
            "Regression got {} x values but {} y values.",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AppError::data(format!("Linear regression needs at least 2 points, got {n}.")));
    }
    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(AppError::data("Regression input contains non-finite values."));
    }

    let nf = n as f64;
    let mx = x.iter().sum::<f64>() / nf;
    let my = y.iter().sum::<f64>() / nf;
    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        ssxm += (a - mx).powi(2);
        ssym += (b - my).powi(2);
        ssxym += (a - mx) * (b - my);
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm <= 0.0 {
        return Err(AppError::data("Linear regression needs at least two distinct x values."));
    }

    let slope = ssxym / ssxm;
    let intercept = my - slope * mx;
    let r_value = if ssym <= 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let (p_value, std_err) = if n > 2 {
        let df = (n - 2) as f64;
        let t = r_value * (df / ((1.0 - r_value + TINY) * (1.0 + r_value + TINY))).sqrt();
        let p = student_t_two_sided_p(t, df)?;
        let se = ((1.0 - r_value * r_value).max(0.0) * ssym / ssxm / df).sqrt();
        (Some(p), Some(se))
    } else {
        (None, None)
    };

    Ok(LinearRegression {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
        n,
    })
}

/// Two-sided tail probability `P(|T| ≥ |t|)` of Student's t with `df` degrees of freedom.
pub fn student_t_two_sided_p(t: f64, df: f64) -> Result<f64, AppError> {
    if !t.is_finite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AppError::numeric(format!("Invalid t distribution (df = {df}): {e}")))?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}
