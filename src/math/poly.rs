//! Least-squares polynomials.
//!
//! The lab handouts fit "Taylor series" (plain polynomials) to
//! temperature traces and surface tension isotherms, then differentiates them.
//!
//! Numerical notes:
//! - Raw Vandermonde matrices get badly conditioned quickly (a degree-7 fit on
//!   reading indices 8..20 is already a problem), so coefficients are stored in
//!   the centered/scaled variable `u = (x - shift) / scale` with `u ∈ [-1, 1]`
//!   over the fitted data.
//! - `power_coefficients` expands back to the ordinary `x` basis for display and
//!   export only; evaluation always happens in `u`.

use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Serializer};

use crate::domain::FitQuality;
use crate::error::AppError;
use crate::math::solve_least_squares;

/// Number of sub-intervals scanned for a sign change in `find_root`.
const ROOT_SCAN_STEPS: usize = 512;

/// Bisection stops once the bracket is narrower than this.
const ROOT_TOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Ascending coefficients in `u = (x - shift) / scale`.
    coeffs: Vec<f64>,
    shift: f64,
    scale: f64,
}

impl Polynomial {
    /// Build a polynomial from ascending power-basis coefficients in `x`.
    pub fn from_power_coefficients(coeffs: Vec<f64>) -> Self {
        let coeffs = if coeffs.is_empty() { vec![0.0] } else { coeffs };
        Self {
            coeffs,
            shift: 0.0,
            scale: 1.0,
        }
    }

    /// Least-squares fit of a degree-`degree` polynomial to `(x, y)`.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self, AppError> {
        if x.len() != y.len() {
            return Err(AppError::numeric(format!(
                "Polynomial fit got {} x values but {} y values.",
                x.len(),
                y.len()
            )));
        }
        if !x.iter().chain(y).all(|v| v.is_finite()) {
            return Err(AppError::data("Polynomial fit input contains non-finite values."));
        }

        let needed = degree + 1;
        let distinct = count_distinct(x);
        if distinct < needed {
            return Err(AppError::data(format!(
                "A degree-{degree} fit needs at least {needed} distinct x values, got {distinct}."
            )));
        }

        let n = x.len();
        let shift = x.iter().sum::<f64>() / n as f64;
        let spread = x.iter().map(|v| (v - shift).abs()).fold(0.0, f64::max);
        let scale = if spread > 0.0 { spread } else { 1.0 };

        let mut design = DMatrix::zeros(n, needed);
        for (i, &xi) in x.iter().enumerate() {
            let u = (xi - shift) / scale;
            let mut power = 1.0;
            for j in 0..needed {
                design[(i, j)] = power;
                power *= u;
            }
        }
        let rhs = DVector::from_column_slice(y);

        let beta = solve_least_squares(&design, &rhs).ok_or_else(|| {
            AppError::numeric(format!("Degree-{degree} polynomial fit is too ill-conditioned to solve."))
        })?;

        Ok(Self {
            coeffs: beta.iter().copied().collect(),
            shift,
            scale,
        })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Evaluate at `x` (Horner in the scaled variable).
    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.shift) / self.scale;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }

    /// First derivative with respect to `x`.
    pub fn derivative(&self) -> Polynomial {
        if self.coeffs.len() == 1 {
            return Self {
                coeffs: vec![0.0],
                shift: self.shift,
                scale: self.scale,
            };
        }
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(j, &c)| j as f64 * c / self.scale)
            .collect();
        Self {
            coeffs,
            shift: self.shift,
            scale: self.scale,
        }
    }

    /// Ascending coefficients in the ordinary `x` basis.
    pub fn power_coefficients(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.coeffs.len()];
        for (i, &c) in self.coeffs.iter().enumerate() {
            let factor = c / self.scale.powi(i as i32);
            // C(i, k), updated incrementally.
            let mut binom = 1.0;
            for (k, slot) in out.iter_mut().enumerate().take(i + 1) {
                *slot += factor * binom * (-self.shift).powi((i - k) as i32);
                binom = binom * (i - k) as f64 / (k + 1) as f64;
            }
        }
        out
    }

    /// First `x ∈ [lo, hi]` (scanning from `lo`) where the polynomial equals `target`.
    pub fn find_root(&self, target: f64, lo: f64, hi: f64) -> Option<f64> {
        if !(lo.is_finite() && hi.is_finite() && target.is_finite()) || hi <= lo {
            return None;
        }
        let f = |x: f64| self.eval(x) - target;

        let mut a = lo;
        let mut fa = f(a);
        if fa == 0.0 {
            return Some(a);
        }
        for i in 1..=ROOT_SCAN_STEPS {
            let b = lo + (hi - lo) * i as f64 / ROOT_SCAN_STEPS as f64;
            let fb = f(b);
            if fb == 0.0 {
                return Some(b);
            }
            if fa.signum() != fb.signum() {
                return Some(bisect(&f, a, b, fa));
            }
            a = b;
            fa = fb;
        }
        None
    }

    /// Goodness of fit against observations.
    pub fn quality(&self, x: &[f64], y: &[f64]) -> FitQuality {
        FitQuality::from_predictions(y, x.iter().map(|&xi| self.eval(xi)))
    }

    /// Descending human-readable form, e.g. `-0.012 c^2 + 0.004 c + 0.07`.
    pub fn describe(&self, var: &str) -> String {
        let coeffs = self.power_coefficients();
        let mut out = String::new();
        for (power, &c) in coeffs.iter().enumerate().rev() {
            let term = match power {
                0 => format_coeff(c.abs()),
                1 => format!("{} {var}", format_coeff(c.abs())),
                _ => format!("{} {var}^{power}", format_coeff(c.abs())),
            };
            if out.is_empty() {
                if c < 0.0 {
                    out.push('-');
                }
                out.push_str(&term);
            } else {
                out.push_str(if c < 0.0 { " - " } else { " + " });
                out.push_str(&term);
            }
        }
        out
    }
}

impl Serialize for Polynomial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            degree: usize,
            /// Ascending, in the ordinary `x` basis.
            coefficients: Vec<f64>,
            scaled_coefficients: &'a [f64],
            shift: f64,
            scale: f64,
        }
        Repr {
            degree: self.degree(),
            coefficients: self.power_coefficients(),
            scaled_coefficients: &self.coeffs,
            shift: self.shift,
            scale: self.scale,
        }
        .serialize(serializer)
    }
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
    for _ in 0..200 {
        if (b - a).abs() < ROOT_TOL {
            break;
        }
        let m = 0.5 * (a + b);
        let fm = f(m);
        if fm == 0.0 {
            return m;
        }
        if fa.signum() == fm.signum() {
            a = m;
            fa = fm;
        } else {
            b = m;
        }
    }
    0.5 * (a + b)
}

fn count_distinct(x: &[f64]) -> usize {
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    sorted.len()
}

fn format_coeff(v: f64) -> String {
    if v != 0.0 && !(1e-3..1e4).contains(&v) {
        format!("{v:.6e}")
    } else {
        format!("{v:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fit_reproduces_exact_quadratic() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 1.0 - 2.0 * v + 0.5 * v * v).collect();

        let p = Polynomial::fit(&x, &y, 2).unwrap();
        assert_eq!(p.degree(), 2);
        assert_relative_eq!(p.eval(2.5), 1.0 - 5.0 + 3.125, epsilon = 1e-10);

        let coeffs = p.power_coefficients();
        assert_relative_eq!(coeffs[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(coeffs[1], -2.0, epsilon = 1e-10);
        assert_relative_eq!(coeffs[2], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn derivative_matches_analytic_form() {
        let x: Vec<f64> = (8..=20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.01 * v.powi(3) - 0.2 * v + 4.0).collect();

        let p = Polynomial::fit(&x, &y, 3).unwrap();
        let d = p.derivative();
        assert_eq!(d.degree(), 2);
        for t in [8.0, 11.5, 20.0] {
            assert_relative_eq!(d.eval(t), 0.03 * t * t - 0.2, epsilon = 1e-8);
        }
    }

    #[test]
    fn high_degree_fit_on_reading_indices_is_stable() {
        let x: Vec<f64> = (8..=20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 20.0 + 1.5 / (1.0 + (-(v - 13.0) / 2.0).exp())).collect();

        let p = Polynomial::fit(&x, &y, 7).unwrap();
        let q = p.quality(&x, &y);
        assert!(q.rmse < 1e-2, "rmse {}", q.rmse);
    }

    #[test]
    fn fit_rejects_too_few_points() {
        let err = Polynomial::fit(&[1.0, 2.0], &[1.0, 2.0], 2).unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let err = Polynomial::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn find_root_locates_crossing() {
        let p = Polynomial::from_power_coefficients(vec![-2.0, 0.0, 1.0]);
        let root = p.find_root(0.0, 0.0, 3.0).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-9);

        assert!(p.find_root(10.0, 0.0, 3.0).is_none());
    }

    #[test]
    fn describe_is_descending() {
        let p = Polynomial::from_power_coefficients(vec![0.07, 0.004, -0.012]);
        assert_eq!(p.describe("c"), "-0.012000 c^2 + 0.004000 c + 0.070000");
    }
}
