//! Oxygen-bomb calorimetry: temperature rise with the Reynolds correction.
//!
//! The trace is split into a pre-period, the main (combustion) period and a
//! post-period. Each is fitted with a polynomial in the reading index. Tangents
//! to the pre- and post-period fits at the boundary readings are extended to the
//! time where the main-period curve reaches the midpoint temperature; the gap
//! between the tangents there is the corrected ΔT.

use log::warn;
use serde::Serialize;

use crate::domain::{CombustionParams, FitQuality};
use crate::error::AppError;
use crate::math::Polynomial;

/// How the midpoint crossing was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossingMethod {
    /// Root of the main-period polynomial.
    Polynomial,
    /// Linear interpolation between raw readings.
    Interpolation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// Reading indices (1-based).
    pub x: Vec<f64>,
    pub temperatures: Vec<f64>,
    /// Degree actually fitted (after clamping to the segment size).
    pub degree: usize,
    pub fit: Polynomial,
    pub quality: FitQuality,
}

impl Segment {
    fn build(label: &str, x_start: usize, temperatures: &[f64], degree: usize) -> Result<Self, AppError> {
        let x: Vec<f64> = (x_start..x_start + temperatures.len()).map(|v| v as f64).collect();
        let max_degree = temperatures.len().saturating_sub(1);
        let used = if degree > max_degree {
            warn!(
                "{label} period has {} readings; fitting degree {max_degree} instead of {degree}.",
                temperatures.len()
            );
            max_degree
        } else {
            degree
        };
        let fit = Polynomial::fit(&x, temperatures, used)?;
        let quality = fit.quality(&x, temperatures);
        Ok(Self {
            x,
            temperatures: temperatures.to_vec(),
            degree: used,
            fit,
            quality,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Anchor {
    pub x: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombustionAnalysis {
    pub name: String,
    pub params: CombustionParams,
    pub readings: Vec<f64>,
    pub before: Segment,
    pub during: Segment,
    pub after: Segment,
    /// Last reading of the pre-period.
    pub anchor_before: Anchor,
    /// First reading of the post-period.
    pub anchor_after: Anchor,
    pub slope_before: f64,
    pub slope_after: f64,
    pub t_mid: f64,
    pub x_mid: f64,
    pub crossing: CrossingMethod,
    pub t1: f64,
    pub t2: f64,
    pub delta_t: f64,
}

impl CombustionAnalysis {
    /// Pre-period tangent through the last pre-period reading.
    pub fn tangent_before(&self, x: f64) -> f64 {
        self.slope_before * (x - self.anchor_before.x) + self.anchor_before.temperature
    }

    /// Post-period tangent through the first post-period reading.
    pub fn tangent_after(&self, x: f64) -> f64 {
        self.slope_after * (x - self.anchor_after.x) + self.anchor_after.temperature
    }

    /// The three fits joined at the segment boundaries.
    pub fn piecewise(&self, x: f64) -> f64 {
        if x < self.anchor_before.x + 1.0 {
            self.before.fit.eval(x)
        } else if x <= self.anchor_after.x {
            self.during.fit.eval(x)
        } else {
            self.after.fit.eval(x)
        }
    }

    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

}

pub fn analyze(
    name: &str,
    readings: &[f64],
    params: &CombustionParams,
) -> Result<CombustionAnalysis, AppError> {
    let n = readings.len();
    let k = params.segment_len;
    if k < 2 {
        return Err(AppError::input(format!("Segment length must be at least 2, got {k}.")));
    }
    if n < 2 * k + 1 {
        return Err(AppError::data(format!(
            "'{name}' has {n} readings; a segment length of {k} needs at least {}.",
            2 * k + 1
        )));
    }

    // The reading at x = n - k + 1 closes the main period and opens the post-period.
    let before = Segment::build("Pre", 1, &readings[..k], params.before_degree)?;
    let during = Segment::build("Main", k + 1, &readings[k..n - k + 1], params.during_degree)?;
    let after = Segment::build("Post", n - k + 1, &readings[n - k..], params.after_degree)?;

    let anchor_before = Anchor {
        x: k as f64,
        temperature: readings[k - 1],
    };
    let anchor_after = Anchor {
        x: (n - k + 1) as f64,
        temperature: readings[n - k],
    };
    let t_mid = 0.5 * (anchor_before.temperature + anchor_after.temperature);

    let slope_before = before.fit.derivative().eval(anchor_before.x);
    let slope_after = after.fit.derivative().eval(anchor_after.x);

    let (x_mid, crossing) = locate_crossing(name, &during.fit, readings, t_mid, k, n - k + 1)?;

    let t1 = slope_before * (x_mid - anchor_before.x) + anchor_before.temperature;
    let t2 = slope_after * (x_mid - anchor_after.x) + anchor_after.temperature;
    let delta_t = t2 - t1;

    log::debug!("'{name}': x_mid = {x_mid:.4}, T1 = {t1:.4}, T2 = {t2:.4}, ΔT = {delta_t:.4}");

    Ok(CombustionAnalysis {
        name: name.to_string(),
        params: CombustionParams {
            segment_len: k,
            before_degree: before.degree,
            during_degree: during.degree,
            after_degree: after.degree,
        },
        readings: readings.to_vec(),
        before,
        during,
        after,
        anchor_before,
        anchor_after,
        slope_before,
        slope_after,
        t_mid,
        x_mid,
        crossing,
        t1,
        t2,
        delta_t,
    })
}

/// Where the main period reaches `t_mid`: the main-period fit first, then the raw readings.
fn locate_crossing(
    name: &str,
    fit: &Polynomial,
    readings: &[f64],
    t_mid: f64,
    from: usize,
    to: usize,
) -> Result<(f64, CrossingMethod), AppError> {
    if let Some(x) = fit.find_root(t_mid, from as f64, to as f64) {
        return Ok((x, CrossingMethod::Polynomial));
    }
    warn!("'{name}': main-period fit never reaches {t_mid:.4}; interpolating the raw readings.");
    let x = interpolate_crossing(readings, t_mid, from, to).ok_or_else(|| {
        AppError::numeric(format!(
            "'{name}': the temperature trace never crosses the midpoint {t_mid:.4} during the main period."
        ))
    })?;
    Ok((x, CrossingMethod::Interpolation))
}

/// First crossing of `target` by the raw readings between 1-based indices `from` and `to`.
fn interpolate_crossing(readings: &[f64], target: f64, from: usize, to: usize) -> Option<f64> {
    for x in from..to {
        let y0 = readings[x - 1];
        let y1 = readings[x];
        if (y0 - target) * (y1 - target) <= 0.0 && y0 != y1 {
            return Some(x as f64 + (target - y0) / (y1 - y0));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Linear drift before, a linear rise, linear drift after (n = 21, k = 7).
    fn piecewise_linear_trace() -> Vec<f64> {
        (1..=21)
            .map(|x| {
                let x = x as f64;
                if x <= 7.0 {
                    20.0 + 0.01 * x
                } else if x <= 15.0 {
                    20.07 + (x - 7.0) * 1.93 / 8.0
                } else {
                    22.0 + 0.005 * (x - 15.0)
                }
            })
            .collect()
    }

    #[test]
    fn reynolds_correction_on_piecewise_linear_trace() {
        let readings = piecewise_linear_trace();
        let a = analyze("synthetic", &readings, &CombustionParams::default()).unwrap();

        assert_eq!(a.before.x.len(), 7);
        assert_eq!(a.during.x.first().copied(), Some(8.0));
        assert_eq!(a.during.x.last().copied(), Some(15.0));
        assert_eq!(a.after.x.first().copied(), Some(15.0));
        assert_eq!(a.after.x.len(), 7);

        assert_relative_eq!(a.t_mid, 21.035, epsilon = 1e-12);
        assert_eq!(a.crossing, CrossingMethod::Polynomial);
        assert_relative_eq!(a.x_mid, 11.0, epsilon = 1e-6);
        assert_relative_eq!(a.slope_before, 0.01, epsilon = 1e-8);
        assert_relative_eq!(a.slope_after, 0.005, epsilon = 1e-8);
        assert_relative_eq!(a.t1, 20.11, epsilon = 1e-6);
        assert_relative_eq!(a.t2, 21.98, epsilon = 1e-6);
        assert_relative_eq!(a.delta_t, 1.87, epsilon = 1e-6);

        assert_relative_eq!(a.tangent_before(a.x_mid), a.t1, epsilon = 1e-12);
        assert_relative_eq!(a.piecewise(3.0), readings[2], epsilon = 1e-8);
        assert_relative_eq!(a.piecewise(18.0), readings[17], epsilon = 1e-8);
    }

    #[test]
    fn short_series_clamps_fit_degrees() {
        let readings = [20.0, 20.01, 20.02, 21.0, 21.9, 21.91, 21.92];
        let params = CombustionParams {
            segment_len: 3,
            ..CombustionParams::default()
        };

        let a = analyze("short", &readings, &params).unwrap();
        assert_eq!(a.params.before_degree, 2);
        assert_eq!(a.params.during_degree, 1);
        assert_eq!(a.params.after_degree, 2);
        assert!(a.delta_t > 1.8 && a.delta_t < 2.0);
    }

    #[test]
    fn too_few_readings_is_a_data_error() {
        let err = analyze("tiny", &[20.0; 10], &CombustionParams::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let params = CombustionParams {
            segment_len: 1,
            ..CombustionParams::default()
        };
        assert_eq!(analyze("tiny", &[20.0; 10], &params).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn interpolated_crossing_between_readings() {
        let readings = [1.0, 1.0, 2.0, 4.0, 4.0];
        assert_relative_eq!(interpolate_crossing(&readings, 3.0, 2, 4).unwrap(), 3.5);
        assert!(interpolate_crossing(&readings, 5.0, 2, 4).is_none());
    }

    #[test]
    fn flat_main_period_fit_falls_back_to_readings() {
        // A degree-0 main-period fit sits at the segment mean (21.25), never at the
        // midpoint 21.0, while the readings cross it between x = 4 and x = 5.
        let readings = [20.0, 20.0, 20.0, 20.5, 22.0, 22.0, 22.0];
        let params = CombustionParams {
            segment_len: 3,
            during_degree: 0,
            ..CombustionParams::default()
        };

        let a = analyze("late rise", &readings, &params).unwrap();
        assert_eq!(a.crossing, CrossingMethod::Interpolation);
        assert_relative_eq!(a.t_mid, 21.0, epsilon = 1e-12);
        assert_relative_eq!(a.x_mid, 13.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(a.delta_t, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn missing_crossing_is_a_numeric_error() {
        let readings = [20.0, 20.0, 20.0, 20.5, 22.0, 22.0, 22.0];
        let flat = Polynomial::fit(&[4.0, 5.0], &[21.25, 21.25], 0).unwrap();

        let (x, method) = locate_crossing("late rise", &flat, &readings, 21.0, 3, 5).unwrap();
        assert_eq!(method, CrossingMethod::Interpolation);
        assert_relative_eq!(x, 13.0 / 3.0, epsilon = 1e-9);

        // Neither the fit nor the readings reach 25 °C.
        let err = locate_crossing("late rise", &flat, &readings, 25.0, 3, 5).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
