//! Saturated vapor pressure by the static method.
//!
//! Clausius–Clapeyron in its integrated form, `lg p = A/T + B`, gives the molar
//! enthalpy of vaporization from the slope, `ΔvapHm = -A·R·ln10`, and the normal
//! boiling point by correcting the reference boiling point from the local
//! barometric pressure to standard pressure.

use serde::Serialize;

use crate::domain::{GAS_CONSTANT, VaporPressureParams, VaporRow, ZERO_CELSIUS};
use crate::error::AppError;
use crate::math::{LinearRegression, linregress, pearson, variance};

/// Derived quantities for one temperature.
#[derive(Debug, Clone, Serialize)]
pub struct VaporPoint {
    pub temperature_c: f64,
    pub temperature_k: f64,
    pub p0_kpa: f64,
    pub gauge_kpa: f64,
    /// Vapor pressure `p0 - gauge`, kPa.
    pub p_kpa: f64,
    pub lg_p: f64,
    pub inv_t: f64,
    pub lg_p_fit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaporPressureAnalysis {
    pub params: VaporPressureParams,
    pub points: Vec<VaporPoint>,
    pub variance_lg_p: f64,
    pub variance_inv_t: f64,
    /// Pearson r between lg p and 1/T; absent when either is constant.
    pub correlation: Option<f64>,
    pub regression: LinearRegression,
    pub residual_variance: f64,
    /// Molar enthalpy of vaporization, J/mol.
    pub enthalpy: f64,
    /// Normal boiling point, °C.
    pub boiling_point_c: f64,
    /// Relative error of `enthalpy` against the literature value, %.
    pub enthalpy_error: f64,
    /// Relative error of `boiling_point_c` against the reference boiling point, %.
    pub boiling_point_error: f64,
}

pub fn analyze(rows: &[VaporRow], params: &VaporPressureParams) -> Result<VaporPressureAnalysis, AppError> {
    if rows.len() < 2 {
        return Err(AppError::data(format!(
            "Vapor pressure regression needs at least 2 valid rows, got {}.",
            rows.len()
        )));
    }

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        let p_kpa = row.p0_kpa - row.gauge_kpa;
        if p_kpa <= 0.0 {
            return Err(AppError::data(format!(
                "Non-positive vapor pressure at {} °C.",
                row.temperature_c
            )));
        }
        let temperature_k = row.temperature_c + ZERO_CELSIUS;
        if temperature_k <= 0.0 {
            return Err(AppError::data(format!(
                "Temperature {} °C is below absolute zero.",
                row.temperature_c
            )));
        }
        points.push(VaporPoint {
            temperature_c: row.temperature_c,
            temperature_k,
            p0_kpa: row.p0_kpa,
            gauge_kpa: row.gauge_kpa,
            p_kpa,
            lg_p: p_kpa.log10(),
            inv_t: 1.0 / temperature_k,
            lg_p_fit: f64::NAN,
        });
    }

    let inv_t: Vec<f64> = points.iter().map(|p| p.inv_t).collect();
    let lg_p: Vec<f64> = points.iter().map(|p| p.lg_p).collect();

    let regression = linregress(&inv_t, &lg_p)?;
    for p in &mut points {
        p.lg_p_fit = regression.predict(p.inv_t);
    }
    let residuals: Vec<f64> = points.iter().map(|p| p.lg_p - p.lg_p_fit).collect();

    let variance_lg_p = variance(&lg_p).unwrap_or(0.0);
    let variance_inv_t = variance(&inv_t).unwrap_or(0.0);
    let residual_variance = variance(&residuals).unwrap_or(0.0);
    let correlation = pearson(&lg_p, &inv_t);

    let enthalpy = -regression.slope * GAS_CONSTANT * params.ln10_factor;
    if !enthalpy.is_finite() || enthalpy == 0.0 {
        return Err(AppError::numeric(format!(
            "Fitted enthalpy of vaporization is {enthalpy:.3} J/mol; the boiling point correction needs it nonzero."
        )));
    }
    if enthalpy < 0.0 {
        log::warn!("Fitted enthalpy of vaporization is negative ({enthalpy:.3} J/mol); pressure falls as T rises.");
    }

    let t0_k = params.reference_boiling_c + ZERO_CELSIUS;
    let correction = GAS_CONSTANT * (params.standard_pressure_kpa / params.local_pressure_kpa).ln() / enthalpy;
    let denominator = 1.0 / t0_k - correction;
    if denominator <= 0.0 {
        return Err(AppError::numeric("Boiling point correction diverges."));
    }
    let boiling_point_c = 1.0 / denominator - ZERO_CELSIUS;

    let reference_enthalpy = params.reference_enthalpy_kj * 1000.0;
    let enthalpy_error = (reference_enthalpy - enthalpy) * 100.0 / reference_enthalpy;
    let boiling_point_error = (boiling_point_c - params.reference_boiling_c) * 100.0 / params.reference_boiling_c;

    log::debug!(
        "lg p = {:.6} / T + {:.6}, ΔvapHm = {enthalpy:.2} J/mol",
        regression.slope,
        regression.intercept
    );

    Ok(VaporPressureAnalysis {
        params: params.clone(),
        points,
        variance_lg_p,
        variance_inv_t,
        correlation,
        regression,
        residual_variance,
        enthalpy,
        boiling_point_c,
        enthalpy_error,
        boiling_point_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clausius_clapeyron_rows(enthalpy: f64, params: &VaporPressureParams) -> Vec<VaporRow> {
        let tb = 349.95;
        (0..10)
            .map(|i| {
                let t_c = 30.0 + 5.0 * i as f64;
                let t_k = t_c + ZERO_CELSIUS;
                let p = 101.325 * (-enthalpy / GAS_CONSTANT * (1.0 / t_k - 1.0 / tb)).exp();
                VaporRow {
                    temperature_c: t_c,
                    p0_kpa: params.local_pressure_kpa,
                    gauge_kpa: params.local_pressure_kpa - p,
                }
            })
            .collect()
    }

    #[test]
    fn exact_clausius_clapeyron_data_recovers_enthalpy() {
        let params = VaporPressureParams::default();
        let rows = clausius_clapeyron_rows(30_810.0, &params);

        let a = analyze(&rows, &params).unwrap();
        // The lab sheet uses 2.303 rather than ln 10.
        let expected = 30_810.0 * 2.303 / std::f64::consts::LN_10;
        assert_relative_eq!(a.enthalpy, expected, max_relative = 1e-8);
        assert_relative_eq!(a.regression.r_value, -1.0, epsilon = 1e-9);
        assert!(a.residual_variance < 1e-20);
        assert_relative_eq!(a.correlation.unwrap(), -1.0, epsilon = 1e-9);
        assert!(a.enthalpy_error.abs() < 0.1);
        assert_relative_eq!(a.points[0].p_kpa, a.points[0].p0_kpa - a.points[0].gauge_kpa);
    }

    #[test]
    fn boiling_point_is_corrected_to_standard_pressure() {
        let params = VaporPressureParams::default();
        let rows = clausius_clapeyron_rows(30_810.0, &params);
        let a = analyze(&rows, &params).unwrap();

        let t0 = 76.8 + ZERO_CELSIUS;
        let expected = 1.0 / (1.0 / t0 - GAS_CONSTANT * (101.325f64 / 101.10).ln() / a.enthalpy) - ZERO_CELSIUS;
        assert_relative_eq!(a.boiling_point_c, expected, epsilon = 1e-10);
        // Standard pressure is above the local pressure, so the liquid boils hotter.
        assert!(a.boiling_point_c > 76.8);
        assert_relative_eq!(a.boiling_point_error, (expected - 76.8) * 100.0 / 76.8, epsilon = 1e-10);
    }

    #[test]
    fn falling_pressure_reports_a_negative_enthalpy() {
        let rows = [
            VaporRow {
                temperature_c: 30.0,
                p0_kpa: 101.1,
                gauge_kpa: 60.0,
            },
            VaporRow {
                temperature_c: 40.0,
                p0_kpa: 101.1,
                gauge_kpa: 80.0,
            },
        ];
        let a = analyze(&rows, &VaporPressureParams::default()).unwrap();
        assert!(a.enthalpy < 0.0);
        assert!(a.regression.slope > 0.0);
        assert!(a.boiling_point_c.is_finite());
    }

    #[test]
    fn constant_pressure_is_a_numeric_error() {
        let rows = [30.0, 40.0, 50.0].map(|t| VaporRow {
            temperature_c: t,
            p0_kpa: 101.1,
            gauge_kpa: 70.0,
        });
        let err = analyze(&rows, &VaporPressureParams::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn single_row_is_a_data_error() {
        let rows = [VaporRow {
            temperature_c: 30.0,
            p0_kpa: 101.1,
            gauge_kpa: 80.0,
        }];
        assert_eq!(analyze(&rows, &VaporPressureParams::default()).unwrap_err().exit_code(), 3);
    }
}
