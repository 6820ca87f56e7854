//! Surface tension and surface excess of n-butanol solutions.
//!
//! The maximum-bubble-pressure apparatus reads a manometer difference Δp that is
//! proportional to σ. Pure water calibrates the instrument constant `K`, then
//! the Gibbs isotherm gives the surface excess from the slope of σ(c):
//!
//! `Γ = -c/(RT) · dσ/dc`

use serde::Serialize;

use crate::domain::{AVOGADRO, FitQuality, GAS_CONSTANT, SolutionRow, SurfaceTensionParams, ZERO_CELSIUS};
use crate::error::AppError;
use crate::math::{Polynomial, linregress, linspace, mean};

/// Number of concentrations used to draw the fitted curves.
pub const CURVE_SAMPLES: usize = 100;

/// Derived quantities for one solution.
#[derive(Debug, Clone, Serialize)]
pub struct SurfacePoint {
    pub concentration: f64,
    pub readings: Vec<f64>,
    pub dp_mean: f64,
    /// Surface tension, N/m.
    pub sigma: f64,
    /// dσ/dc at this concentration.
    pub slope: f64,
    /// Surface excess, mol/m².
    pub gamma: f64,
}

/// Langmuir isotherm parameters from the linearized form `c/Γ = c/Γ∞ + 1/(K·Γ∞)`.
#[derive(Debug, Clone, Serialize)]
pub struct LangmuirFit {
    /// Saturated surface excess, mol/m².
    pub gamma_max: f64,
    /// Adsorption constant, L/mol.
    pub k_l: f64,
    /// Cross-sectional area per molecule, m².
    pub area_per_molecule: f64,
    pub r_value: f64,
    pub points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceTensionAnalysis {
    pub params: SurfaceTensionParams,
    pub water_readings: Vec<f64>,
    pub water_mean: f64,
    /// Instrument constant, N/m per manometer unit.
    pub k: f64,
    pub temperature_k: f64,
    pub points: Vec<SurfacePoint>,
    pub sigma_fit: Polynomial,
    pub sigma_quality: FitQuality,
    pub gamma_fit: Polynomial,
    pub gamma_quality: FitQuality,
    pub langmuir: Option<LangmuirFit>,
}

impl SurfaceTensionAnalysis {
    pub fn concentrations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.concentration).collect()
    }

    /// Evenly spaced concentrations spanning the data, for plotting.
    pub fn dense_concentrations(&self) -> Vec<f64> {
        let c = self.concentrations();
        let lo = c.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        linspace(lo, hi, CURVE_SAMPLES)
    }
}

pub fn analyze(
    water_readings: &[f64],
    rows: &[SolutionRow],
    params: &SurfaceTensionParams,
) -> Result<SurfaceTensionAnalysis, AppError> {
    let water_mean =
        mean(water_readings).ok_or_else(|| AppError::data("No pure-water readings to calibrate against."))?;
    if water_mean <= 0.0 {
        return Err(AppError::data(format!(
            "Mean pure-water reading must be positive, got {water_mean}."
        )));
    }
    let k = params.sigma_water / water_mean;
    let temperature_k = params.temperature_c + ZERO_CELSIUS;

    let concentrations: Vec<f64> = rows.iter().map(|r| r.concentration).collect();
    let mut dp_means = Vec::with_capacity(rows.len());
    for row in rows {
        let m = mean(&row.readings)
            .ok_or_else(|| AppError::data(format!("No readings for c = {}.", row.concentration)))?;
        dp_means.push(m);
    }
    let sigmas: Vec<f64> = dp_means.iter().map(|m| k * m).collect();

    let sigma_fit = Polynomial::fit(&concentrations, &sigmas, params.sigma_degree)?;
    let derivative = sigma_fit.derivative();

    let slopes: Vec<f64> = concentrations.iter().map(|&c| derivative.eval(c)).collect();
    let gammas: Vec<f64> = concentrations
        .iter()
        .zip(&slopes)
        .map(|(&c, &s)| -c * s / (GAS_CONSTANT * temperature_k))
        .collect();

    let gamma_fit = Polynomial::fit(&concentrations, &gammas, params.gamma_degree)?;
    let sigma_quality = sigma_fit.quality(&concentrations, &sigmas);
    let gamma_quality = gamma_fit.quality(&concentrations, &gammas);
    let langmuir = langmuir_fit(&concentrations, &gammas);

    log::debug!("σ(c) = {}", sigma_fit.describe("c"));
    log::debug!("Γ(c) = {}", gamma_fit.describe("c"));

    let points = rows
        .iter()
        .enumerate()
        .map(|(i, row)| SurfacePoint {
            concentration: row.concentration,
            readings: row.readings.clone(),
            dp_mean: dp_means[i],
            sigma: sigmas[i],
            slope: slopes[i],
            gamma: gammas[i],
        })
        .collect();

    Ok(SurfaceTensionAnalysis {
        params: params.clone(),
        water_readings: water_readings.to_vec(),
        water_mean,
        k,
        temperature_k,
        points,
        sigma_fit,
        sigma_quality,
        gamma_fit,
        gamma_quality,
        langmuir,
    })
}

/// Regress `c/Γ` on `c` over the points with positive c and Γ.
fn langmuir_fit(concentrations: &[f64], gammas: &[f64]) -> Option<LangmuirFit> {
    let (x, y): (Vec<f64>, Vec<f64>) = concentrations
        .iter()
        .zip(gammas)
        .filter(|&(&c, &g)| c > 0.0 && g > 0.0)
        .map(|(&c, &g)| (c, c / g))
        .unzip();
    if x.len() < 2 {
        return None;
    }

    let reg = linregress(&x, &y).ok()?;
    if reg.slope <= 0.0 || reg.intercept <= 0.0 {
        log::debug!(
            "Langmuir linearization not physical (slope {:.4e}, intercept {:.4e}).",
            reg.slope,
            reg.intercept
        );
        return None;
    }

    let gamma_max = 1.0 / reg.slope;
    Some(LangmuirFit {
        gamma_max,
        k_l: reg.slope / reg.intercept,
        area_per_molecule: 1.0 / (gamma_max * AVOGADRO),
        r_value: reg.r_value,
        points: x.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows_from_sigma(k: f64, sigma: impl Fn(f64) -> f64, cs: &[f64]) -> Vec<SolutionRow> {
        cs.iter()
            .map(|&c| {
                let dp = sigma(c) / k;
                SolutionRow {
                    concentration: c,
                    readings: vec![dp - 0.1, dp, dp + 0.1],
                }
            })
            .collect()
    }

    #[test]
    fn gibbs_surface_excess_matches_analytic_slope() {
        let params = SurfaceTensionParams::default();
        let water = [72.0, 71.9, 72.1];
        let k = params.sigma_water / 72.0;
        let sigma = |c: f64| 0.07 - 0.12 * c + 0.2 * c * c;
        let cs = [0.02, 0.04, 0.06, 0.08, 0.12, 0.16, 0.20, 0.24];

        let a = analyze(&water, &rows_from_sigma(k, sigma, &cs), &params).unwrap();
        assert_relative_eq!(a.k, k, max_relative = 1e-12);

        let rt = GAS_CONSTANT * (30.0 + ZERO_CELSIUS);
        for p in &a.points {
            assert_relative_eq!(p.sigma, sigma(p.concentration), epsilon = 1e-10);
            let expected = -p.concentration * (-0.12 + 0.4 * p.concentration) / rt;
            assert_relative_eq!(p.gamma, expected, epsilon = 1e-12);
        }
        assert_eq!(a.gamma_fit.degree(), 3);
        assert_eq!(a.dense_concentrations().len(), CURVE_SAMPLES);
    }

    #[test]
    fn langmuir_recovers_isotherm_parameters() {
        let gamma_max = 6.0e-6;
        let k_l = 15.0;
        let cs = [0.02, 0.05, 0.1, 0.2, 0.3];
        let gs: Vec<f64> = cs.iter().map(|c| gamma_max * k_l * c / (1.0 + k_l * c)).collect();

        let fit = langmuir_fit(&cs, &gs).unwrap();
        assert_relative_eq!(fit.gamma_max, gamma_max, max_relative = 1e-9);
        assert_relative_eq!(fit.k_l, k_l, max_relative = 1e-9);
        assert_relative_eq!(fit.area_per_molecule, 1.0 / (gamma_max * AVOGADRO), max_relative = 1e-9);
    }

    #[test]
    fn langmuir_skips_non_physical_data() {
        assert!(langmuir_fit(&[0.0, 0.1], &[0.0, 1e-6]).is_none());
        assert!(langmuir_fit(&[0.1, 0.2], &[-1e-6, -2e-6]).is_none());
    }

    #[test]
    fn langmuir_skips_negative_intercept() {
        // c/Γ = 1e5·c − 5e3: rising line, but K_L = slope/intercept would be negative.
        let cs = [0.1, 0.2, 0.3];
        let gs: Vec<f64> = cs.iter().map(|c| c / (1e5 * c - 5e3)).collect();
        assert!(gs.iter().all(|&g| g > 0.0));
        assert!(langmuir_fit(&cs, &gs).is_none());
    }

    #[test]
    fn rejects_non_positive_water_calibration() {
        let rows = vec![SolutionRow {
            concentration: 0.1,
            readings: vec![60.0],
        }];
        let err = analyze(&[0.0, 0.0], &rows, &SurfaceTensionParams::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn too_few_concentrations_is_a_data_error() {
        let rows: Vec<SolutionRow> = [0.1, 0.2]
            .iter()
            .map(|&c| SolutionRow {
                concentration: c,
                readings: vec![60.0],
            })
            .collect();
        let err = analyze(&[72.0], &rows, &SurfaceTensionParams::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
