//! Electrode potentials and the Cu–Zn galvanic cell.
//!
//! Potentials are measured against a saturated calomel electrode (SCE), corrected
//! to unit activity with the Nernst equation and then to 298 K with the electrode
//! temperature coefficients. Every intermediate is rounded to six decimals, the
//! precision the lab sheet reports.

use serde::Serialize;

use crate::domain::{EmfParams, EmfReading, FARADAY, GAS_CONSTANT, ZERO_CELSIUS};
use crate::error::AppError;

const SCE_POTENTIAL_298: f64 = 0.2415;
const SCE_TEMPERATURE_COEFF: f64 = 7.61e-4;
const REFERENCE_TEMPERATURE_K: f64 = 298.0;

/// One named result of the calculation chain.
#[derive(Debug, Clone, Serialize)]
pub struct EmfParameter {
    pub description: &'static str,
    pub symbol: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmfAnalysis {
    pub params: EmfParams,
    pub readings: Vec<EmfReading>,
    pub mean: EmfReading,
    pub temperature_k: f64,
    pub activity_cu: f64,
    pub activity_zn: f64,
    pub phi_sce: f64,
    pub phi_zn: f64,
    pub phi_cu: f64,
    pub phi_std_cu: f64,
    pub phi_std_cu_298: f64,
    pub phi_std_zn: f64,
    pub phi_std_zn_298: f64,
    pub e_measured: f64,
    pub e_standard: f64,
    /// Relative error of the measured EMF against `e_standard`, %.
    pub relative_error: f64,
}

impl EmfAnalysis {
    /// The calculation chain in report order.
    pub fn parameters(&self) -> Vec<EmfParameter> {
        let p = |description, symbol, value| EmfParameter {
            description,
            symbol,
            value,
        };
        vec![
            p("Calomel electrode potential", "φ_SCE", self.phi_sce),
            p("Zinc electrode potential", "φ_Zn", self.phi_zn),
            p("Copper electrode potential", "φ_Cu", self.phi_cu),
            p("Standard copper potential", "φ°_Cu", self.phi_std_cu),
            p("Standard copper potential at 298 K", "φ°_Cu(298K)", self.phi_std_cu_298),
            p("Standard zinc potential", "φ°_Zn", self.phi_std_zn),
            p("Standard zinc potential at 298 K", "φ°_Zn(298K)", self.phi_std_zn_298),
            p("Measured Cu-Zn cell EMF", "E_measured", self.e_measured),
            p("Standard Cu-Zn cell EMF", "E°", self.e_standard),
            p("Relative error (%)", "Er", self.relative_error),
        ]
    }
}

/// Round half away from zero to six decimals.
pub fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

pub fn analyze(readings: &[EmfReading], params: &EmfParams) -> Result<EmfAnalysis, AppError> {
    if readings.is_empty() {
        return Err(AppError::data("No complete EMF readings."));
    }
    let readings: Vec<EmfReading> = readings
        .iter()
        .map(|r| EmfReading {
            e_zn_hg: round6(r.e_zn_hg),
            e_cu_zn: round6(r.e_cu_zn),
            e_cu_hg: round6(r.e_cu_hg),
        })
        .collect();

    let n = readings.len() as f64;
    let mean = EmfReading {
        e_zn_hg: round6(readings.iter().map(|r| r.e_zn_hg).sum::<f64>() / n),
        e_cu_zn: round6(readings.iter().map(|r| r.e_cu_zn).sum::<f64>() / n),
        e_cu_hg: round6(readings.iter().map(|r| r.e_cu_hg).sum::<f64>() / n),
    };

    let t = round6(params.temperature_c + ZERO_CELSIUS);
    let dt = t - REFERENCE_TEMPERATURE_K;
    let activity_cu = round6(params.c_cu * params.gamma_cu);
    let activity_zn = round6(params.c_zn * params.gamma_zn);
    if activity_cu <= 0.0 || activity_zn <= 0.0 {
        return Err(AppError::input(format!(
            "Electrolyte activities must be positive (Cu: {activity_cu}, Zn: {activity_zn})."
        )));
    }
    let beta_cu = round6(params.beta_cu);
    let beta_zn = round6(params.beta_zn);

    let phi_sce = round6(SCE_POTENTIAL_298 - SCE_TEMPERATURE_COEFF * dt);
    let phi_zn = round6(phi_sce - mean.e_zn_hg);
    let phi_cu = round6(phi_sce + mean.e_cu_hg);

    let nernst = GAS_CONSTANT * t / (2.0 * FARADAY);
    let phi_std_cu = round6(phi_cu + nernst * (1.0 / activity_cu).ln());
    let phi_std_zn = round6(phi_zn + nernst * (1.0 / activity_zn).ln());

    let phi_std_cu_298 = round6(phi_std_cu - params.alpha_cu * dt - 0.5 * beta_cu * dt * dt);
    let phi_std_zn_298 = round6(phi_std_zn - params.alpha_zn * dt - 0.5 * beta_zn * dt * dt);

    let e_measured = round6(mean.e_cu_zn);
    let e_standard = round6(phi_std_cu_298 - phi_std_zn_298);
    if e_standard == 0.0 {
        return Err(AppError::numeric(
            "Standard cell EMF is zero; the relative error is undefined.",
        ));
    }
    let relative_error = round6((e_measured - e_standard).abs() / e_standard * 100.0);

    Ok(EmfAnalysis {
        params: params.clone(),
        readings,
        mean,
        temperature_k: t,
        activity_cu,
        activity_zn,
        phi_sce,
        phi_zn,
        phi_cu,
        phi_std_cu,
        phi_std_cu_298,
        phi_std_zn,
        phi_std_zn_298,
        e_measured,
        e_standard,
        relative_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reading(e_zn_hg: f64, e_cu_zn: f64, e_cu_hg: f64) -> EmfReading {
        EmfReading {
            e_zn_hg,
            e_cu_zn,
            e_cu_hg,
        }
    }

    #[test]
    fn calculation_chain_matches_hand_computation() {
        let readings = [reading(1.0570, 1.0960, 0.0410), reading(1.0572, 1.0966, 0.0414)];
        let a = analyze(&readings, &EmfParams::default()).unwrap();

        assert_relative_eq!(a.mean.e_zn_hg, 1.0571, epsilon = 1e-12);
        assert_relative_eq!(a.mean.e_cu_zn, 1.0963, epsilon = 1e-12);
        assert_relative_eq!(a.mean.e_cu_hg, 0.0412, epsilon = 1e-12);
        assert_relative_eq!(a.temperature_k, 289.75, epsilon = 1e-12);
        assert_relative_eq!(a.activity_cu, 0.015, epsilon = 1e-12);

        // 0.2415 - 7.61e-4 * (289.75 - 298)
        assert_relative_eq!(a.phi_sce, 0.247778, epsilon = 1e-12);
        assert_relative_eq!(a.phi_zn, 0.247778 - 1.0571, epsilon = 1e-9);
        assert_relative_eq!(a.phi_cu, 0.247778 + 0.0412, epsilon = 1e-9);

        // RT/2F · ln(1/a)
        let nernst = round6(8.314 * 289.75 / (2.0 * 96485.0) * (1.0 / 0.015f64).ln());
        assert_relative_eq!(a.phi_std_cu, round6(a.phi_cu + nernst), epsilon = 2e-6);

        // α_Cu (T - 298) = -1.6e-5 * -8.25
        assert_relative_eq!(a.phi_std_cu_298, round6(a.phi_std_cu - 0.000132), epsilon = 1e-9);
        // β_Zn rounds to 1e-6: α(T-298) + ½β(T-298)² = -0.000825 + 0.0000340
        assert_relative_eq!(a.phi_std_zn_298, round6(a.phi_std_zn + 0.000825 - 0.000034), epsilon = 2e-6);

        assert_relative_eq!(a.e_standard, round6(a.phi_std_cu_298 - a.phi_std_zn_298), epsilon = 1e-12);
        let er = (a.e_measured - a.e_standard).abs() / a.e_standard * 100.0;
        assert_relative_eq!(a.relative_error, er, epsilon = 1e-5);
        assert!(a.relative_error < 5.0);
    }

    #[test]
    fn parameters_are_listed_in_report_order() {
        let a = analyze(&[reading(1.0571, 1.0963, 0.0412)], &EmfParams::default()).unwrap();
        let params = a.parameters();
        assert_eq!(params.len(), 10);
        assert_eq!(params[0].symbol, "φ_SCE");
        assert_eq!(params[9].symbol, "Er");
        assert_eq!(params[8].value, a.e_standard);
    }

    #[test]
    fn round6_keeps_six_decimals() {
        assert_eq!(round6(0.62e-6), 1e-6);
        assert_eq!(round6(-0.1234566), -0.123457);
        assert_eq!(round6(0.1234564), 0.123456);
    }

    #[test]
    fn empty_readings_are_rejected() {
        assert_eq!(analyze(&[], &EmfParams::default()).unwrap_err().exit_code(), 3);
    }
}
