//! Plot rendering.
//!
//! - SVG charts written with plotters (`charts`)
//! - SVG rendering of result tables (`table`)
//! - fixed-grid ASCII previews for the terminal (`ascii`)
//!
//! The data for each chart is prepared once as [`PlotSeries`] so the SVG and the
//! terminal preview always show the same thing.

pub mod ascii;
pub mod charts;
pub mod table;

pub use ascii::*;
pub use charts::*;
pub use table::*;

use crate::analysis::{CombustionAnalysis, SurfaceTensionAnalysis, VaporPressureAnalysis};
use crate::math::linspace;

/// Samples used to draw a fitted curve across its x range.
const CURVE_POINTS: usize = 400;

/// Observations plus a fitted curve, with axis descriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub points: Vec<(f64, f64)>,
    pub curve: Vec<(f64, f64)>,
}

/// σ–c and Γ–c panels.
pub fn surface_tension_series(a: &SurfaceTensionAnalysis) -> [PlotSeries; 2] {
    let dense = a.dense_concentrations();
    let sigma = PlotSeries {
        title: "Surface tension vs concentration".to_string(),
        x_desc: "c (mol/L)".to_string(),
        y_desc: "σ (N/m)".to_string(),
        points: a.points.iter().map(|p| (p.concentration, p.sigma)).collect(),
        curve: dense.iter().map(|&c| (c, a.sigma_fit.eval(c))).collect(),
    };
    let gamma = PlotSeries {
        title: "Surface excess vs concentration".to_string(),
        x_desc: "c (mol/L)".to_string(),
        y_desc: "Γ (mol/m²)".to_string(),
        points: a.points.iter().map(|p| (p.concentration, p.gamma)).collect(),
        curve: dense.iter().map(|&c| (c, a.gamma_fit.eval(c))).collect(),
    };
    [sigma, gamma]
}

/// Temperature trace with the piecewise fit.
pub fn combustion_series(a: &CombustionAnalysis) -> PlotSeries {
    let n = a.reading_count() as f64;
    PlotSeries {
        title: format!("Temperature vs reading ({})", a.name),
        x_desc: "reading".to_string(),
        y_desc: "T (°C)".to_string(),
        points: a.readings.iter().enumerate().map(|(i, &t)| ((i + 1) as f64, t)).collect(),
        curve: linspace(1.0, n, CURVE_POINTS)
            .into_iter()
            .map(|x| (x, a.piecewise(x)))
            .collect(),
    }
}

/// lg p against 1/T with the regression line.
pub fn vapor_pressure_series(a: &VaporPressureAnalysis) -> PlotSeries {
    let points: Vec<(f64, f64)> = a.points.iter().map(|p| (p.inv_t, p.lg_p)).collect();
    let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    PlotSeries {
        title: "lg p vs 1/T".to_string(),
        x_desc: "1/T (1/K)".to_string(),
        y_desc: "lg(p/kPa)".to_string(),
        points,
        curve: [lo, hi].iter().map(|&x| (x, a.regression.predict(x))).collect(),
    }
}
