//! Reporting utilities: result tables and formatted terminal output.
//!
//! Every experiment is reduced to a few [`ResultTable`]s here. The same tables
//! feed the terminal report, the CSV export and (for the EMF experiment) the
//! rendered table image.

pub mod format;

pub use format::*;

use crate::analysis::{CombustionAnalysis, EmfAnalysis, SurfaceTensionAnalysis, VaporPressureAnalysis};
use crate::domain::{Cell, FitQuality, ResultTable};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn r_squared(q: &FitQuality) -> Cell {
    q.r_squared.map_or_else(|| Cell::text("n/a"), |r2| Cell::Fixed(r2, 6))
}

fn quantity_table(title: &str, rows: Vec<(&str, Cell)>) -> ResultTable {
    ResultTable {
        title: title.to_string(),
        headers: headers(&["Quantity", "Value"]),
        rows: rows.into_iter().map(|(name, value)| vec![Cell::text(name), value]).collect(),
    }
}

/// Per-concentration table: replicates, σ, dσ/dc and Γ.
pub fn surface_tension_table(a: &SurfaceTensionAnalysis) -> ResultTable {
    let replicates = a.points.iter().map(|p| p.readings.len()).max().unwrap_or(0);

    let mut header = vec!["c (mol/L)".to_string()];
    header.extend((1..=replicates).map(|i| format!("Δp{i}")));
    header.extend(headers(&["Δp mean", "σ (N/m)", "dσ/dc", "Γ (mol/m²)"]));

    let rows = a
        .points
        .iter()
        .map(|p| {
            let mut row = vec![Cell::Fixed(p.concentration, 4)];
            row.extend((0..replicates).map(|i| match p.readings.get(i) {
                Some(&v) => Cell::Fixed(v, 2),
                None => Cell::text(""),
            }));
            row.push(Cell::Fixed(p.dp_mean, 3));
            row.push(Cell::Fixed(p.sigma, 6));
            row.push(Cell::Sci(p.slope, 4));
            row.push(Cell::Sci(p.gamma, 4));
            row
        })
        .collect();

    ResultTable {
        title: "Surface tension and surface excess".to_string(),
        headers: header,
        rows,
    }
}

pub fn surface_tension_summary(a: &SurfaceTensionAnalysis) -> ResultTable {
    let mut rows = vec![
        ("Pure water Δp mean", Cell::Fixed(a.water_mean, 4)),
        ("Instrument constant K (N/m per unit)", Cell::Sci(a.k, 6)),
        ("Temperature (K)", Cell::Fixed(a.temperature_k, 2)),
        ("σ(c)", Cell::text(a.sigma_fit.describe("c"))),
        ("σ(c) R²", r_squared(&a.sigma_quality)),
        ("Γ(c)", Cell::text(a.gamma_fit.describe("c"))),
        ("Γ(c) R²", r_squared(&a.gamma_quality)),
    ];
    match &a.langmuir {
        Some(l) => {
            rows.push(("Γ∞ (mol/m²)", Cell::Sci(l.gamma_max, 4)));
            rows.push(("K_L (L/mol)", Cell::Fixed(l.k_l, 4)));
            rows.push(("Area per molecule (m²)", Cell::Sci(l.area_per_molecule, 4)));
            rows.push(("Langmuir r", Cell::Fixed(l.r_value, 6)));
        }
        None => rows.push(("Langmuir fit", Cell::text("not available"))),
    }
    quantity_table("Surface tension summary", rows)
}

/// Readings with their period and fitted value.
pub fn combustion_table(a: &CombustionAnalysis) -> ResultTable {
    let n = a.reading_count();
    let k = a.params.segment_len;
    let rows = a
        .readings
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let x = i + 1;
            let period = if x <= k {
                "pre"
            } else if x < n - k + 1 {
                "main"
            } else if x == n - k + 1 {
                "main/post"
            } else {
                "post"
            };
            vec![
                Cell::text(x.to_string()),
                Cell::Fixed(t, 4),
                Cell::text(period),
                Cell::Fixed(a.piecewise(x as f64), 4),
            ]
        })
        .collect();

    ResultTable {
        title: format!("Temperature readings ({})", a.name),
        headers: headers(&["Reading", "T (°C)", "Period", "Fit (°C)"]),
        rows,
    }
}

pub fn combustion_summary(a: &CombustionAnalysis) -> ResultTable {
    quantity_table(
        &format!("Reynolds correction ({})", a.name),
        vec![
            ("Readings", Cell::text(a.reading_count().to_string())),
            (
                "Fit degrees (pre/main/post)",
                Cell::text(format!(
                    "{}/{}/{}",
                    a.params.before_degree, a.params.during_degree, a.params.after_degree
                )),
            ),
            ("Main-period fit RMSE (°C)", Cell::Sci(a.during.quality.rmse, 3)),
            ("Pre-period anchor x", Cell::Fixed(a.anchor_before.x, 0)),
            ("Pre-period anchor T (°C)", Cell::Fixed(a.anchor_before.temperature, 4)),
            ("Post-period anchor x", Cell::Fixed(a.anchor_after.x, 0)),
            ("Post-period anchor T (°C)", Cell::Fixed(a.anchor_after.temperature, 4)),
            ("Pre-period slope (°C/reading)", Cell::Sci(a.slope_before, 4)),
            ("Post-period slope (°C/reading)", Cell::Sci(a.slope_after, 4)),
            ("Midpoint T (°C)", Cell::Fixed(a.t_mid, 4)),
            ("Midpoint x", Cell::Fixed(a.x_mid, 4)),
            (
                "Midpoint from",
                Cell::text(match a.crossing {
                    crate::analysis::combustion::CrossingMethod::Polynomial => "main-period fit",
                    crate::analysis::combustion::CrossingMethod::Interpolation => "raw readings",
                }),
            ),
            ("T1 (°C)", Cell::Fixed(a.t1, 4)),
            ("T2 (°C)", Cell::Fixed(a.t2, 4)),
            ("ΔT (°C)", Cell::Fixed(a.delta_t, 4)),
        ],
    )
}

/// Readings with a trailing mean row.
pub fn emf_readings_table(a: &EmfAnalysis) -> ResultTable {
    let mut rows: Vec<Vec<Cell>> = a
        .readings
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                Cell::text((i + 1).to_string()),
                Cell::Fixed(r.e_zn_hg, 6),
                Cell::Fixed(r.e_cu_zn, 6),
                Cell::Fixed(r.e_cu_hg, 6),
            ]
        })
        .collect();
    rows.push(vec![
        Cell::text("mean"),
        Cell::Fixed(a.mean.e_zn_hg, 6),
        Cell::Fixed(a.mean.e_cu_zn, 6),
        Cell::Fixed(a.mean.e_cu_hg, 6),
    ]);

    ResultTable {
        title: "Cell voltage readings (V)".to_string(),
        headers: headers(&["#", "e_zn_hg", "e_cu_zn", "e_cu_hg"]),
        rows,
    }
}

pub fn emf_parameters_table(a: &EmfAnalysis) -> ResultTable {
    ResultTable {
        title: "Electrode potentials and cell EMF".to_string(),
        headers: headers(&["Description", "Symbol", "Value"]),
        rows: a
            .parameters()
            .into_iter()
            .map(|p| vec![Cell::text(p.description), Cell::text(p.symbol), Cell::Fixed(p.value, 6)])
            .collect(),
    }
}

pub fn vapor_pressure_table(a: &VaporPressureAnalysis) -> ResultTable {
    ResultTable {
        title: "Vapor pressure data".to_string(),
        headers: headers(&[
            "T (°C)",
            "T (K)",
            "p0 (kPa)",
            "gauge (kPa)",
            "p (kPa)",
            "lg p",
            "1/T (1/K)",
            "lg p fit",
        ]),
        rows: a
            .points
            .iter()
            .map(|p| {
                vec![
                    Cell::Fixed(p.temperature_c, 2),
                    Cell::Fixed(p.temperature_k, 2),
                    Cell::Fixed(p.p0_kpa, 3),
                    Cell::Fixed(p.gauge_kpa, 3),
                    Cell::Fixed(p.p_kpa, 3),
                    Cell::Fixed(p.lg_p, 6),
                    Cell::Sci(p.inv_t, 6),
                    Cell::Fixed(p.lg_p_fit, 6),
                ]
            })
            .collect(),
    }
}

pub fn vapor_pressure_summary(a: &VaporPressureAnalysis) -> ResultTable {
    let reg = &a.regression;
    let optional = |v: Option<f64>| match v {
        Some(v) => Cell::Sci(v, 4),
        None => Cell::text("n/a"),
    };
    quantity_table(
        "Clausius-Clapeyron fit",
        vec![
            ("Variance of lg p", Cell::Sci(a.variance_lg_p, 4)),
            ("Variance of 1/T", Cell::Sci(a.variance_inv_t, 4)),
            ("Correlation r", a.correlation.map_or(Cell::text("n/a"), |r| Cell::Fixed(r, 6))),
            ("Residual variance", Cell::Sci(a.residual_variance, 4)),
            ("Fit", Cell::text(format!("lg p = {:.4} / T + {:.6}", reg.slope, reg.intercept))),
            ("Slope A (K)", Cell::Fixed(reg.slope, 4)),
            ("Slope std. error", optional(reg.std_err)),
            ("p-value", optional(reg.p_value)),
            ("ΔvapHm (J/mol)", Cell::Fixed(a.enthalpy, 2)),
            ("Boiling point (°C)", Cell::Fixed(a.boiling_point_c, 3)),
            ("ΔvapHm relative error (%)", Cell::Fixed(a.enthalpy_error, 3)),
            ("Boiling point relative error (%)", Cell::Fixed(a.boiling_point_error, 3)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{combustion, emf};
    use crate::domain::{CombustionParams, EmfParams, EmfReading};

    #[test]
    fn emf_readings_table_appends_mean_row() {
        let r = EmfReading {
            e_zn_hg: 1.0571,
            e_cu_zn: 1.0963,
            e_cu_hg: 0.0412,
        };
        let a = emf::analyze(&[r, r], &EmfParams::default()).unwrap();
        let t = emf_readings_table(&a);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[2][0].display(), "mean");
        assert_eq!(t.rows[2][1].display(), "1.057100");

        assert_eq!(emf_parameters_table(&a).rows.len(), 10);
    }

    #[test]
    fn combustion_table_labels_periods() {
        let readings: Vec<f64> = (0..15)
            .map(|i| if i < 7 { 20.0 + 0.01 * i as f64 } else { 21.5 + 0.005 * i as f64 })
            .collect();
        let params = CombustionParams {
            segment_len: 5,
            during_degree: 3,
            ..CombustionParams::default()
        };
        let a = combustion::analyze("test", &readings, &params).unwrap();
        let t = combustion_table(&a);

        let periods: Vec<String> = t.rows.iter().map(|r| r[2].display()).collect();
        assert_eq!(periods[4], "pre");
        assert_eq!(periods[5], "main");
        assert_eq!(periods[10], "main/post");
        assert_eq!(periods[14], "post");
    }
}
