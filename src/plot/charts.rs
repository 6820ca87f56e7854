//! SVG charts rendered with plotters.
//!
//! We use the SVG backend only: text is emitted as `<text>` elements, so no
//! native font stack is needed and the output is stable across machines.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::analysis::{CombustionAnalysis, SurfaceTensionAnalysis, VaporPressureAnalysis};
use crate::error::AppError;
use crate::math::linspace;
use crate::plot::{PlotSeries, combustion_series, surface_tension_series, vapor_pressure_series};

pub(crate) type DrawResult = Result<(), Box<dyn std::error::Error>>;
pub(crate) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const ORANGE: RGBColor = RGBColor(255, 140, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 140, 0);

/// Pixel size of a single-panel chart.
pub const CHART_SIZE: (u32, u32) = (1000, 600);

/// σ–c and Γ–c side by side.
pub fn write_surface_tension_chart(path: &Path, analysis: &SurfaceTensionAnalysis) -> Result<(), AppError> {
    let [sigma, gamma] = surface_tension_series(analysis);
    render(path, (1400, 600), |root| {
        let panels = root.split_evenly((1, 2));
        draw_fit_panel(&panels[0], &sigma, "σ = K·Δp", "polynomial fit")?;
        draw_fit_panel(&panels[1], &gamma, "Γ from Gibbs isotherm", "polynomial fit")?;
        Ok(())
    })
}

pub fn write_vapor_pressure_chart(path: &Path, analysis: &VaporPressureAnalysis) -> Result<(), AppError> {
    let series = vapor_pressure_series(analysis);
    render(path, CHART_SIZE, |root| draw_fit_panel(root, &series, "data", "linear fit"))
}

/// Temperature trace with segment fits, tangents and the midpoint construction.
pub fn write_combustion_chart(path: &Path, analysis: &CombustionAnalysis) -> Result<(), AppError> {
    let series = combustion_series(analysis);
    render(path, CHART_SIZE, |root| draw_combustion(root, analysis, &series))
}

pub(crate) fn render(
    path: &Path,
    size: (u32, u32),
    draw: impl FnOnce(&Area<'_>) -> DrawResult,
) -> Result<(), AppError> {
    let result: DrawResult = (|| {
        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
        Ok(())
    })();
    result.map_err(|e| AppError::output(format!("Failed to draw chart '{}': {e}", path.display())))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn draw_fit_panel(area: &Area<'_>, series: &PlotSeries, point_label: &str, curve_label: &str) -> DrawResult {
    let (x0, x1) = padded_range(series.points.iter().chain(&series.curve).map(|p| p.0));
    let (y0, y1) = padded_range(series.points.iter().chain(&series.curve).map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(&series.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(series.x_desc.as_str())
        .y_desc(series.y_desc.as_str())
        .x_label_formatter(&|v| format_tick(*v))
        .y_label_formatter(&|v| format_tick(*v))
        .draw()?;

    chart
        .draw_series(LineSeries::new(series.curve.iter().copied(), BLUE.stroke_width(2)))?
        .label(curve_label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(series.points.iter().map(|&p| Circle::new(p, 4, RED.filled())))?
        .label(point_label)
        .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn draw_combustion(root: &Area<'_>, a: &CombustionAnalysis, series: &PlotSeries) -> DrawResult {
    let n = a.reading_count() as f64;
    let before_end = (a.x_mid + 1.0).min(n);
    let after_start = (a.x_mid - 1.0).max(1.0);

    let tangent_before: Vec<(f64, f64)> = linspace(a.anchor_before.x, before_end, 2)
        .into_iter()
        .map(|x| (x, a.tangent_before(x)))
        .collect();
    let tangent_after: Vec<(f64, f64)> = linspace(after_start, n, 2)
        .into_iter()
        .map(|x| (x, a.tangent_after(x)))
        .collect();

    let (x0, x1) = padded_range(series.points.iter().map(|p| p.0));
    let (y0, y1) = padded_range(
        series
            .points
            .iter()
            .chain(&series.curve)
            .chain(&tangent_before)
            .chain(&tangent_after)
            .map(|p| p.1),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(&series.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(series.x_desc.as_str())
        .y_desc(series.y_desc.as_str())
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    let segments = [
        (&a.before, RED, "pre-period"),
        (&a.during, DARK_GREEN, "main period"),
        (&a.after, BLUE, "post-period"),
    ];
    for (segment, color, label) in segments {
        chart
            .draw_series(
                segment
                    .x
                    .iter()
                    .zip(&segment.temperatures)
                    .map(|(&x, &t)| Circle::new((x, t), 4, color.filled())),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }

    chart
        .draw_series(LineSeries::new(series.curve.iter().copied(), BLACK.stroke_width(2)))?
        .label("piecewise fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

    chart.draw_series(LineSeries::new(tangent_before, RED.mix(0.7).stroke_width(1)))?;
    chart.draw_series(LineSeries::new(tangent_after, BLUE.mix(0.7).stroke_width(1)))?;

    chart
        .draw_series(LineSeries::new(vec![(a.x_mid, y0), (a.x_mid, y1)], ORANGE.stroke_width(1)))?
        .label(format!("x_mid = {:.3}", a.x_mid))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(1)));

    let label_style = |color: RGBColor| ("sans-serif", 14).into_font().color(&color);
    let offset = 0.04 * (y1 - y0);
    let markers = [
        ((a.anchor_before.x, a.anchor_before.temperature), RED, "last pre-period reading", -offset),
        ((a.anchor_after.x, a.anchor_after.temperature), BLUE, "first post-period reading", offset),
        ((a.x_mid, a.t_mid), DARK_GREEN, "midpoint", offset),
    ];
    for ((x, y), color, text, dy) in markers {
        chart.draw_series(std::iter::once(Circle::new((x, y), 6, color.filled())))?;
        chart.draw_series(std::iter::once(Text::new(text, (x, y + dy), label_style(color))))?;
    }
    chart.draw_series(
        [(a.x_mid, a.t1), (a.x_mid, a.t2)]
            .into_iter()
            .map(|p| Cross::new(p, 6, ORANGE.stroke_width(2))),
    )?;
    chart.draw_series(std::iter::once(Text::new(
        format!("ΔT = {:.4} °C", a.delta_t),
        (a.x_mid, a.t1 - offset),
        label_style(ORANGE),
    )))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Min/max of `values` widened by 5% on both sides (never empty).
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { 0.05 * span } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad, hi + pad)
}

fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-2..1e4).contains(&a) {
        format!("{v:.2e}")
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_degenerate_input() {
        assert_eq!(padded_range([0.0, 10.0].into_iter()), (-0.5, 10.5));
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_range([2.0, 2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);
    }

    #[test]
    fn ticks_switch_to_scientific_for_tiny_values() {
        assert_eq!(format_tick(0.25), "0.250");
        assert_eq!(format_tick(3.2e-6), "3.20e-6");
        assert_eq!(format_tick(0.0), "0.000");
    }
}
