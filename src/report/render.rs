//! Report renderer: turns a declarative [`ReportView`] into an SVG artifact.
//!
//! The SVG backend keeps the crate free of system font and raster
//! dependencies. Symlog axes are approximated on a log scale by clamping
//! values below `linthresh / 3` to that floor, which keeps exact-zero rates
//! visible at the bottom of the panel instead of silently dropping them.
//! Non-finite derived values break the polyline, so they appear as gaps.

use std::path::{Path, PathBuf};

use plotters::chart::SeriesLabelPosition;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::{CoordTranslate, Shift};
use plotters::element::{DynElement, IntoDynElement};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::info;

use crate::config::MarkerShape;
use crate::error::{ReportError, Result};
use crate::report::view::{AxisScale, LegendEntry, LineVariant, Panel, ReportView, Series};

pub fn render_view(view: &ReportView, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.svg", view.stem));
    {
        let root = SVGBackend::new(&path, view.size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|err| render_error(&path, err.to_string()))?;

        let areas = root.split_evenly((view.rows, view.cols));
        for (idx, (panel, area)) in view.panels.iter().zip(areas.iter()).enumerate() {
            let legend = if idx == view.legend_panel && !view.legend.is_empty() {
                Some(&view.legend[..])
            } else {
                None
            };
            draw_panel(area, panel, legend).map_err(|reason| render_error(&path, reason))?;
        }

        root.present()
            .map_err(|err| render_error(&path, err.to_string()))?;
    }
    info!(artifact = %path.display(), "figure written");
    Ok(path)
}

fn render_error(path: &Path, reason: String) -> ReportError {
    ReportError::Render {
        path: path.to_path_buf(),
        reason,
    }
}

fn draw_panel<'a>(
    area: &DrawingArea<SVGBackend<'a>, Shift>,
    panel: &Panel,
    legend: Option<&[LegendEntry]>,
) -> std::result::Result<(), String> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for series in &panel.series {
        for &(x, y) in &series.points {
            if x.is_finite() && y.is_finite() {
                xs.push(x);
                ys.push(y);
            }
        }
    }
    for bar in &panel.bars {
        xs.push(bar.x - bar.width / 2.0);
        xs.push(bar.x + bar.width / 2.0);
        ys.push(bar.base);
        ys.push(bar.base + bar.height);
    }

    let (mut x_lo, mut x_hi) = extent(&xs, (0.0, 1.0));
    let x_pad = (x_hi - x_lo) * 0.04;
    x_lo -= x_pad;
    x_hi += x_pad;
    if let Some(min) = panel.x.min {
        x_lo = min;
    }
    if let Some(max) = panel.x.max {
        x_hi = max;
    }

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(8)
        .x_label_area_size(32)
        .y_label_area_size(52);
    if let Some(title) = &panel.title {
        builder.caption(title, ("sans-serif", 14));
    }

    match panel.y.scale {
        AxisScale::Linear => {
            let (mut y_lo, mut y_hi) = extent(&ys, (0.0, 1.0));
            let y_pad = (y_hi - y_lo) * 0.05;
            y_hi += y_pad;
            if y_lo - y_pad >= 0.0 || y_lo < 0.0 {
                y_lo -= y_pad;
            } else {
                y_lo = 0.0;
            }
            if let Some(min) = panel.y.min {
                y_lo = min;
            }
            if let Some(max) = panel.y.max {
                y_hi = max;
            }

            let mut chart = builder
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
                .map_err(|err| err.to_string())?;
            configure_mesh(&mut chart, panel)?;
            draw_panel_series(&mut chart, panel, legend, &|y| y)
        }
        scale => {
            let positive_ticks: Vec<f64> = panel
                .y
                .ticks
                .iter()
                .flatten()
                .copied()
                .filter(|tick| *tick > 0.0)
                .collect();
            let data_floor = ys
                .iter()
                .chain(&positive_ticks)
                .copied()
                .filter(|v| *v > 0.0)
                .fold(f64::INFINITY, f64::min);
            let data_cap = ys
                .iter()
                .chain(&positive_ticks)
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);

            let floor = match scale {
                AxisScale::SymLog { linthresh } => linthresh / 3.0,
                _ => match panel.y.min.filter(|min| *min > 0.0) {
                    Some(min) => min,
                    None if data_floor.is_finite() => data_floor / 1.3,
                    None => 0.1,
                },
            };
            let mut cap = match panel.y.max {
                Some(max) => max,
                None if data_cap.is_finite() => data_cap * 1.3,
                None => floor * 100.0,
            };
            if cap <= floor {
                cap = floor * 10.0;
            }

            let mut chart = builder
                .build_cartesian_2d(x_lo..x_hi, (floor..cap).log_scale())
                .map_err(|err| err.to_string())?;
            configure_mesh(&mut chart, panel)?;
            draw_panel_series(&mut chart, panel, legend, &move |y: f64| y.max(floor))
        }
    }
}

fn configure_mesh<DB, YR>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, YR>>,
    panel: &Panel,
) -> std::result::Result<(), String>
where
    DB: DrawingBackend,
    YR: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let named = panel.x.named_ticks.clone();
    let x_formatter = move |value: &f64| -> String {
        match &named {
            Some(named) => named
                .iter()
                .find(|(pos, _)| (value - pos).abs() < 0.5)
                .map(|(_, label)| label.clone())
                .unwrap_or_default(),
            None => format_tick(*value),
        }
    };
    let y_formatter = |value: &f64| format_tick(*value);

    let x_labels = match (&panel.x.named_ticks, &panel.x.ticks) {
        (Some(named), _) => named.len() + 1,
        (None, Some(ticks)) => ticks.len(),
        (None, None) => 6,
    };
    let y_labels = match &panel.y.ticks {
        Some(ticks) => ticks.len(),
        None => 5,
    };

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_labels(x_labels)
        .y_labels(y_labels)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .label_style(("sans-serif", 11))
        .axis_desc_style(("sans-serif", 12));
    if let Some(label) = &panel.x.label {
        mesh.x_desc(label);
    }
    if let Some(label) = &panel.y.label {
        mesh.y_desc(label);
    }
    mesh.draw().map_err(|err| err.to_string())
}

fn draw_panel_series<DB, CT>(
    chart: &mut ChartContext<'_, DB, CT>,
    panel: &Panel,
    legend: Option<&[LegendEntry]>,
    clamp: &(impl Fn(f64) -> f64 + Copy),
) -> std::result::Result<(), String>
where
    DB: DrawingBackend + 'static,
    CT: CoordTranslate<From = (f64, f64)>,
{
    // Higher z-order draws later and therefore on top.
    let mut ordered: Vec<&Series> = panel.series.iter().collect();
    ordered.sort_by_key(|series| series.competitor.style().z_order);

    for series in ordered {
        let style = series.competitor.style();
        let stroke: ShapeStyle = style.color.stroke_width(1);

        for run in finite_runs(&series.points, clamp) {
            match dash_params(series.line) {
                None => {
                    chart
                        .draw_series(LineSeries::new(run, stroke))
                        .map_err(|err| err.to_string())?;
                }
                Some((size, spacing)) => {
                    chart
                        .draw_series(DashedLineSeries::new(run, size, spacing, stroke))
                        .map_err(|err| err.to_string())?;
                }
            }
        }

        chart
            .draw_series(
                series
                    .points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&(x, y)| marker_glyph(style.marker, (x, clamp(y)), stroke)),
            )
            .map_err(|err| err.to_string())?;
    }

    for bar in &panel.bars {
        let style = bar.competitor.style();
        let color = if bar.tinted {
            style.tint()
        } else {
            style.color
        };
        let half = bar.width / 2.0;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (bar.x - half, clamp(bar.base)),
                    (bar.x + half, clamp(bar.base + bar.height)),
                ],
                color.filled(),
            )))
            .map_err(|err| err.to_string())?;
    }

    if let Some(entries) = legend {
        for entry in entries {
            chart
                .draw_series(std::iter::once(EmptyElement::at((0.0, clamp(0.0)))))
                .map_err(|err| err.to_string())?
                .label(entry.label.clone())
                .legend(legend_glyph::<DB>(entry.clone()));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85).filled())
            .border_style(RGBColor(160, 160, 160).stroke_width(1))
            .label_font(("sans-serif", 11))
            .draw()
            .map_err(|err| err.to_string())?;
    }

    Ok(())
}

/// Split a point list into finite runs; non-finite values become gaps.
fn finite_runs(points: &[(f64, f64)], clamp: &impl Fn(f64) -> f64) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            current.push((x, clamp(y)));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Dash geometry of a line variant; `None` means solid.
fn dash_params(line: LineVariant) -> Option<(i32, i32)> {
    match line {
        LineVariant::Solid => None,
        LineVariant::DashDot => Some((5, 4)),
        LineVariant::Stepped(0) => Some((1, 3)),
        LineVariant::Stepped(1) => Some((5, 4)),
        LineVariant::Stepped(2) => Some((9, 4)),
        LineVariant::Stepped(_) => None,
    }
}

fn marker_glyph<DB: DrawingBackend + 'static>(
    shape: MarkerShape,
    pos: (f64, f64),
    style: ShapeStyle,
) -> DynElement<'static, DB, (f64, f64)> {
    match shape {
        MarkerShape::Circle => Circle::new(pos, 3, style).into_dyn(),
        MarkerShape::Cross => Cross::new(pos, 3, style).into_dyn(),
        MarkerShape::X => Cross::new(pos, 4, style).into_dyn(),
        MarkerShape::TriangleUp => TriangleMarker::new(pos, 4, style).into_dyn(),
        MarkerShape::Square => {
            (EmptyElement::at(pos) + Rectangle::new([(-3, -3), (3, 3)], style)).into_dyn()
        }
        MarkerShape::Diamond => (EmptyElement::at(pos)
            + PathElement::new(vec![(0, -4), (4, 0), (0, 4), (-4, 0), (0, -4)], style))
        .into_dyn(),
        MarkerShape::Caret => {
            (EmptyElement::at(pos) + PathElement::new(vec![(3, -4), (-4, 0), (3, 4)], style))
                .into_dyn()
        }
        MarkerShape::TriangleRight => (EmptyElement::at(pos)
            + PathElement::new(vec![(-3, -4), (4, 0), (-3, 4), (-3, -4)], style))
        .into_dyn(),
    }
}

fn legend_glyph<DB: DrawingBackend + 'static>(
    entry: LegendEntry,
) -> impl Fn((i32, i32)) -> DynElement<'static, DB, (i32, i32)> {
    move |(x, y)| {
        let style: ShapeStyle = if entry.filled {
            entry.color.filled()
        } else {
            entry.color.stroke_width(1)
        };
        match entry.marker {
            Some(shape) => {
                let base = EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (18, 0)], style);
                match shape {
                    MarkerShape::Circle => (base + Circle::new((9, 0), 3, style)).into_dyn(),
                    MarkerShape::Cross => (base + Cross::new((9, 0), 3, style)).into_dyn(),
                    MarkerShape::X => (base + Cross::new((9, 0), 4, style)).into_dyn(),
                    MarkerShape::TriangleUp => {
                        (base + TriangleMarker::new((9, 0), 4, style)).into_dyn()
                    }
                    MarkerShape::Square => {
                        (base + Rectangle::new([(6, -3), (12, 3)], style)).into_dyn()
                    }
                    MarkerShape::Diamond => (base
                        + PathElement::new(vec![(9, -4), (13, 0), (9, 4), (5, 0), (9, -4)], style))
                    .into_dyn(),
                    MarkerShape::Caret => {
                        (base + PathElement::new(vec![(12, -4), (5, 0), (12, 4)], style)).into_dyn()
                    }
                    MarkerShape::TriangleRight => (base
                        + PathElement::new(vec![(6, -4), (13, 0), (6, 4), (6, -4)], style))
                    .into_dyn(),
                }
            }
            None => match dash_params(entry.line) {
                None => (EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (18, 0)], style))
                .into_dyn(),
                Some(_) => (EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (7, 0)], style)
                    + PathElement::new(vec![(11, 0), (18, 0)], style))
                .into_dyn(),
            },
        }
    }
}

fn extent(values: &[f64], fallback: (f64, f64)) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &value in values {
        if value.is_finite() {
            lo = lo.min(value);
            hi = hi.max(value);
        }
    }
    if lo > hi {
        return fallback;
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if magnitude >= 10_000.0 || magnitude < 0.01 {
        format!("{:.0e}", value)
    } else if magnitude >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", (value * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_runs_split_at_gaps() {
        let points = vec![
            (0.0, 1.0),
            (1.0, f64::NAN),
            (2.0, 3.0),
            (3.0, 4.0),
        ];
        let runs = finite_runs(&points, &|y| y);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(0.0, 1.0)]);
        assert_eq!(runs[1], vec![(2.0, 3.0), (3.0, 4.0)]);
    }

    #[test]
    fn format_tick_uses_scientific_for_rates() {
        assert_eq!(format_tick(1e-6), "1e-6");
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(100_000.0), "1e5");
    }
}
