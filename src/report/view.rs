//! Declarative report-view model.
//!
//! A [`ReportView`] is everything a report kind decides: the panel grid,
//! which series land in which panel, per-panel axis policy and the shared
//! legend. Rendering it to an artifact is the renderer's business.

use plotters::style::RGBColor;

use crate::config::{Competitor, MarkerShape};

/// Axis scaling policy.
///
/// `SymLog` is logarithmic with a linear window around zero so that
/// exact-zero rates stay visible; `linthresh` is the edge of that window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AxisScale {
    Linear,
    Log,
    SymLog { linthresh: f64 },
}

#[derive(Clone, Debug)]
pub struct AxisSpec {
    pub label: Option<String>,
    pub scale: AxisScale,
    /// Fixed tick set; also widens the axis range to cover the ticks.
    pub ticks: Option<Vec<f64>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Tick positions with verbatim labels (bar-group axes).
    pub named_ticks: Option<Vec<(f64, String)>>,
}

impl Default for AxisSpec {
    fn default() -> Self {
        Self {
            label: None,
            scale: AxisScale::Linear,
            ticks: None,
            min: None,
            max: None,
            named_ticks: None,
        }
    }
}

/// Line styling of one plotted series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineVariant {
    Solid,
    /// Alternate style for a secondary sub-condition (correlated keys).
    DashDot,
    /// Per-expansion-step styles of the B-tree view, dotted through solid.
    Stepped(usize),
}

#[derive(Clone, Debug)]
pub struct Series {
    pub competitor: Competitor,
    pub line: LineVariant,
    pub points: Vec<(f64, f64)>,
}

/// One bar of a grouped bar panel.
#[derive(Clone, Debug)]
pub struct Bar {
    pub competitor: Competitor,
    pub x: f64,
    pub width: f64,
    pub base: f64,
    pub height: f64,
    /// Drawn in the competitor's tint instead of its base color
    /// (the stacked modelling segment).
    pub tinted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Panel {
    pub title: Option<String>,
    pub x: AxisSpec,
    pub y: AxisSpec,
    pub series: Vec<Series>,
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug)]
pub struct LegendEntry {
    pub label: String,
    pub color: RGBColor,
    pub marker: Option<MarkerShape>,
    pub line: LineVariant,
    pub filled: bool,
}

impl LegendEntry {
    pub fn competitor(competitor: Competitor) -> Self {
        let style = competitor.style();
        Self {
            label: style.label.to_string(),
            color: style.color,
            marker: Some(style.marker),
            line: LineVariant::Solid,
            filled: false,
        }
    }

    /// Swatch-style entry for bar charts.
    pub fn swatch(competitor: Competitor) -> Self {
        let style = competitor.style();
        Self {
            label: style.label.to_string(),
            color: style.color,
            marker: Some(MarkerShape::Square),
            line: LineVariant::Solid,
            filled: true,
        }
    }

    /// Line-style-only entry (no competitor attached).
    pub fn line_style(label: &str, color: RGBColor, line: LineVariant) -> Self {
        Self {
            label: label.to_string(),
            color,
            marker: None,
            line,
            filled: false,
        }
    }
}

pub struct ReportView {
    /// Output artifact stem, e.g. `fpr_test_all`.
    pub stem: &'static str,
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `rows * cols` panels.
    pub panels: Vec<Panel>,
    pub legend: Vec<LegendEntry>,
    /// Index of the panel hosting the shared legend.
    pub legend_panel: usize,
    /// Artifact size in pixels.
    pub size: (u32, u32),
}

impl ReportView {
    pub fn grid(stem: &'static str, rows: usize, cols: usize, size: (u32, u32)) -> Self {
        Self {
            stem,
            rows,
            cols,
            panels: vec![Panel::default(); rows * cols],
            legend: Vec::new(),
            legend_panel: 0,
            size,
        }
    }

    pub fn panel_mut(&mut self, row: usize, col: usize) -> &mut Panel {
        &mut self.panels[row * self.cols + col]
    }
}
