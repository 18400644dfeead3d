//! The six report kinds.
//!
//! Each builder is one declarative combination of competitors, workload
//! axis and metric selection: enumerate the requested Cartesian product,
//! load what exists, derive, place the series into the panel grid, then
//! hand the populated view to the renderer. A missing series leaves its
//! panel sparse; everything else aborts the report kind.

use std::collections::HashMap;
use std::path::Path;

use itertools::iproduct;
use plotters::style::RGBColor;
use tracing::info;

use crate::config::Competitor;
use crate::data::loader::{self, QueryKind};
use crate::data::resolver::{resolve_latest_run, Category};
use crate::error::Result;
use crate::metrics::{aggregate, derive};
use crate::report::render;
use crate::report::table;
use crate::report::view::{AxisScale, Bar, LegendEntry, LineVariant, Panel, ReportView, Series};

/// Query-range buckets shared by most views, with their panel titles.
const QUERY_RANGES: [u32; 3] = [0, 5, 10];
const QUERY_RANGE_LABELS: [&str; 3] = [
    "Point Queries",
    "Short Range Queries",
    "Long Range Queries",
];

const BPK_AXIS_MAX: f64 = 30.0;
const BPK_AXIS_LABEL: &str = "Space [bits/key]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Fpr,
    Construction,
    True,
    Correlated,
    Expandability,
    Btree,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Fpr,
        ReportKind::Construction,
        ReportKind::True,
        ReportKind::Correlated,
        ReportKind::Expandability,
        ReportKind::Btree,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportKind::Fpr => "fpr",
            ReportKind::Construction => "construction",
            ReportKind::True => "true",
            ReportKind::Correlated => "correlated",
            ReportKind::Expandability => "expandability",
            ReportKind::Btree => "btree",
        }
    }

    /// Build the report kind to completion: resolve, load, derive, place,
    /// render.
    pub fn build(self, results_root: &Path, figures_dir: &Path) -> Result<()> {
        match self {
            ReportKind::Fpr => build_fpr(results_root, figures_dir),
            ReportKind::Construction => build_construction(results_root, figures_dir),
            ReportKind::True => build_true(results_root, figures_dir),
            ReportKind::Correlated => build_correlated(results_root, figures_dir),
            ReportKind::Expandability => build_expandability(results_root, figures_dir),
            ReportKind::Btree => build_btree(results_root, figures_dir),
        }
    }
}

// ---------------------------------------------------------------------
// False-positive rate vs space, plus the query-time ranking table
// ---------------------------------------------------------------------

const FPR_LINEUP: [Competitor; 7] = [
    Competitor::Memento,
    Competitor::Grafite,
    Competitor::Surf,
    Competitor::Proteus,
    Competitor::Snarf,
    Competitor::Rencoder,
    Competitor::Rosetta,
];

struct FprRow {
    dataset: &'static str,
    query: QueryKind,
    real: bool,
    label: &'static str,
}

const FPR_ROWS: [FprRow; 4] = [
    FprRow {
        dataset: "kuniform",
        query: QueryKind::Correlated,
        real: false,
        label: "Correlated",
    },
    FprRow {
        dataset: "kuniform",
        query: QueryKind::Uniform,
        real: false,
        label: "Uncorrelated",
    },
    FprRow {
        dataset: "books",
        query: QueryKind::Uniform,
        real: true,
        label: "Books",
    },
    FprRow {
        dataset: "osm",
        query: QueryKind::Uniform,
        real: true,
        label: "Osm",
    },
];

fn build_fpr(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let synth_run = resolve_latest_run(results_root, Category::FprSynth)?;
    let real_run = resolve_latest_run(results_root, Category::FprReal)?;
    info!(synth = %synth_run.display(), real = %real_run.display(), "building fpr report");

    let required = ["bpk", "false_positives", "n_queries", "query_time"];
    let mut view = ReportView::grid("fpr_test_all", FPR_ROWS.len(), QUERY_RANGES.len(), (1280, 1200));
    let mut latency: Vec<HashMap<Competitor, Vec<f64>>> = vec![HashMap::new(); FPR_ROWS.len()];

    for (row, competitor, (col, range)) in iproduct!(
        0..FPR_ROWS.len(),
        FPR_LINEUP,
        QUERY_RANGES.iter().enumerate()
    ) {
        let workload = &FPR_ROWS[row];
        let run = if workload.real { &real_run } else { &synth_run };
        let record = match loader::load(
            run,
            workload.dataset,
            &range.to_string(),
            Some(workload.query),
            competitor,
            &required,
        )? {
            Some(record) => record,
            None => continue,
        };

        let bpk = record.column_f64("bpk")?;
        let rates = derive::fpr(&record)?;
        view.panel_mut(row, col).series.push(Series {
            competitor,
            line: LineVariant::Solid,
            points: bpk.into_iter().zip(rates).collect(),
        });

        let per_query = derive::per_op_time(&record, "query_time", "n_queries", 1e6)?;
        latency[row]
            .entry(competitor)
            .or_default()
            .push(aggregate::aggregate(&per_query));
    }

    let fpr_ticks = vec![1.0, 1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 0.0];
    for (row, col) in iproduct!(0..FPR_ROWS.len(), 0..QUERY_RANGES.len()) {
        let panel = view.panel_mut(row, col);
        panel.y.scale = AxisScale::SymLog { linthresh: 1e-6 };
        panel.y.ticks = Some(fpr_ticks.clone());
        panel.y.max = Some(1.9);
        panel.x.max = Some(BPK_AXIS_MAX);
        if row == 0 {
            panel.title = Some(QUERY_RANGE_LABELS[col].to_string());
        }
        if row == FPR_ROWS.len() - 1 {
            panel.x.label = Some(BPK_AXIS_LABEL.to_string());
        }
        if col == 0 {
            panel.y.label = Some(format!("{} False Positive Rate", FPR_ROWS[row].label));
        }
    }

    view.legend = FPR_LINEUP.iter().map(|c| LegendEntry::competitor(*c)).collect();
    view.legend_panel = 1;
    render::render_view(&view, figures_dir)?;

    let mut tables = Vec::new();
    for (row, workload) in FPR_ROWS.iter().enumerate() {
        let mut rows = Vec::new();
        for competitor in FPR_LINEUP {
            if let Some(values) = latency[row].get(&competitor) {
                rows.push((competitor, aggregate::round_to(aggregate::mean(values), 0)));
            }
        }
        tables.push((workload.label, aggregate::rank(&rows)));
    }
    table::write_ranking(figures_dir, FPR_LINEUP[0], &tables)?;
    Ok(())
}

// ---------------------------------------------------------------------
// Construction cost
// ---------------------------------------------------------------------

const CONSTR_LINEUP: [Competitor; 7] = [
    Competitor::Memento,
    Competitor::Grafite,
    Competitor::Snarf,
    Competitor::Surf,
    Competitor::Proteus,
    Competitor::Rosetta,
    Competitor::Rencoder,
];

const KEY_EXPONENTS: [u32; 4] = [5, 6, 7, 8];
const BAR_WIDTH: f64 = 0.12;

fn build_construction(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let run = resolve_latest_run(results_root, Category::ConstructionTime)?;
    info!(run = %run.display(), "building construction report");

    let mut view = ReportView::grid("constr_time_test", 1, 1, (720, 480));

    for (exponent, (slot, competitor)) in
        iproduct!(KEY_EXPONENTS, CONSTR_LINEUP.iter().enumerate())
    {
        let group = (exponent - KEY_EXPONENTS[0]) as f64;
        let record = match loader::load(
            &run,
            &format!("kuniform_{}", exponent),
            "5",
            Some(QueryKind::Uniform),
            *competitor,
            &["build_time", "n_keys"],
        )? {
            Some(record) => record,
            None => continue,
        };

        let x = group + slot as f64 * BAR_WIDTH;
        let build = derive::per_key_time(&record, "build_time")?;
        let panel = view.panel_mut(0, 0);
        panel.bars.push(Bar {
            competitor: *competitor,
            x,
            width: BAR_WIDTH,
            base: 0.0,
            height: build,
            tinted: false,
        });
        // Filters with a modelling phase stack it on top in a pale tint.
        if record.has_column("modelling_time") {
            let modelling = derive::per_key_time(&record, "modelling_time")?;
            panel.bars.push(Bar {
                competitor: *competitor,
                x,
                width: BAR_WIDTH,
                base: build,
                height: modelling,
                tinted: true,
            });
        }
    }

    let panel = view.panel_mut(0, 0);
    panel.y.label = Some("Construction Time [ns/key]".to_string());
    panel.x.label = Some("Number of Keys".to_string());
    panel.x.named_ticks = Some(
        KEY_EXPONENTS
            .iter()
            .enumerate()
            .map(|(group, exponent)| (group as f64 + 3.0 * BAR_WIDTH, format!("10^{}", exponent)))
            .collect(),
    );

    view.legend = CONSTR_LINEUP.iter().map(|c| LegendEntry::swatch(*c)).collect();
    render::render_view(&view, figures_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------
// True-positive query latency
// ---------------------------------------------------------------------

fn build_true(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let run = resolve_latest_run(results_root, Category::TruePositive)?;
    info!(run = %run.display(), "building true-positive report");

    let required = ["bpk", "query_time", "n_queries"];
    let mut view = ReportView::grid("true_queries_test", 1, QUERY_RANGES.len(), (1280, 360));

    for (competitor, (col, range)) in iproduct!(CONSTR_LINEUP, QUERY_RANGES.iter().enumerate()) {
        let record = match loader::load(
            &run,
            "kuniform",
            &range.to_string(),
            Some(QueryKind::True),
            competitor,
            &required,
        )? {
            Some(record) => record,
            None => continue,
        };

        let bpk = record.column_f64("bpk")?;
        let per_query = derive::per_op_time(&record, "query_time", "n_queries", 1e6)?;
        view.panel_mut(0, col).series.push(Series {
            competitor,
            line: LineVariant::Solid,
            points: bpk.into_iter().zip(per_query).collect(),
        });
    }

    for col in 0..QUERY_RANGES.len() {
        let panel = view.panel_mut(0, col);
        panel.title = Some(QUERY_RANGE_LABELS[col].to_string());
        panel.y.scale = AxisScale::Log;
        panel.y.ticks = Some(vec![1e2, 1e3, 1e4, 1e5]);
        panel.x.max = Some(BPK_AXIS_MAX);
        panel.x.label = Some(BPK_AXIS_LABEL.to_string());
        if col == 0 {
            panel.y.label = Some("Time [ns/query]".to_string());
        }
    }

    view.legend = CONSTR_LINEUP.iter().map(|c| LegendEntry::competitor(*c)).collect();
    view.legend_panel = QUERY_RANGES.len() - 1;
    render::render_view(&view, figures_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------
// Correlation sensitivity
// ---------------------------------------------------------------------

fn build_correlated(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let run = resolve_latest_run(results_root, Category::Correlation)?;
    info!(run = %run.display(), "building correlation report");

    let required = ["false_positives", "n_queries", "query_time"];
    let mut view = ReportView::grid("corr_test_twolines", 2, QUERY_RANGES.len(), (1280, 700));

    for (competitor, (col, range)) in iproduct!(CONSTR_LINEUP, QUERY_RANGES.iter().enumerate()) {
        let mut rate_points = Vec::new();
        let mut time_points = Vec::new();
        for degree in 0..=10u32 {
            let record = match loader::load(
                &run,
                &format!("kuniform_{}", degree),
                &range.to_string(),
                Some(QueryKind::Correlated),
                competitor,
                &required,
            )? {
                Some(record) => record,
                None => continue,
            };
            let x = degree as f64 / 10.0;
            rate_points.push((x, derive::first_fpr(&record)?));
            time_points.push((
                x,
                derive::first_per_op_time(&record, "query_time", "n_queries", 1e6)?,
            ));
        }
        if !rate_points.is_empty() {
            view.panel_mut(0, col).series.push(Series {
                competitor,
                line: LineVariant::Solid,
                points: rate_points,
            });
            view.panel_mut(1, col).series.push(Series {
                competitor,
                line: LineVariant::Solid,
                points: time_points,
            });
        }
    }

    // Rows share their y-range across the three range buckets.
    let rate_bounds = row_bounds(&view, 0);
    let time_bounds = row_bounds(&view, 1);
    for col in 0..QUERY_RANGES.len() {
        let panel = view.panel_mut(0, col);
        panel.y.scale = AxisScale::SymLog { linthresh: 1e-5 };
        panel.title = Some(QUERY_RANGE_LABELS[col].to_string());
        if let Some((_, hi)) = rate_bounds {
            panel.y.max = Some(hi * 1.3);
        }
        if col == 0 {
            panel.y.label = Some("False Positive Rate".to_string());
        }

        let panel = view.panel_mut(1, col);
        panel.y.scale = AxisScale::Log;
        panel.x.label = Some("Correlation Degree".to_string());
        if let Some((lo, hi)) = time_bounds {
            panel.y.min = Some(lo / 1.3);
            panel.y.max = Some(hi * 1.3);
        }
        if col == 0 {
            panel.y.label = Some("Time [ns/query]".to_string());
        }
    }

    view.legend = CONSTR_LINEUP.iter().map(|c| LegendEntry::competitor(*c)).collect();
    view.legend_panel = QUERY_RANGES.len() - 1;
    render::render_view(&view, figures_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------
// Expansion sensitivity
// ---------------------------------------------------------------------

const EXPANSION_LINEUP: [Competitor; 4] = [
    Competitor::Memento,
    Competitor::Snarf,
    Competitor::Rosetta,
    Competitor::Rencoder,
];

fn build_expandability(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let run = resolve_latest_run(results_root, Category::Expansion)?;
    info!(run = %run.display(), "building expansion report");

    // 3 fpr panels by range bucket, then the insert-cost panel.
    let mut view = ReportView::grid("expansion_test", 1, QUERY_RANGES.len() + 1, (1400, 340));

    for (competitor, (col, range), degree) in iproduct!(
        EXPANSION_LINEUP,
        QUERY_RANGES.iter().enumerate(),
        [0u32, 1]
    ) {
        let record = match loader::load(
            &run,
            &format!("kuniform_{}", degree),
            &range.to_string(),
            Some(QueryKind::Correlated),
            competitor,
            &[],
        )? {
            Some(record) => record,
            None => continue,
        };
        let line = if degree == 0 {
            LineVariant::Solid
        } else {
            LineVariant::DashDot
        };

        let rates = derive::expansion_fpr(&record)?;
        if !rates.is_empty() {
            view.panel_mut(0, col).series.push(Series {
                competitor,
                line,
                points: rates
                    .into_iter()
                    .enumerate()
                    .map(|(step, rate)| (step as f64, rate))
                    .collect(),
            });
        }

        // Insert costs are shown once, for the point-query bucket.
        if col == 0 {
            let costs = derive::expansion_insert_cost(&record)?;
            if !costs.is_empty() {
                view.panel_mut(0, QUERY_RANGES.len()).series.push(Series {
                    competitor,
                    line,
                    points: costs
                        .into_iter()
                        .enumerate()
                        .map(|(step, cost)| ((step + 1) as f64, cost))
                        .collect(),
                });
            }
        }
    }

    let shared_max = (0..QUERY_RANGES.len())
        .filter_map(|col| panel_bounds(&view.panels[col]))
        .map(|(_, hi)| hi)
        .fold(f64::NEG_INFINITY, f64::max);

    let expansion_ticks = vec![0.0, 2.0, 4.0, 6.0];
    for col in 0..=QUERY_RANGES.len() {
        let panel = view.panel_mut(0, col);
        panel.x.ticks = Some(expansion_ticks.clone());
        panel.x.label = Some("Number of Expansions".to_string());
        if col < QUERY_RANGES.len() {
            panel.title = Some(QUERY_RANGE_LABELS[col].to_string());
            panel.y.scale = AxisScale::SymLog { linthresh: 1e-5 };
            if shared_max.is_finite() {
                panel.y.max = Some(shared_max * 1.3);
            }
        } else {
            panel.title = Some("Inserts".to_string());
            panel.y.scale = AxisScale::SymLog { linthresh: 1e2 };
            panel.y.label = Some("Time [ns/insert]".to_string());
        }
    }
    view.panel_mut(0, 0).y.label = Some("False Positive Rate".to_string());

    view.legend = EXPANSION_LINEUP
        .iter()
        .map(|c| LegendEntry::competitor(*c))
        .chain([
            LegendEntry::line_style(
                "Correlated (0.2)",
                RGBColor(0, 0, 0),
                LineVariant::DashDot,
            ),
            LegendEntry::line_style(
                "Uncorrelated",
                RGBColor(0, 0, 0),
                LineVariant::Solid,
            ),
        ])
        .collect();
    view.legend_panel = QUERY_RANGES.len();
    render::render_view(&view, figures_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------
// B-tree comparison
// ---------------------------------------------------------------------

const BTREE_LINEUP: [Competitor; 2] = [Competitor::NoFilter, Competitor::Memento];
const BTREE_EXPANSIONS: usize = 3;
const BTREE_FRACS: usize = 11;
/// Dataset fraction present after the initial build and each doubling.
const BTREE_WRITE_X: [f64; 4] = [0.0, 0.25, 0.5, 1.0];

fn build_btree(results_root: &Path, figures_dir: &Path) -> Result<()> {
    let run = resolve_latest_run(results_root, Category::BTree)?;
    info!(run = %run.display(), "building b-tree report");

    let mut view = ReportView::grid("b_tree_test", 1, 2, (900, 360));

    for competitor in BTREE_LINEUP {
        let record = match loader::load(
            &run,
            "kuniform",
            "5M",
            Some(QueryKind::Uniform),
            competitor,
            &["build_time"],
        )? {
            Some(record) => record,
            None => continue,
        };

        let writes = derive::btree_write_cost(&record)?;
        view.panel_mut(0, 0).series.push(Series {
            competitor,
            line: LineVariant::Solid,
            points: BTREE_WRITE_X.iter().copied().zip(writes).collect(),
        });

        for step in 0..=BTREE_EXPANSIONS {
            let reads = derive::btree_read_cost(&record, step)?;
            if reads.is_empty() {
                continue;
            }
            view.panel_mut(0, 1).series.push(Series {
                competitor,
                line: LineVariant::Stepped(step),
                points: reads
                    .into_iter()
                    .enumerate()
                    .map(|(frac, cost)| (frac as f64 / (BTREE_FRACS - 1) as f64, cost))
                    .collect(),
            });
        }
    }

    let panel = view.panel_mut(0, 0);
    panel.title = Some("Inserts".to_string());
    panel.x.label = Some("Dataset Fraction".to_string());
    panel.y.label = Some("Time [us/op]".to_string());

    let panel = view.panel_mut(0, 1);
    panel.title = Some("Range Queries".to_string());
    panel.x.label = Some("Fraction of Non-Empty Queries".to_string());

    view.legend = BTREE_LINEUP
        .iter()
        .map(|c| LegendEntry::competitor(*c))
        .chain((0..=BTREE_EXPANSIONS).map(|step| {
            let label = match step {
                0 => "1/8 Dataset".to_string(),
                1 => "1/4 Dataset".to_string(),
                2 => "1/2 Dataset".to_string(),
                _ => "Full Dataset".to_string(),
            };
            LegendEntry::line_style(
                &label,
                RGBColor(0, 0, 0),
                LineVariant::Stepped(step),
            )
        }))
        .collect();
    view.legend_panel = 1;
    render::render_view(&view, figures_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------

/// Finite (min-positive, max) of all series in one panel.
fn panel_bounds(panel: &Panel) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for series in &panel.series {
        for &(_, y) in &series.points {
            if y.is_finite() {
                if y > 0.0 {
                    lo = lo.min(y);
                }
                hi = hi.max(y);
            }
        }
    }
    if hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

/// Shared bounds of one panel row.
fn row_bounds(view: &ReportView, row: usize) -> Option<(f64, f64)> {
    let mut merged: Option<(f64, f64)> = None;
    for col in 0..view.cols {
        if let Some((lo, hi)) = panel_bounds(&view.panels[row * view.cols + col]) {
            merged = Some(match merged {
                Some((mlo, mhi)) => (mlo.min(lo), mhi.max(hi)),
                None => (lo, hi),
            });
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_series(dir: &Path, competitor: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.csv", competitor)), contents).unwrap();
    }

    #[test]
    fn fpr_report_builds_from_sparse_fixture() {
        let tmp = tempfile::tempdir().unwrap();
        let results = tmp.path().join("results");
        let figures = tmp.path().join("figures");
        fs::create_dir_all(&figures).unwrap();

        let synth = results.join("fpr_test").join("20240101");
        let csv = "bpk,n_queries,false_positives,query_time\n10,1000,5,2.5\n14,1000,1,2.0\n";
        for query in ["qcorrelated", "quniform"] {
            for range in ["0", "5", "10"] {
                let dir = synth.join("kuniform").join(format!("{}_{}", range, query));
                write_series(&dir, "memento", csv);
                write_series(&dir, "grafite", csv);
            }
        }
        // real-world category has a run but no series: panels stay sparse
        fs::create_dir_all(results.join("fpr_real_test").join("20240101")).unwrap();

        ReportKind::Fpr.build(&results, &figures).unwrap();

        assert!(figures.join("fpr_test_all.svg").is_file());
        let ranking = fs::read_to_string(figures.join("fpr_test_table.txt")).unwrap();
        assert!(ranking.contains("Memento"));
        assert!(ranking.contains("Grafite"));
        assert!(ranking.contains("(1.00x)"));
    }

    #[test]
    fn fpr_report_without_any_run_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let results = tmp.path().join("results");
        let figures = tmp.path().join("figures");
        fs::create_dir_all(&figures).unwrap();
        fs::create_dir_all(&results).unwrap();

        assert!(ReportKind::Fpr.build(&results, &figures).is_err());
    }

    #[test]
    fn construction_report_builds_stacked_bars() {
        let tmp = tempfile::tempdir().unwrap();
        let results = tmp.path().join("results");
        let figures = tmp.path().join("figures");
        fs::create_dir_all(&figures).unwrap();

        let run = results.join("constr_time_test").join("20240101");
        for exponent in [5, 6] {
            let dir = run
                .join(format!("kuniform_{}", exponent))
                .join("5_quniform");
            write_series(&dir, "memento", "build_time,n_keys\n4.0,100000\n");
            write_series(
                &dir,
                "snarf",
                "build_time,modelling_time,n_keys\n3.0,1.0,100000\n",
            );
        }

        ReportKind::Construction.build(&results, &figures).unwrap();
        assert!(figures.join("constr_time_test.svg").is_file());
    }

    #[test]
    fn expandability_report_handles_short_sequences() {
        let tmp = tempfile::tempdir().unwrap();
        let results = tmp.path().join("results");
        let figures = tmp.path().join("figures");
        fs::create_dir_all(&figures).unwrap();

        let run = results.join("expansion_test").join("20240101");
        let csv = "bpk,false_positives_0,n_queries_0,false_positives_1,n_queries_1,\
                   expansion_time_0,n_keys_0\n10,5,1000,9,1000,1.5,200000\n";
        for degree in ["kuniform_0", "kuniform_1"] {
            for range in ["0", "5", "10"] {
                let dir = run.join(degree).join(format!("{}_qcorrelated", range));
                write_series(&dir, "memento", csv);
            }
        }

        ReportKind::Expandability.build(&results, &figures).unwrap();
        assert!(figures.join("expansion_test.svg").is_file());
    }
}
