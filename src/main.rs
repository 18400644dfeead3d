use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rf_report::report::views::ReportKind;

#[derive(Parser, Debug)]
#[command(
    name = "rf-report",
    version,
    about = "Build comparative figures and ranking tables from range-filter benchmark results"
)]
struct Cli {
    /// The figures to create
    #[arg(short, long, value_enum, num_args = 1.., default_values_t = [Figure::All])]
    figures: Vec<Figure>,

    /// The directory containing benchmark results
    #[arg(long, default_value = "./results")]
    result_dir: PathBuf,

    /// The output directory storing the figures
    #[arg(long, default_value = "./figures")]
    figure_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Figure {
    All,
    Fpr,
    Construction,
    True,
    Correlated,
    Expandability,
    Btree,
}

impl Figure {
    fn kind(self) -> Option<ReportKind> {
        match self {
            Figure::All => None,
            Figure::Fpr => Some(ReportKind::Fpr),
            Figure::Construction => Some(ReportKind::Construction),
            Figure::True => Some(ReportKind::True),
            Figure::Correlated => Some(ReportKind::Correlated),
            Figure::Expandability => Some(ReportKind::Expandability),
            Figure::Btree => Some(ReportKind::Btree),
        }
    }

    fn requested(figures: &[Figure]) -> Vec<ReportKind> {
        if figures.contains(&Figure::All) {
            ReportKind::ALL.to_vec()
        } else {
            figures.iter().filter_map(|figure| figure.kind()).collect()
        }
    }
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "report build failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    fs::create_dir_all(&cli.figure_dir)
        .with_context(|| format!("failed to create {}", cli.figure_dir.display()))?;
    info!(
        results = %cli.result_dir.display(),
        figures = %cli.figure_dir.display(),
        "building reports"
    );

    for kind in Figure::requested(&cli.figures) {
        info!(report = kind.name(), "building report kind");
        kind.build(&cli.result_dir, &cli.figure_dir)
            .with_context(|| format!("report kind `{}` failed", kind.name()))?;
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
