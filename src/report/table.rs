use std::fs;
use std::path::{Path, PathBuf};

use comfy_table::Table;
use tracing::info;

use crate::config::Competitor;
use crate::error::Result;
use crate::metrics::aggregate::RankedRow;

/// Write the ranking-table artifact of the false-positive report: one table
/// per workload row, competitors ordered by the ranker, query-time means
/// annotated with their baseline-relative ratio.
pub fn write_ranking(
    out_dir: &Path,
    baseline: Competitor,
    tables: &[(&str, Vec<RankedRow>)],
) -> Result<PathBuf> {
    let mut out = String::new();
    for (workload, rows) in tables {
        let mut table = Table::new();
        table.set_header(vec![
            "Competitor".to_string(),
            format!("Avg Query Time (wrt {})", baseline.style().label),
        ]);
        for row in rows {
            table.add_row(vec![
                row.competitor.style().label.to_string(),
                format!("{:.0} ({:.2}x)", row.mean, row.ratio),
            ]);
        }
        out.push_str(workload);
        out.push('\n');
        out.push_str(&table.to_string());
        out.push_str("\n\n");
    }

    let path = out_dir.join("fpr_test_table.txt");
    fs::write(&path, out)?;
    info!(artifact = %path.display(), "ranking table written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::aggregate::rank;

    #[test]
    fn formats_means_with_baseline_ratios() {
        let tmp = tempfile::tempdir().unwrap();
        let ranked = rank(&[
            (Competitor::Memento, 100.0),
            (Competitor::Grafite, 50.0),
        ]);

        let path = write_ranking(
            tmp.path(),
            Competitor::Memento,
            &[("Uncorrelated", ranked)],
        )
        .unwrap();
        let rendered = fs::read_to_string(path).unwrap();

        assert!(rendered.contains("Uncorrelated"));
        assert!(rendered.contains("Avg Query Time (wrt Memento)"));
        assert!(rendered.contains("100 (1.00x)"));
        assert!(rendered.contains("50 (0.50x)"));
    }
}
