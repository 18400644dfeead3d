use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::config::Competitor;
use crate::data::columnar::RunRecord;
use crate::error::{ReportError, Result};

/// Query distribution a workload was measured under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    Uniform,
    Correlated,
    True,
}

impl QueryKind {
    pub fn key(self) -> &'static str {
        match self {
            QueryKind::Uniform => "quniform",
            QueryKind::Correlated => "qcorrelated",
            QueryKind::True => "qtrue",
        }
    }
}

/// Expected location of one series' CSV inside a run directory.
///
/// Workloads with a query dimension live under `<bucket>_<query>/`, the
/// rest directly under `<bucket>/`.
pub fn result_file(
    run: &Path,
    dataset: &str,
    bucket: &str,
    query: Option<QueryKind>,
    competitor: Competitor,
) -> PathBuf {
    let leaf = match query {
        Some(kind) => format!("{}_{}", bucket, kind.key()),
        None => bucket.to_string(),
    };
    run.join(dataset)
        .join(leaf)
        .join(format!("{}.csv", competitor.key()))
}

/// Load the record set for one (competitor, workload) pair.
///
/// An absent file is a valid outcome (`Ok(None)`): the series is skipped in
/// its panel. A file that exists but cannot be parsed, or that lacks one of
/// `required`, indicates a corrupted measurement and is fatal.
pub fn load(
    run: &Path,
    dataset: &str,
    bucket: &str,
    query: Option<QueryKind>,
    competitor: Competitor,
    required: &[&str],
) -> Result<Option<RunRecord>> {
    let path = result_file(run, dataset, bucket, query, competitor);
    if !path.is_file() {
        debug!(path = %path.display(), "no measurements for series");
        return Ok(None);
    }

    let malformed = |reason: String| ReportError::MalformedResult {
        path: path.clone(),
        reason,
    };

    let df = CsvReader::from_path(&path)
        .map_err(|err| malformed(err.to_string()))?
        .has_header(true)
        .finish()
        .map_err(|err| malformed(err.to_string()))?;
    let record = RunRecord::new(df, path.clone());

    for column in required {
        if !record.has_column(column) {
            return Err(malformed(format!("missing required column `{}`", column)));
        }
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn query_workloads_get_a_query_segment() {
        let path = result_file(
            Path::new("/runs/20230215"),
            "kuniform",
            "5",
            Some(QueryKind::Correlated),
            Competitor::Memento,
        );
        assert_eq!(
            path,
            Path::new("/runs/20230215/kuniform/5_qcorrelated/memento.csv")
        );
    }

    #[test]
    fn queryless_workloads_omit_the_segment() {
        let path = result_file(
            Path::new("/runs/20230215"),
            "books",
            "5M",
            None,
            Competitor::NoFilter,
        );
        assert_eq!(path, Path::new("/runs/20230215/books/5M/none.csv"));
    }

    #[test]
    fn absent_file_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = load(
            tmp.path(),
            "kuniform",
            "0",
            Some(QueryKind::Uniform),
            Competitor::Snarf,
            &["bpk"],
        )
        .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn parses_existing_series() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("kuniform").join("10_quniform");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("grafite.csv"),
            "bpk,n_queries,false_positives\n10,1000,5\n12,1000,3\n",
        )
        .unwrap();

        let record = load(
            tmp.path(),
            "kuniform",
            "10",
            Some(QueryKind::Uniform),
            Competitor::Grafite,
            &["bpk", "n_queries", "false_positives"],
        )
        .unwrap()
        .expect("series should load");

        assert_eq!(record.height(), 2);
        assert_eq!(record.column_f64("bpk").unwrap(), vec![10.0, 12.0]);
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("kuniform").join("0_qtrue");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("surf.csv"), "bpk,query_time\n10,2.5\n").unwrap();

        let err = load(
            tmp.path(),
            "kuniform",
            "0",
            Some(QueryKind::True),
            Competitor::Surf,
            &["bpk", "query_time", "n_queries"],
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::MalformedResult { .. }));
    }
}
