use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Benchmark categories, one results subtree each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    FprSynth,
    FprReal,
    ConstructionTime,
    TruePositive,
    Correlation,
    Expansion,
    BTree,
}

impl Category {
    /// Directory name used by the benchmark harness under the results root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::FprSynth => "fpr_test",
            Category::FprReal => "fpr_real_test",
            Category::ConstructionTime => "constr_time_test",
            Category::TruePositive => "true_test",
            Category::Correlation => "corr_test",
            Category::Expansion => "expansion_test",
            Category::BTree => "b_tree_test",
        }
    }
}

/// Find the most recent run directory for a category.
///
/// Run directories are timestamp-named, so descending lexicographic order
/// is recency order and no timestamp parsing is needed.
pub fn resolve_latest_run(root: &Path, category: Category) -> Result<PathBuf> {
    let base = root.join(category.dir_name());
    let missing = || ReportError::MissingRunDirectory {
        category: category.dir_name(),
        path: base.clone(),
    };

    let entries = match fs::read_dir(&base) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(missing()),
        Err(err) => return Err(err.into()),
    };

    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            runs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    runs.sort();

    match runs.pop() {
        Some(latest) => Ok(base.join(latest)),
        None => Err(missing()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_recent_run_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        for run in ["20230101", "20230215", "20220101"] {
            fs::create_dir_all(tmp.path().join("corr_test").join(run)).unwrap();
        }

        let resolved = resolve_latest_run(tmp.path(), Category::Correlation).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "20230215");
    }

    #[test]
    fn empty_category_is_missing_run_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("fpr_test")).unwrap();

        let err = resolve_latest_run(tmp.path(), Category::FprSynth).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingRunDirectory { category: "fpr_test", .. }
        ));
    }

    #[test]
    fn absent_category_is_missing_run_directory() {
        let tmp = tempfile::tempdir().unwrap();

        let err = resolve_latest_run(tmp.path(), Category::BTree).unwrap_err();
        assert!(matches!(err, ReportError::MissingRunDirectory { .. }));
    }

    #[test]
    fn ignores_stray_files_among_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("true_test");
        fs::create_dir_all(base.join("20240301")).unwrap();
        fs::write(base.join("99_notes.txt"), "scratch").unwrap();

        let resolved = resolve_latest_run(tmp.path(), Category::TruePositive).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "20240301");
    }
}
