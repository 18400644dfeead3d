use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::{ReportError, Result};

/// One parsed result CSV for a single (competitor, workload) pair, kept in
/// column-addressable form.
///
/// The harness writes counters as integers and timings as floats; every
/// accessor casts to `f64` so derived metrics never care which one a column
/// happened to be.
pub struct RunRecord {
    df: DataFrame,
    path: PathBuf,
}

impl RunRecord {
    pub fn new(df: DataFrame, path: PathBuf) -> Self {
        Self { df, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|col| *col == name)
    }

    /// Extract a column as `Vec<f64>`. Unparseable cells surface as NaN and
    /// flow through the derived metrics unmasked.
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>> {
        let series = self
            .df
            .column(name)
            .map_err(|_| self.malformed(format!("missing column `{}`", name)))?;
        let cast = series
            .cast(&DataType::Float64)
            .map_err(|err| self.malformed(format!("column `{}` is not numeric: {}", name, err)))?;
        let values = cast
            .f64()
            .map_err(|err| self.malformed(format!("column `{}` is not numeric: {}", name, err)))?;
        Ok(values
            .into_iter()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect())
    }

    /// First row of a column, for single-measurement records.
    pub fn first_f64(&self, name: &str) -> Result<f64> {
        self.column_f64(name)?
            .first()
            .copied()
            .ok_or_else(|| self.malformed(format!("column `{}` has no rows", name)))
    }

    pub fn mean(&self, name: &str) -> Result<f64> {
        let values = self.column_f64(name)?;
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    fn malformed(&self, reason: String) -> ReportError {
        ReportError::MalformedResult {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunRecord {
        let df = DataFrame::new(vec![
            Series::new("bpk", vec![10.0f64, 12.0]),
            Series::new("false_positives", vec![5i64, 7]),
        ])
        .unwrap();
        RunRecord::new(df, PathBuf::from("memento.csv"))
    }

    #[test]
    fn integer_columns_cast_to_f64() {
        let rec = record();
        assert_eq!(rec.column_f64("false_positives").unwrap(), vec![5.0, 7.0]);
    }

    #[test]
    fn missing_column_is_malformed() {
        let rec = record();
        let err = rec.column_f64("n_queries").unwrap_err();
        assert!(matches!(err, ReportError::MalformedResult { .. }));
    }

    #[test]
    fn first_f64_on_empty_column_is_malformed() {
        let df = DataFrame::new(vec![Series::new("bpk", Vec::<f64>::new())]).unwrap();
        let rec = RunRecord::new(df, PathBuf::from("empty.csv"));
        assert!(rec.first_f64("bpk").is_err());
    }

    #[test]
    fn mean_averages_all_rows() {
        let rec = record();
        assert_eq!(rec.mean("bpk").unwrap(), 11.0);
    }
}
