//! Derived per-record metrics.
//!
//! Every function here is pure over one [`RunRecord`]: raw cumulative
//! counters in, normalized metrics out. Per-operation costs always divide a
//! cumulative time by a cumulative operation count, never by a record
//! count. Zero denominators are not guarded; the resulting non-finite
//! values propagate and show up as gaps in the rendered figures.

use crate::data::columnar::RunRecord;
use crate::error::Result;

/// Row-wise false-positive rate: `false_positives / n_queries`.
pub fn fpr(record: &RunRecord) -> Result<Vec<f64>> {
    let false_positives = record.column_f64("false_positives")?;
    let n_queries = record.column_f64("n_queries")?;
    Ok(false_positives
        .iter()
        .zip(&n_queries)
        .map(|(fp, nq)| fp / nq)
        .collect())
}

/// False-positive rate of the first measurement row.
pub fn first_fpr(record: &RunRecord) -> Result<f64> {
    Ok(record.first_f64("false_positives")? / record.first_f64("n_queries")?)
}

/// Row-wise per-operation cost: `time / count * scale`.
///
/// The harness records times in milliseconds, so `scale` is `1e6` for
/// ns/op and `1e3` for us/op.
pub fn per_op_time(
    record: &RunRecord,
    time_col: &str,
    count_col: &str,
    scale: f64,
) -> Result<Vec<f64>> {
    let time = record.column_f64(time_col)?;
    let count = record.column_f64(count_col)?;
    Ok(time
        .iter()
        .zip(&count)
        .map(|(t, n)| t / n * scale)
        .collect())
}

/// Per-operation cost of the first measurement row.
pub fn first_per_op_time(
    record: &RunRecord,
    time_col: &str,
    count_col: &str,
    scale: f64,
) -> Result<f64> {
    Ok(record.first_f64(time_col)? / record.first_f64(count_col)? * scale)
}

/// Construction cost in ns/key: `mean(time_col) / n_keys * 1e6`.
pub fn per_key_time(record: &RunRecord, time_col: &str) -> Result<f64> {
    Ok(record.mean(time_col)? / record.first_f64("n_keys")? * 1e6)
}

/// Indices of an indexed column family, ending at the first index for which
/// any of the family's columns is absent.
///
/// Expansion and fraction sequences are variable-length per competitor;
/// terminating at the first gap (instead of padding to a fixed width) is
/// what keeps short sequences short.
fn family_indices<'a, F>(record: &'a RunRecord, columns: F) -> impl Iterator<Item = usize> + 'a
where
    F: Fn(usize) -> Vec<String> + 'a,
{
    (0..).take_while(move |&i| columns(i).iter().all(|col| record.has_column(col)))
}

/// False-positive rate after each expansion step:
/// `false_positives_i / n_queries_i`.
pub fn expansion_fpr(record: &RunRecord) -> Result<Vec<f64>> {
    family_indices(record, |i| {
        vec![format!("false_positives_{}", i), format!("n_queries_{}", i)]
    })
    .map(|i| {
        Ok(record.first_f64(&format!("false_positives_{}", i))?
            / record.first_f64(&format!("n_queries_{}", i))?)
    })
    .collect()
}

/// Insert cost of each expansion step in ns/insert. Each expansion
/// re-inserts half the keys present afterwards, hence the `n_keys_i / 2`
/// denominator.
pub fn expansion_insert_cost(record: &RunRecord) -> Result<Vec<f64>> {
    family_indices(record, |i| {
        vec![format!("expansion_time_{}", i), format!("n_keys_{}", i)]
    })
    .map(|i| {
        let time = record.first_f64(&format!("expansion_time_{}", i))?;
        let keys = record.first_f64(&format!("n_keys_{}", i))?;
        Ok(time / (keys / 2.0) * 1e6)
    })
    .collect()
}

/// B-tree write cost per dataset-doubling step, in us/insert. Step 0 is
/// the initial bulk build, which has no expansion cost.
pub fn btree_write_cost(record: &RunRecord) -> Result<Vec<f64>> {
    let mut costs = vec![0.0];
    for i in family_indices(record, |i| {
        vec![
            format!("expansion_time_{}", i),
            format!("n_keys_{}_frac_0", i),
        ]
    }) {
        let time = record.first_f64(&format!("expansion_time_{}", i))?;
        let keys = record.first_f64(&format!("n_keys_{}_frac_0", i))?;
        costs.push(time / keys / 2.0 * 1e3);
    }
    Ok(costs)
}

/// B-tree read cost at one expansion step, one value per non-empty-query
/// fraction, in us/query.
pub fn btree_read_cost(record: &RunRecord, step: usize) -> Result<Vec<f64>> {
    family_indices(record, move |j| {
        vec![
            format!("query_time_{}_frac_{}", step, j),
            format!("n_queries_{}_frac_{}", step, j),
        ]
    })
    .map(|j| {
        let time = record.first_f64(&format!("query_time_{}_frac_{}", step, j))?;
        let queries = record.first_f64(&format!("n_queries_{}_frac_{}", step, j))?;
        Ok(time / queries * 1e3)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::path::PathBuf;

    fn record(columns: Vec<Series>) -> RunRecord {
        RunRecord::new(DataFrame::new(columns).unwrap(), PathBuf::from("test.csv"))
    }

    #[test]
    fn fpr_is_false_positives_over_queries() {
        let rec = record(vec![
            Series::new("false_positives", vec![5i64]),
            Series::new("n_queries", vec![10i64]),
        ]);
        assert_eq!(fpr(&rec).unwrap(), vec![0.5]);
    }

    #[test]
    fn fpr_stays_in_unit_interval_for_sane_counts() {
        let rec = record(vec![
            Series::new("false_positives", vec![0i64, 250, 1000]),
            Series::new("n_queries", vec![1000i64, 1000, 1000]),
        ]);
        for value in fpr(&rec).unwrap() {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn per_op_time_is_linear_in_scale() {
        let rec = record(vec![
            Series::new("query_time", vec![4.0f64]),
            Series::new("n_queries", vec![1000i64]),
        ]);
        let at_1e6 = per_op_time(&rec, "query_time", "n_queries", 1e6).unwrap();
        let at_5e5 = per_op_time(&rec, "query_time", "n_queries", 5e5).unwrap();
        assert_eq!(at_1e6[0], 2.0 * at_5e5[0]);
    }

    #[test]
    fn zero_denominator_propagates_as_non_finite() {
        let rec = record(vec![
            Series::new("false_positives", vec![5i64]),
            Series::new("n_queries", vec![0i64]),
        ]);
        assert!(!fpr(&rec).unwrap()[0].is_finite());
    }

    #[test]
    fn per_key_time_divides_mean_build_time_by_key_count() {
        let rec = record(vec![
            Series::new("build_time", vec![2.0f64, 4.0]),
            Series::new("n_keys", vec![1_000_000i64, 1_000_000]),
        ]);
        // mean 3ms over 1e6 keys -> 3 ns/key
        assert_eq!(per_key_time(&rec, "build_time").unwrap(), 3.0);
    }

    #[test]
    fn expansion_family_stops_at_first_gap() {
        let mut columns = Vec::new();
        for i in 0..3 {
            columns.push(Series::new(&format!("false_positives_{}", i), vec![10i64]));
            columns.push(Series::new(&format!("n_queries_{}", i), vec![100i64]));
        }
        // index 4 present but 3 absent: iteration must not reach it
        columns.push(Series::new("false_positives_4", vec![10i64]));
        columns.push(Series::new("n_queries_4", vec![100i64]));
        let rec = record(columns);

        let values = expansion_fpr(&rec).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| *v == 0.1));
    }

    #[test]
    fn expansion_insert_cost_halves_the_key_count() {
        let rec = record(vec![
            Series::new("expansion_time_0", vec![1.0f64]),
            Series::new("n_keys_0", vec![2_000_000i64]),
        ]);
        // 1ms over 1e6 re-inserted keys -> 1 ns/insert
        assert_eq!(expansion_insert_cost(&rec).unwrap(), vec![1.0]);
    }

    #[test]
    fn btree_write_cost_leads_with_the_free_build_step() {
        let rec = record(vec![
            Series::new("build_time", vec![7.0f64]),
            Series::new("expansion_time_0", vec![2.0f64]),
            Series::new("n_keys_0_frac_0", vec![1000i64]),
        ]);
        assert_eq!(btree_write_cost(&rec).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn btree_read_cost_walks_the_fraction_family() {
        let rec = record(vec![
            Series::new("query_time_1_frac_0", vec![2.0f64]),
            Series::new("n_queries_1_frac_0", vec![1000i64]),
            Series::new("query_time_1_frac_1", vec![4.0f64]),
            Series::new("n_queries_1_frac_1", vec![1000i64]),
        ]);
        assert_eq!(btree_read_cost(&rec, 1).unwrap(), vec![2.0, 4.0]);
        assert!(btree_read_cost(&rec, 0).unwrap().is_empty());
    }
}
