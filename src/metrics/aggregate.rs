use ordered_float::OrderedFloat;

use crate::config::Competitor;

/// One ranked competitor: mean of its aggregated metric and the ratio of
/// that mean to the baseline's.
#[derive(Clone, Debug)]
pub struct RankedRow {
    pub competitor: Competitor,
    pub mean: f64,
    pub ratio: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Collapse repeated measurements of one (workload-row, competitor) pair
/// into their mean, rounded for display stability.
pub fn aggregate(values: &[f64]) -> f64 {
    round_to(mean(values), 2)
}

/// Rank competitors against the baseline.
///
/// `rows` carries one aggregated mean per competitor, in lineup order; the
/// first entry is the baseline. The baseline is pinned to the head of the
/// ranking regardless of its ratio (which is always 1), the rest sort
/// ascending by mean. Ratios are baseline-relative because absolute numbers
/// are not comparable across workloads with different scales.
pub fn rank(rows: &[(Competitor, f64)]) -> Vec<RankedRow> {
    let (baseline, baseline_mean) = match rows.first() {
        Some(&head) => head,
        None => return Vec::new(),
    };

    let mut rest: Vec<RankedRow> = rows[1..]
        .iter()
        .map(|&(competitor, mean)| RankedRow {
            competitor,
            mean,
            ratio: round_to(mean / baseline_mean, 2),
        })
        .collect();
    rest.sort_by_key(|row| OrderedFloat(row.mean));

    let mut ranked = vec![RankedRow {
        competitor: baseline,
        mean: baseline_mean,
        ratio: 1.0,
    }];
    ranked.extend(rest);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_is_order_independent() {
        let forward = aggregate(&[1.0, 2.0, 4.0]);
        let shuffled = aggregate(&[4.0, 1.0, 2.0]);
        assert_eq!(forward, shuffled);
        assert_eq!(forward, 2.33);
    }

    #[test]
    fn rank_pins_the_baseline_first() {
        let ranked = rank(&[
            (Competitor::Memento, 100.0),
            (Competitor::Snarf, 200.0),
            (Competitor::Surf, 50.0),
        ]);

        let order: Vec<Competitor> = ranked.iter().map(|row| row.competitor).collect();
        assert_eq!(
            order,
            vec![Competitor::Memento, Competitor::Surf, Competitor::Snarf]
        );
        assert_eq!(ranked[0].ratio, 1.0);
        assert_eq!(ranked[1].ratio, 0.5);
        assert_eq!(ranked[2].ratio, 2.0);
    }

    #[test]
    fn rank_of_nothing_is_empty() {
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn round_to_fixes_display_precision() {
        assert_eq!(round_to(2.345_678, 2), 2.35);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
