use growsync_api::StatSummary;

/// Streaming (min, max, avg, count) state for one sensor family of one
/// (plant, date) row.
///
/// The daily-log table stores only the triple; the count is implicit. When
/// folding continues across requests the caller seeds the count from the
/// row's `readings_count` bookkeeping, which weights the running average
/// the same way the stored schema always has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: i64,
}

impl Aggregate {
    pub fn empty() -> Self {
        Self {
            min: None,
            max: None,
            avg: None,
            count: 0,
        }
    }

    /// Rebuilds the state from stored columns. A row with data but a zero
    /// seed (legacy rows) still counts as one observation.
    pub fn from_parts(min: Option<f64>, max: Option<f64>, avg: Option<f64>, seed_count: i64) -> Self {
        let count = if min.is_none() { 0 } else { seed_count.max(1) };

        Self {
            min,
            max,
            avg,
            count,
        }
    }

    /// Folds one reading in. No prior readings (min is NULL) collapses to
    /// (v, v, v, 1); otherwise min/max by comparison and the average by
    /// `(avg * count + v) / (count + 1)`. No rounding is applied here;
    /// read-side report generation owns presentation.
    pub fn fold(self, value: f64) -> Self {
        match (self.min, self.max, self.avg) {
            (Some(min), Some(max), Some(avg)) => Self {
                min: Some(min.min(value)),
                max: Some(max.max(value)),
                avg: Some((avg * self.count as f64 + value) / (self.count as f64 + 1.0)),
                count: self.count + 1,
            },
            _ => Self {
                min: Some(value),
                max: Some(value),
                avg: Some(value),
                count: 1,
            },
        }
    }

    /// Absent readings are skipped without altering the count.
    pub fn fold_opt(self, value: Option<f64>) -> Self {
        match value {
            Some(value) => self.fold(value),
            None => self,
        }
    }

    /// Merges a daily-report chunk's pre-aggregated triple: min-of-mins,
    /// max-of-maxes, and the chunk average folded through the running
    /// average as a single observation (chunks do not carry their own
    /// counts).
    pub fn merge_chunk(mut self, chunk: StatSummary) -> Self {
        if let Some(value) = chunk.min {
            self.min = Some(self.min.map_or(value, |current| current.min(value)));
        }
        if let Some(value) = chunk.max {
            self.max = Some(self.max.map_or(value, |current| current.max(value)));
        }
        if let Some(value) = chunk.avg {
            self.avg = match self.avg {
                Some(avg) if self.count > 0 => {
                    Some((avg * self.count as f64 + value) / (self.count as f64 + 1.0))
                }
                _ => Some(value),
            };
            self.count += 1;
        }

        self
    }
}

/// Light-cycle running totals for a (plant, date) row. Totals accumulate
/// by addition across chunks; longest/shortest track global extrema, not
/// per-chunk ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTotals {
    pub total_seconds: i64,
    pub cycles: i32,
    pub longest_seconds: Option<i64>,
    pub shortest_seconds: Option<i64>,
}

impl LightTotals {
    pub fn from_parts(
        total_seconds: Option<i64>,
        cycles: Option<i32>,
        longest_seconds: Option<i64>,
        shortest_seconds: Option<i64>,
    ) -> Self {
        Self {
            total_seconds: total_seconds.unwrap_or(0),
            cycles: cycles.unwrap_or(0),
            longest_seconds,
            shortest_seconds,
        }
    }

    pub fn add_period(&mut self, duration_seconds: i64) {
        self.total_seconds += duration_seconds;
        self.cycles += 1;
        self.longest_seconds = Some(
            self.longest_seconds
                .map_or(duration_seconds, |longest| longest.max(duration_seconds)),
        );
        self.shortest_seconds = Some(
            self.shortest_seconds
                .map_or(duration_seconds, |shortest| shortest.min(duration_seconds)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_all(values: &[f64]) -> Aggregate {
        values
            .iter()
            .fold(Aggregate::empty(), |aggregate, value| aggregate.fold(*value))
    }

    #[test]
    fn fold_matches_reference_statistics() {
        let values = [6.0, 6.4, 5.8, 6.1, 5.9];
        let aggregate = fold_all(&values);

        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;

        assert_eq!(aggregate.min, Some(5.8));
        assert_eq!(aggregate.max, Some(6.4));
        assert_eq!(aggregate.count, 5);
        assert!((aggregate.avg.unwrap() - mean).abs() < 1e-9);
    }

    #[test]
    fn fold_is_permutation_invariant() {
        let mut values = vec![7.2, 1.5, 3.3, 9.9, 4.4, 2.8];
        let reference = fold_all(&values);

        for rotation in 1..values.len() {
            values.rotate_left(1);
            let permuted = fold_all(&values);

            assert_eq!(permuted.min, reference.min, "rotation {rotation}");
            assert_eq!(permuted.max, reference.max);
            assert_eq!(permuted.count, reference.count);
            assert!((permuted.avg.unwrap() - reference.avg.unwrap()).abs() < 1e-9);
        }

        values.reverse();
        let reversed = fold_all(&values);
        assert!((reversed.avg.unwrap() - reference.avg.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn first_fold_collapses_to_value() {
        let aggregate = Aggregate::empty().fold(6.2);

        assert_eq!(aggregate.min, Some(6.2));
        assert_eq!(aggregate.max, Some(6.2));
        assert_eq!(aggregate.avg, Some(6.2));
        assert_eq!(aggregate.count, 1);
    }

    #[test]
    fn absent_values_do_not_alter_count() {
        let aggregate = Aggregate::empty().fold(5.0).fold_opt(None).fold(7.0);

        assert_eq!(aggregate.count, 2);
        assert_eq!(aggregate.avg, Some(6.0));
    }

    #[test]
    fn chunk_merge_tracks_extrema_across_chunks() {
        let aggregate = Aggregate::empty()
            .merge_chunk(StatSummary {
                min: Some(5.8),
                max: Some(6.2),
                avg: Some(6.0),
            })
            .merge_chunk(StatSummary {
                min: Some(6.0),
                max: Some(6.6),
                avg: Some(6.4),
            });

        assert_eq!(aggregate.min, Some(5.8));
        assert_eq!(aggregate.max, Some(6.6));
        assert!((aggregate.avg.unwrap() - 6.2).abs() < 1e-9);
        assert_eq!(aggregate.count, 2);
    }

    #[test]
    fn partial_chunk_legs_merge_independently() {
        let aggregate = Aggregate::empty().merge_chunk(StatSummary {
            min: Some(400.0),
            max: None,
            avg: None,
        });

        assert_eq!(aggregate.min, Some(400.0));
        assert_eq!(aggregate.max, None);
        assert_eq!(aggregate.count, 0);
    }

    #[test]
    fn light_totals_accumulate_and_track_extrema() {
        let mut totals = LightTotals::from_parts(None, None, None, None);
        totals.add_period(3600);
        totals.add_period(7200);

        // A second chunk keeps adding to the same day.
        totals.add_period(1800);

        assert_eq!(totals.total_seconds, 12600);
        assert_eq!(totals.cycles, 3);
        assert_eq!(totals.longest_seconds, Some(7200));
        assert_eq!(totals.shortest_seconds, Some(1800));
    }
}
