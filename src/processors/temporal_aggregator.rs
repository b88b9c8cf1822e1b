use crate::error::{ProcessingError, Result};
use crate::models::{AccumulatedGrid, AccumulationPeriod, GeoGrid, PeriodTier, SourceArtifact};
use std::collections::BTreeMap;

/// Where a period stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodState {
    /// Some expected sub-periods have no backing artifact yet
    Incomplete { present: usize, required: usize },
    /// Every sub-period is present and no output exists
    Ready,
    /// The output artifact already exists
    Done,
}

/// Grouping of the available sources for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodPlan {
    pub period: AccumulationPeriod,
    pub state: PeriodState,
    /// One source per filled sub-period, chronological
    pub sources: Vec<SourceArtifact>,
    /// Later sources claiming an already filled sub-period
    pub duplicates: Vec<SourceArtifact>,
}

impl PeriodPlan {
    pub fn is_ready(&self) -> bool {
        self.state == PeriodState::Ready
    }
}

/// Group `sources` into the periods of `tier` and classify each period.
///
/// Pure: the only outside knowledge is `is_done`, which reports whether a
/// period's output artifact exists. Plans come back in period order.
pub fn plan_periods<F>(tier: PeriodTier, sources: &[SourceArtifact], is_done: F) -> Vec<PeriodPlan>
where
    F: Fn(&AccumulationPeriod) -> bool,
{
    let mut ordered: Vec<&SourceArtifact> = sources.iter().collect();
    ordered.sort();

    let mut slots: BTreeMap<AccumulationPeriod, BTreeMap<usize, SourceArtifact>> = BTreeMap::new();
    let mut duplicates: BTreeMap<AccumulationPeriod, Vec<SourceArtifact>> = BTreeMap::new();

    for source in ordered {
        let (period, slot) = tier.assign(source.timestamp);
        let period_slots = slots.entry(period).or_default();
        if period_slots.contains_key(&slot) {
            duplicates.entry(period).or_default().push(source.clone());
        } else {
            period_slots.insert(slot, source.clone());
        }
    }

    let required = tier.required_sub_periods();
    slots
        .into_iter()
        .map(|(period, filled)| {
            let state = if is_done(&period) {
                PeriodState::Done
            } else if filled.len() == required {
                PeriodState::Ready
            } else {
                PeriodState::Incomplete {
                    present: filled.len(),
                    required,
                }
            };
            PeriodPlan {
                period,
                state,
                sources: filled.into_values().collect(),
                duplicates: duplicates.remove(&period).unwrap_or_default(),
            }
        })
        .collect()
}

/// Sum same-grid inputs cell by cell, ignoring missing values.
///
/// A cell is missing in the output only when it is missing in every input;
/// otherwise it holds the sum of the inputs that are present. Inputs are
/// accumulated in the order given.
pub fn reduce_with_validity_mask(grids: &[&GeoGrid]) -> Result<GeoGrid> {
    let (first, rest) = grids
        .split_first()
        .ok_or_else(|| ProcessingError::MissingData("no grids to reduce".to_string()))?;
    for grid in rest {
        first.ensure_same_coordinates(grid)?;
    }

    let cells = first.values().len();
    let mut sum = vec![0.0f64; cells];
    let mut valid_count = vec![0u32; cells];

    for grid in grids {
        for (i, value) in grid.values().iter().enumerate() {
            if !value.is_nan() {
                sum[i] += value;
                valid_count[i] += 1;
            }
        }
    }

    let values = sum
        .into_iter()
        .zip(valid_count)
        .map(|(s, n)| if n > 0 { s } else { f64::NAN })
        .collect();

    GeoGrid::new(first.lat().to_vec(), first.lon().to_vec(), values)
}

/// Reduces complete periods of one tier.
pub struct TemporalAggregator {
    tier: PeriodTier,
}

impl TemporalAggregator {
    pub fn new(tier: PeriodTier) -> Self {
        Self { tier }
    }

    pub fn tier(&self) -> PeriodTier {
        self.tier
    }

    pub fn plan<F>(&self, sources: &[SourceArtifact], is_done: F) -> Vec<PeriodPlan>
    where
        F: Fn(&AccumulationPeriod) -> bool,
    {
        plan_periods(self.tier, sources, is_done)
    }

    /// Reduce a complete period. `inputs` pairs each source name with its
    /// grid, in chronological order.
    pub fn accumulate(
        &self,
        period: AccumulationPeriod,
        inputs: &[(String, GeoGrid)],
    ) -> Result<AccumulatedGrid> {
        let required = self.tier.required_sub_periods();
        if inputs.len() != required {
            return Err(ProcessingError::MissingData(format!(
                "{} needs {} inputs, got {}",
                period,
                required,
                inputs.len()
            )));
        }

        let grids: Vec<&GeoGrid> = inputs.iter().map(|(_, grid)| grid).collect();
        let grid = reduce_with_validity_mask(&grids)?;

        Ok(AccumulatedGrid {
            period,
            sources: inputs.iter().map(|(name, _)| name.clone()).collect(),
            grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
    use std::path::PathBuf;

    const NAN: f64 = f64::NAN;

    fn grid(values: Vec<f64>) -> GeoGrid {
        GeoGrid::new(vec![40.0], (0..values.len()).map(|i| i as f64).collect(), values).unwrap()
    }

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn source(day: u32, hour: u32) -> SourceArtifact {
        SourceArtifact::new(
            ts(day, hour),
            PathBuf::from(format!("GLD_RNN6H_202602{:02}_{:02}00.tif", day, hour)),
        )
    }

    fn assert_values(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a.is_nan() && e.is_nan()) || a == e,
                "{:?} != {:?}",
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_reduction_sums_available_values() {
        let inputs = [
            grid(vec![2.0, NAN, 1.0]),
            grid(vec![NAN, NAN, 1.0]),
            grid(vec![3.0, NAN, NAN]),
            grid(vec![NAN, NAN, 0.0]),
        ];
        let refs: Vec<&GeoGrid> = inputs.iter().collect();

        let reduced = reduce_with_validity_mask(&refs).unwrap();
        assert_values(reduced.values(), &[5.0, NAN, 2.0]);
        assert_eq!(reduced.lat(), inputs[0].lat());
        assert_eq!(reduced.lon(), inputs[0].lon());
    }

    #[test]
    fn test_valid_zero_is_not_missing() {
        let inputs = [grid(vec![0.0]), grid(vec![NAN])];
        let refs: Vec<&GeoGrid> = inputs.iter().collect();
        assert_values(reduce_with_validity_mask(&refs).unwrap().values(), &[0.0]);
    }

    #[test]
    fn test_reduction_rejects_mismatched_coordinates() {
        let a = grid(vec![1.0, 2.0]);
        let b = GeoGrid::new(vec![41.0], vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let result = reduce_with_validity_mask(&[&a, &b]);
        assert!(matches!(result, Err(ProcessingError::CoordinateMismatch(_))));

        assert!(matches!(
            reduce_with_validity_mask(&[]),
            Err(ProcessingError::MissingData(_))
        ));
    }

    #[test]
    fn test_daily_gating() {
        let sources = vec![source(13, 0), source(13, 6), source(13, 12)];
        let plans = plan_periods(PeriodTier::Daily, &sources, |_| false);

        assert_eq!(plans.len(), 1);
        assert_eq!(
            plans[0].state,
            PeriodState::Incomplete {
                present: 3,
                required: 4
            }
        );

        let mut sources = sources;
        sources.push(source(13, 18));
        let plans = plan_periods(PeriodTier::Daily, &sources, |_| false);
        assert!(plans[0].is_ready());
        assert_eq!(plans[0].sources.len(), 4);

        let plans = plan_periods(PeriodTier::Daily, &sources, |_| true);
        assert_eq!(plans[0].state, PeriodState::Done);
    }

    #[test]
    fn test_plans_are_chronological() {
        let sources = vec![
            source(14, 6),
            source(13, 18),
            source(13, 0),
            source(14, 0),
            source(13, 12),
            source(13, 6),
        ];
        let plans = plan_periods(PeriodTier::Daily, &sources, |_| false);

        assert_eq!(plans.len(), 2);
        assert_eq!(
            plans[0].period,
            AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())
        );
        let hours: Vec<NaiveDateTime> = plans[0].sources.iter().map(|s| s.timestamp).collect();
        assert_eq!(hours, vec![ts(13, 0), ts(13, 6), ts(13, 12), ts(13, 18)]);
        assert!(!plans[1].is_ready());
    }

    #[test]
    fn test_duplicate_slot_keeps_first() {
        let late = SourceArtifact::new(
            ts(13, 0) + Duration::minutes(10),
            PathBuf::from("GLD_RNN6H_20260213_0010.tif"),
        );
        let sources = vec![late.clone(), source(13, 0), source(13, 6)];
        let plans = plan_periods(PeriodTier::Daily, &sources, |_| false);

        assert_eq!(plans[0].sources[0], source(13, 0));
        assert_eq!(plans[0].duplicates, vec![late]);
    }

    #[test]
    fn test_weekly_plan_needs_seven_days() {
        let tier = PeriodTier::Weekly {
            week_end: Weekday::Sun,
        };
        // 2026-02-09 (Mon) ..= 2026-02-15 (Sun)
        let days: Vec<SourceArtifact> = (9..=15)
            .map(|d| SourceArtifact::new(ts(d, 0), PathBuf::from(format!("day{}", d))))
            .collect();

        let plans = plan_periods(tier, &days, |_| false);
        assert_eq!(plans.len(), 1);
        assert!(plans[0].is_ready());

        let missing_one: Vec<SourceArtifact> =
            days.iter().filter(|s| s.timestamp != ts(12, 0)).cloned().collect();
        let plans = plan_periods(tier, &missing_one, |_| false);
        assert_eq!(
            plans[0].state,
            PeriodState::Incomplete {
                present: 6,
                required: 7
            }
        );
    }

    #[test]
    fn test_accumulate_requires_every_input() {
        let aggregator = TemporalAggregator::new(PeriodTier::Daily);
        let period = AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
        let inputs: Vec<(String, GeoGrid)> =
            (0..3).map(|i| (format!("s{}", i), grid(vec![1.0]))).collect();

        assert!(aggregator.accumulate(period, &inputs).is_err());
    }

    #[test]
    fn test_daily_then_weekly_is_transitive() {
        let daily = TemporalAggregator::new(PeriodTier::Daily);
        let weekly = TemporalAggregator::new(PeriodTier::Weekly {
            week_end: Weekday::Sun,
        });

        let mut all_instants = Vec::new();
        let mut days = Vec::new();
        for d in 9..=15 {
            let instants: Vec<(String, GeoGrid)> = (0..4)
                .map(|slot| (format!("{}-{}", d, slot), grid(vec![2.5, 1.0])))
                .collect();
            all_instants.extend(instants.iter().map(|(_, g)| g.clone()));

            let period = AccumulationPeriod::Day(NaiveDate::from_ymd_opt(2026, 2, d).unwrap());
            let day = daily.accumulate(period, &instants).unwrap();
            assert_values(day.grid.values(), &[10.0, 4.0]);
            assert_eq!(day.sources.len(), 4);
            days.push((format!("day{}", d), day.grid));
        }

        let week = weekly
            .accumulate(
                AccumulationPeriod::Week {
                    ending: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
                },
                &days,
            )
            .unwrap();
        assert_values(week.grid.values(), &[70.0, 28.0]);

        let refs: Vec<&GeoGrid> = all_instants.iter().collect();
        let direct = reduce_with_validity_mask(&refs).unwrap();
        assert_values(direct.values(), week.grid.values());
    }
}
