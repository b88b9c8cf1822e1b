use crate::utils::constants::{
    DAYS_PER_WEEK, SLOTS_PER_DAY, SLOT_HOURS, VAR_DAILY, VAR_INSTANT, VAR_WEEKLY,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accumulation tier, parameterising how sources are grouped into periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodTier {
    /// Four six-hour instants per calendar day
    Daily,
    /// Seven daily totals per week ending on `week_end`
    Weekly { week_end: Weekday },
}

impl PeriodTier {
    /// Period a source timestamp belongs to, with its sub-period slot index
    pub fn assign(&self, timestamp: NaiveDateTime) -> (AccumulationPeriod, usize) {
        match self {
            PeriodTier::Daily => {
                let slot = (timestamp.hour() / SLOT_HOURS) as usize;
                (AccumulationPeriod::Day(timestamp.date()), slot)
            }
            PeriodTier::Weekly { week_end } => {
                let date = timestamp.date();
                let ending = week_ending_on_or_after(date, *week_end);
                let slot = DAYS_PER_WEEK - 1 - (ending - date).num_days() as usize;
                (AccumulationPeriod::Week { ending }, slot)
            }
        }
    }

    pub fn required_sub_periods(&self) -> usize {
        match self {
            PeriodTier::Daily => SLOTS_PER_DAY,
            PeriodTier::Weekly { .. } => DAYS_PER_WEEK,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PeriodTier::Daily => "daily",
            PeriodTier::Weekly { .. } => "weekly",
        }
    }

    /// Name of the variable produced at this tier
    pub fn variable(&self) -> &'static str {
        match self {
            PeriodTier::Daily => VAR_DAILY,
            PeriodTier::Weekly { .. } => VAR_WEEKLY,
        }
    }

    /// Name of the variable consumed at this tier
    pub fn input_variable(&self) -> &'static str {
        match self {
            PeriodTier::Daily => VAR_INSTANT,
            PeriodTier::Weekly { .. } => VAR_DAILY,
        }
    }
}

/// A half-open calendar window over which sources are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccumulationPeriod {
    Day(NaiveDate),
    /// The seven days ending on (and including) `ending`
    Week { ending: NaiveDate },
}

impl AccumulationPeriod {
    pub fn tier(&self) -> PeriodTier {
        match self {
            AccumulationPeriod::Day(_) => PeriodTier::Daily,
            AccumulationPeriod::Week { ending } => PeriodTier::Weekly {
                week_end: ending.weekday(),
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            AccumulationPeriod::Day(date) => date.format("%Y-%m-%d").to_string(),
            AccumulationPeriod::Week { ending } => format!(
                "{}..{}",
                (*ending - Duration::days(DAYS_PER_WEEK as i64 - 1)).format("%Y-%m-%d"),
                ending.format("%Y-%m-%d")
            ),
        }
    }
}

impl fmt::Display for AccumulationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.tier().name())
    }
}

/// First date on or after `date` falling on `week_end`
pub fn week_ending_on_or_after(date: NaiveDate, week_end: Weekday) -> NaiveDate {
    let ahead = (7 + week_end.num_days_from_monday() as i64
        - date.weekday().num_days_from_monday() as i64)
        % 7;
    date + Duration::days(ahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_slots() {
        let tier = PeriodTier::Daily;
        let day = date(2026, 2, 13);

        for (hour, slot) in [(0, 0), (5, 0), (6, 1), (12, 2), (18, 3), (23, 3)] {
            let ts = day.and_hms_opt(hour, 0, 0).unwrap();
            assert_eq!(tier.assign(ts), (AccumulationPeriod::Day(day), slot));
        }
    }

    #[test]
    fn test_weekly_slots() {
        // 2026-02-15 is a Sunday
        let tier = PeriodTier::Weekly {
            week_end: Weekday::Sun,
        };
        let ending = date(2026, 2, 15);

        let monday = date(2026, 2, 9).and_hms_opt(0, 0, 0).unwrap();
        let sunday = ending.and_hms_opt(0, 0, 0).unwrap();
        let next_monday = date(2026, 2, 16).and_hms_opt(0, 0, 0).unwrap();

        assert_eq!(tier.assign(monday), (AccumulationPeriod::Week { ending }, 0));
        assert_eq!(tier.assign(sunday), (AccumulationPeriod::Week { ending }, 6));
        assert_eq!(
            tier.assign(next_monday).0,
            AccumulationPeriod::Week {
                ending: date(2026, 2, 22)
            }
        );
    }

    #[test]
    fn test_period_labels() {
        let week = AccumulationPeriod::Week {
            ending: date(2026, 2, 15),
        };
        assert_eq!(week.label(), "2026-02-09..2026-02-15");
        assert_eq!(week.tier(), PeriodTier::Weekly { week_end: Weekday::Sun });

        let day = AccumulationPeriod::Day(date(2026, 2, 13));
        assert_eq!(day.to_string(), "2026-02-13 (daily)");
    }

    #[test]
    fn test_week_ending_on_or_after() {
        assert_eq!(week_ending_on_or_after(date(2026, 2, 15), Weekday::Sun), date(2026, 2, 15));
        assert_eq!(week_ending_on_or_after(date(2026, 2, 16), Weekday::Sun), date(2026, 2, 22));
        assert_eq!(week_ending_on_or_after(date(2026, 2, 13), Weekday::Sat), date(2026, 2, 14));
    }
}
