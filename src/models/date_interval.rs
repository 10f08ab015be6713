//! Inclusive date intervals.
//!
//! Most of the engine reasons about closed ranges of calendar days:
//! contract durations, absence periods, meal ticket validity windows.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A closed range of days, both ends included.
///
/// # Example
///
/// ```
/// use epas_engine::models::DateInterval;
/// use chrono::NaiveDate;
///
/// let interval = DateInterval::new(
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
/// ).unwrap();
///
/// assert_eq!(interval.day_in_interval(), 31);
/// assert!(interval.contains(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    /// The first day of the interval.
    pub begin: NaiveDate,
    /// The last day of the interval.
    pub end: NaiveDate,
}

impl DateInterval {
    /// Creates an interval, rejecting ranges whose begin is after the end.
    pub fn new(begin: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if begin > end {
            return Err(EngineError::InvalidPeriod {
                from: begin,
                to: end,
                message: "begin date is after end date".to_string(),
            });
        }
        Ok(Self { begin, end })
    }

    /// The calendar year `year`.
    pub fn year(year: i32) -> Self {
        Self {
            begin: first_day_of_year(year),
            end: last_day_of_year(year),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        Self {
            begin: first_day_of_month(date),
            end: last_day_of_month(date),
        }
    }

    /// Returns true if `date` falls within the interval.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.begin && date <= self.end
    }

    /// Number of days covered by the interval.
    pub fn day_in_interval(&self) -> i64 {
        (self.end - self.begin).num_days() + 1
    }

    /// The common part of two intervals, if any.
    pub fn intersect(&self, other: &DateInterval) -> Option<DateInterval> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        if begin > end {
            None
        } else {
            Some(DateInterval { begin, end })
        }
    }

    /// Iterates all the days of the interval in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.begin.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// January 1st of `year`.
pub fn first_day_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// December 31st of `year`.
pub fn last_day_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// The first day of the month of `date`.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The last day of the month of `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Number of days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> i64 {
    DateInterval::year(year).day_in_interval()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_interval() {
        let result = DateInterval::new(date(2025, 2, 1), date(2025, 1, 1));
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_single_day_interval() {
        let interval = DateInterval::new(date(2025, 5, 5), date(2025, 5, 5)).unwrap();
        assert_eq!(interval.day_in_interval(), 1);
        assert_eq!(interval.days().count(), 1);
    }

    #[test]
    fn test_year_interval_handles_leap_years() {
        assert_eq!(DateInterval::year(2024).day_in_interval(), 366);
        assert_eq!(days_in_year(2025), 365);
    }

    #[test]
    fn test_month_of_february() {
        let feb = DateInterval::month_of(date(2024, 2, 10));
        assert_eq!(feb.begin, date(2024, 2, 1));
        assert_eq!(feb.end, date(2024, 2, 29));
    }

    #[test]
    fn test_last_day_of_december() {
        assert_eq!(last_day_of_month(date(2025, 12, 3)), date(2025, 12, 31));
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = DateInterval::new(date(2025, 1, 1), date(2025, 6, 30)).unwrap();
        let b = DateInterval::new(date(2025, 3, 1), date(2025, 12, 31)).unwrap();
        let common = a.intersect(&b).unwrap();
        assert_eq!(common.begin, date(2025, 3, 1));
        assert_eq!(common.end, date(2025, 6, 30));
    }

    #[test]
    fn test_intersect_disjoint() {
        let a = DateInterval::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        let b = DateInterval::new(date(2025, 2, 1), date(2025, 2, 28)).unwrap();
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn test_contains_bounds() {
        let interval = DateInterval::new(date(2025, 1, 10), date(2025, 1, 20)).unwrap();
        assert!(interval.contains(date(2025, 1, 10)));
        assert!(interval.contains(date(2025, 1, 20)));
        assert!(!interval.contains(date(2025, 1, 21)));
        assert!(!interval.contains(date(2025, 1, 9)));
    }
}
