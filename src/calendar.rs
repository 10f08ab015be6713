//! Working calendar abstraction.
//!
//! The engine needs to know, for a person, which days are working days and
//! how many minutes a working day lasts. Where that knowledge lives
//! (working time types, office holidays, personal schedules) is outside
//! the engine, so it is reached through the [`WorkingCalendar`] trait.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::DateInterval;

/// Source of working days and working minutes for one person.
pub trait WorkingCalendar {
    /// Returns true if `date` is not a working day.
    fn is_holiday(&self, date: NaiveDate) -> bool;

    /// Minutes of work expected on `date` (0 on holidays).
    fn work_minutes_on(&self, date: NaiveDate) -> i64;

    /// Number of working days between `from` and `to`, both included.
    fn working_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        match DateInterval::new(from, to) {
            Ok(interval) => interval.days().filter(|d| !self.is_holiday(*d)).count() as i64,
            Err(_) => 0,
        }
    }
}

/// A public holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
}

/// A Monday to Friday calendar with a fixed daily working time.
///
/// # Example
///
/// ```
/// use epas_engine::calendar::{WeekdayCalendar, WorkingCalendar};
/// use chrono::NaiveDate;
///
/// let calendar = WeekdayCalendar::new(432);
/// let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
///
/// assert!(calendar.is_holiday(saturday));
/// assert_eq!(calendar.work_minutes_on(monday), 432);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCalendar {
    /// Minutes of work on a working day.
    pub daily_work_minutes: i64,
    /// Public holidays, keyed by date.
    #[serde(default)]
    pub public_holidays: BTreeMap<NaiveDate, PublicHoliday>,
}

impl WeekdayCalendar {
    /// Creates a calendar with no public holidays.
    pub fn new(daily_work_minutes: i64) -> Self {
        Self {
            daily_work_minutes,
            public_holidays: BTreeMap::new(),
        }
    }

    /// Adds a public holiday.
    pub fn with_holiday(mut self, date: NaiveDate, name: impl Into<String>) -> Self {
        self.public_holidays.insert(
            date,
            PublicHoliday {
                date,
                name: name.into(),
            },
        );
        self
    }

    /// Returns true if `date` is a registered public holiday.
    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.public_holidays.contains_key(&date)
    }
}

impl WorkingCalendar for WeekdayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.is_public_holiday(date)
    }

    fn work_minutes_on(&self, date: NaiveDate) -> i64 {
        if self.is_holiday(date) {
            0
        } else {
            self.daily_work_minutes
        }
    }
}
