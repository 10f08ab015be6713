//! The working day of a person.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Absence, Stamping};

/// Stampings, absences and meal ticket state of one person on one day.
///
/// `time_at_work` and `ticket_available` are produced upstream by the
/// stamping computation; the engine reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDay {
    /// The person.
    pub person_id: String,
    /// The day.
    pub date: NaiveDate,
    /// Stampings of the day, in any order.
    #[serde(default)]
    pub stampings: Vec<Stamping>,
    /// Absences of the day.
    #[serde(default)]
    pub absences: Vec<Absence>,
    /// Whether the day is a holiday for the person.
    #[serde(default)]
    pub is_holiday: bool,
    /// Minutes at work.
    #[serde(default)]
    pub time_at_work: i64,
    /// Whether the day earns a meal ticket.
    #[serde(default)]
    pub ticket_available: bool,
    /// Whether an administrator forced the meal ticket decision.
    #[serde(default)]
    pub ticket_forced_by_admin: bool,
    /// Minutes of work approved on a holiday.
    #[serde(default)]
    pub approved_on_holiday: i64,
    /// Whether today's values were computed assuming an exit now.
    #[serde(default)]
    pub considered_exiting_now: bool,
}

impl PersonDay {
    /// Creates an empty working day.
    pub fn new(person_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            person_id: person_id.into(),
            date,
            stampings: Vec::new(),
            absences: Vec::new(),
            is_holiday: false,
            time_at_work: 0,
            ticket_available: false,
            ticket_forced_by_admin: false,
            approved_on_holiday: 0,
            considered_exiting_now: false,
        }
    }

    /// Returns true if the day is `today`.
    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Returns true if the day is before `today`.
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date < today
    }

    /// Returns true if the day is after `today`.
    pub fn is_future(&self, today: NaiveDate) -> bool {
        self.date > today
    }

    /// Returns true if some absence justifies the whole day.
    pub fn has_all_day_absences(&self) -> bool {
        self.absences.iter().any(Absence::is_all_day)
    }

    /// Returns true if the day counts as a used meal ticket.
    pub fn uses_meal_ticket(&self) -> bool {
        self.ticket_available && (!self.is_holiday || self.ticket_forced_by_admin)
    }

    /// Difference between minutes at work and the expected working time.
    ///
    /// On holidays every minute at work counts.
    pub fn difference(&self, work_minutes: i64) -> i64 {
        if self.is_holiday {
            self.time_at_work
        } else {
            self.time_at_work - work_minutes
        }
    }
}
