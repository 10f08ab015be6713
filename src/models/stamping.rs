//! Stamping model: a single clock-in or clock-out.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Direction of a stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WayType {
    /// Entering.
    In,
    /// Exiting.
    Out,
}

/// Reason attached to a stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampType {
    /// Leaving or entering for work reasons.
    Service,
    /// Lunch break.
    LunchBreak,
    /// Work outside the office.
    WorkOutside,
    /// Personal reasons.
    PersonalReasons,
}

/// A clock-in or clock-out of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamping {
    /// When the stamping happened.
    pub date_time: NaiveDateTime,
    /// Direction.
    pub way: WayType,
    /// Optional reason.
    #[serde(default)]
    pub stamp_type: Option<StampType>,
    /// Free text note.
    #[serde(default)]
    pub note: Option<String>,
    /// True for the virtual exit placed at "now" when computing today.
    #[serde(default)]
    pub exiting_now: bool,
    /// Identifier of the valid pair the stamping belongs to; 0 when uncoupled.
    #[serde(default)]
    pub pair_id: u32,
}

impl Stamping {
    /// Creates a stamping with no reason or note.
    pub fn new(date_time: NaiveDateTime, way: WayType) -> Self {
        Self {
            date_time,
            way,
            stamp_type: None,
            note: None,
            exiting_now: false,
            pair_id: 0,
        }
    }

    /// Returns true for an entrance.
    pub fn is_in(&self) -> bool {
        self.way == WayType::In
    }

    /// Returns true for an exit.
    pub fn is_out(&self) -> bool {
        self.way == WayType::Out
    }

    /// Returns true for a lunch break stamping.
    pub fn is_lunch_break(&self) -> bool {
        self.stamp_type == Some(StampType::LunchBreak)
    }

    /// Minutes elapsed since midnight.
    pub fn minute_of_day(&self) -> i64 {
        i64::from(self.date_time.hour()) * 60 + i64::from(self.date_time.minute())
    }

    /// Clock time formatted as `HH:MM`.
    pub fn hour(&self) -> String {
        self.date_time.format("%H:%M").to_string()
    }
}

/// A range of clock times within a day (e.g. the lunch window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Start of the range.
    pub from: NaiveTime,
    /// End of the range.
    pub to: NaiveTime,
}

impl TimeInterval {
    /// Returns the interval only if it is not inverted.
    pub fn checked(from: NaiveTime, to: NaiveTime) -> Option<Self> {
        if to < from {
            None
        } else {
            Some(Self { from, to })
        }
    }

    /// Returns true if `time` falls inside the range.
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.from && time <= self.to
    }

    /// Length of the range in minutes.
    pub fn minutes(&self) -> i64 {
        (self.to - self.from).num_minutes()
    }
}
