//! Anomalies of a working day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::PersonDay;

/// A problem the administration has to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Troubles {
    /// Uncoupled stamping of a person with fixed working time.
    UncoupledFixed,
    /// No all-day absence and no stamping.
    NoAbsNoStamp,
    /// Uncoupled stamping on a working day.
    UncoupledWorking,
    /// Uncoupled stamping on a holiday.
    UncoupledHoliday,
    /// Not enough time at work.
    NotEnoughWorktime,
}

impl Troubles {
    /// Human readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Troubles::UncoupledFixed => "timbratura disaccoppiata persona fixed",
            Troubles::NoAbsNoStamp => "no assenze giornaliere e no timbrature",
            Troubles::UncoupledWorking => "timbratura disaccoppiata giorno feriale",
            Troubles::UncoupledHoliday => "timbratura disaccoppiata giorno festivo",
            Troubles::NotEnoughWorktime => "tempo a lavoro insufficiente",
        }
    }
}

/// Finds the troubles of a past day.
///
/// Pair identifiers must already be set on the stampings; see
/// [`valid_pairs`](super::valid_pairs). Today and future days have no
/// troubles yet, and all-day absences justify anything.
///
/// # Arguments
///
/// * `person_day` - The day, with `is_holiday` and `time_at_work` set
/// * `fixed_time_at_work` - The person does not need to stamp
/// * `work_minutes` - Working time expected on the day
/// * `today` - The current date
pub fn day_troubles(
    person_day: &PersonDay,
    fixed_time_at_work: bool,
    work_minutes: i64,
    today: NaiveDate,
) -> Vec<Troubles> {
    if !person_day.is_past(today) || person_day.has_all_day_absences() {
        return Vec::new();
    }

    let uncoupled = person_day
        .stampings
        .iter()
        .any(|s| s.pair_id == 0 && !s.exiting_now);

    let mut troubles = Vec::new();
    if fixed_time_at_work {
        if uncoupled {
            troubles.push(Troubles::UncoupledFixed);
        }
    } else if person_day.is_holiday {
        if uncoupled {
            troubles.push(Troubles::UncoupledHoliday);
        }
    } else if person_day.stampings.is_empty() {
        if person_day.absences.is_empty() {
            troubles.push(Troubles::NoAbsNoStamp);
        }
    } else if uncoupled {
        troubles.push(Troubles::UncoupledWorking);
    } else if person_day.absences.is_empty() && person_day.time_at_work < work_minutes / 2 {
        troubles.push(Troubles::NotEnoughWorktime);
    }

    if !troubles.is_empty() {
        debug!(person = %person_day.person_id, date = %person_day.date, ?troubles, "day in trouble");
    }
    troubles
}
