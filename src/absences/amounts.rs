//! Justified amounts and replacing code selection.
//!
//! These functions turn an absence into the number that a period counts:
//! minutes, or hundredths of a working day.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Absence, AbsenceType, AmountType, JustifiedBehaviourName, JustifiedType};

/// One whole day in unit amounts.
pub const UNITS_PER_DAY: i64 = 100;

/// Replacing codes grouped by replacing time, largest first.
pub type ReplacingCodesDesc = BTreeMap<Reverse<i64>, Vec<AbsenceType>>;

/// Percentage (in hundredths) of `work_time` covered by `minutes`.
///
/// Returns 0 when the working time is not positive.
///
/// # Example
///
/// ```
/// use epas_engine::absences::working_type_percent;
///
/// assert_eq!(working_type_percent(216, 432), 50);
/// assert_eq!(working_type_percent(100, 0), 0);
/// ```
pub fn working_type_percent(minutes: i64, work_time: i64) -> i64 {
    if work_time <= 0 {
        return 0;
    }
    minutes * 100 / work_time
}

/// The amount justified by `absence` in the given unit.
///
/// Returns `None` when the amount can not be computed: minutes are missing
/// on a `SpecifiedMinutes` absence, the absence type has no fixed time, or a
/// minute based absence must be converted to units on a day with no working
/// time.
///
/// # Arguments
///
/// * `absence` - The absence to measure
/// * `absence_type` - Its catalog entry (behaviours, fixed time)
/// * `amount_type` - The unit the caller counts in
/// * `work_minutes` - Working minutes of the person on the absence day
///
/// # Example
///
/// ```
/// use epas_engine::absences::absence_justified_amount;
/// use epas_engine::models::{Absence, AbsenceType, AmountType, JustifiedType};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
/// let absence = Absence::with_minutes(date, "661", 216);
/// let code = AbsenceType::new("661", "Permesso personale");
///
/// assert_eq!(absence_justified_amount(&absence, &code, AmountType::Minutes, 432), Some(216));
/// assert_eq!(absence_justified_amount(&absence, &code, AmountType::Units, 432), Some(50));
///
/// let vacation = Absence::new(date, "32", JustifiedType::AllDay);
/// assert_eq!(
///     absence_justified_amount(&vacation, &AbsenceType::new("32", "Ferie"), AmountType::Units, 0),
///     Some(100)
/// );
/// ```
pub fn absence_justified_amount(
    absence: &Absence,
    absence_type: &AbsenceType,
    amount_type: AmountType,
    work_minutes: i64,
) -> Option<i64> {
    let minutes = match absence.justified_type {
        JustifiedType::Nothing => return Some(0),
        JustifiedType::AllDay
        | JustifiedType::AssignAllDay
        | JustifiedType::CompleteDayAndAddOvertime => match amount_type {
            AmountType::Units => return Some(apply_percentage(UNITS_PER_DAY, absence_type)),
            AmountType::Minutes => work_minutes,
        },
        JustifiedType::HalfDay => match amount_type {
            AmountType::Units => return Some(apply_percentage(UNITS_PER_DAY / 2, absence_type)),
            AmountType::Minutes => work_minutes / 2,
        },
        JustifiedType::SpecifiedMinutes => absence.justified_minutes?,
        JustifiedType::AbsenceTypeMinutes => absence_type.justified_time?,
    };

    let minutes = apply_percentage(apply_time_bounds(minutes, absence_type), absence_type);

    match amount_type {
        AmountType::Minutes => Some(minutes),
        AmountType::Units if work_minutes > 0 => Some(working_type_percent(minutes, work_minutes)),
        AmountType::Units => None,
    }
}

fn apply_time_bounds(minutes: i64, absence_type: &AbsenceType) -> i64 {
    let mut minutes = minutes;
    if let Some(max) = absence_type
        .behaviour(JustifiedBehaviourName::MaximumTime)
        .and_then(|b| b.data)
    {
        minutes = minutes.min(max);
    }
    if let Some(min) = absence_type
        .behaviour(JustifiedBehaviourName::MinimumTime)
        .and_then(|b| b.data)
    {
        minutes = minutes.max(min);
    }
    minutes
}

// Percentage data is expressed in thousandths.
fn apply_percentage(amount: i64, absence_type: &AbsenceType) -> i64 {
    match absence_type
        .behaviour(JustifiedBehaviourName::TakenPercentageTime)
        .and_then(|b| b.data)
    {
        Some(per_mille) => amount * per_mille / 1000,
        None => amount,
    }
}

/// The amount a replacing code replaces, in the completion unit.
///
/// Falls back to the fixed justified time for minute completions and to a
/// whole day for unit completions.
pub fn replacing_amount(absence_type: &AbsenceType, amount_type: AmountType) -> Option<i64> {
    if let Some(time) = absence_type.replacing_time {
        return Some(time);
    }
    match amount_type {
        AmountType::Minutes => absence_type.justified_time.filter(|t| *t > 0),
        AmountType::Units => Some(UNITS_PER_DAY),
    }
}

/// The replacing code to use on `date` for an accumulated `amount`.
///
/// Walks the codes from the largest replacing time down and returns the
/// first one valid on `date` whose time fits in `amount`. Codes with a
/// non-positive replacing time are never selected.
pub fn which_replacing_code(
    replacing_codes_desc: &ReplacingCodesDesc,
    date: NaiveDate,
    amount: i64,
) -> Option<&AbsenceType> {
    replacing_codes_desc
        .iter()
        .filter(|(Reverse(time), _)| *time > 0 && *time <= amount)
        .flat_map(|(_, codes)| codes.iter())
        .find(|code| code.is_valid_on(date))
}
