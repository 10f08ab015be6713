//! Absence model and absence type catalog entries.
//!
//! An [`Absence`] is a single justification placed on a day; an
//! [`AbsenceType`] describes how a code justifies time and how it takes
//! part in completion and accrual rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit in which a period counts its amounts.
///
/// Unit amounts are kept as integer hundredths: one whole day is `100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountType {
    /// Amounts are minutes.
    Minutes,
    /// Amounts are hundredths of a day.
    Units,
}

/// How an absence justifies the working time of its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JustifiedType {
    /// Justifies nothing (a marker code).
    Nothing,
    /// Justifies the whole working day.
    AllDay,
    /// Justifies half of the working day.
    HalfDay,
    /// Justifies the minutes written on the absence.
    SpecifiedMinutes,
    /// Justifies the fixed minutes of its absence type.
    AbsenceTypeMinutes,
    /// Assigns the whole day regardless of working time.
    AssignAllDay,
    /// Completes the day, the excess becomes overtime.
    CompleteDayAndAddOvertime,
}

/// Names of the behaviours that alter a justified amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JustifiedBehaviourName {
    /// The justified minutes can not be below `data`.
    MinimumTime,
    /// The justified minutes can not exceed `data`.
    MaximumTime,
    /// Only `data` thousandths of the amount are counted.
    TakenPercentageTime,
    /// The absence does not generate overtime.
    NoOvertime,
    /// The absence reduces the overtime of the day.
    ReduceOvertime,
}

/// A behaviour attached to an absence type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JustifiedBehaviour {
    /// Which behaviour.
    pub name: JustifiedBehaviourName,
    /// Behaviour parameter, when the behaviour needs one.
    #[serde(default)]
    pub data: Option<i64>,
}

/// An entry of the absence type catalog.
///
/// # Example
///
/// ```
/// use epas_engine::models::AbsenceType;
/// use chrono::NaiveDate;
///
/// let vacation = AbsenceType::new("32", "Ferie anno corrente");
/// assert!(vacation.is_valid_on(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceType {
    /// The absence code (e.g. "32", "661", "23H7").
    pub code: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// Minutes justified by the code, for fixed-time codes.
    #[serde(default)]
    pub justified_time: Option<i64>,
    /// Amount replaced by the code when used as a replacing code.
    #[serde(default)]
    pub replacing_time: Option<i64>,
    /// First day the code can be used.
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    /// Last day the code can be used.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// Behaviours that alter the justified amount.
    #[serde(default)]
    pub behaviours: Vec<JustifiedBehaviour>,
    /// Whether days with this code reduce vacation accrual (post partum).
    #[serde(default)]
    pub reduces_accrual: bool,
}

impl AbsenceType {
    /// Creates a catalog entry with no limits or behaviours.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            justified_time: None,
            replacing_time: None,
            valid_from: None,
            valid_to: None,
            behaviours: Vec::new(),
            reduces_accrual: false,
        }
    }

    /// Returns true if the code can be used on `date`.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from.is_none_or(|from| date >= from)
            && self.valid_to.is_none_or(|to| date <= to)
    }

    /// The behaviour named `name`, if the type has it.
    pub fn behaviour(&self, name: JustifiedBehaviourName) -> Option<&JustifiedBehaviour> {
        self.behaviours.iter().find(|b| b.name == name)
    }
}

/// An absence placed on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// Unique identifier of the absence.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// The day of the absence.
    pub date: NaiveDate,
    /// The absence type code.
    pub code: String,
    /// How the absence justifies the day.
    pub justified_type: JustifiedType,
    /// Minutes written on the absence for `SpecifiedMinutes`.
    #[serde(default)]
    pub justified_minutes: Option<i64>,
}

impl Absence {
    /// Creates an absence with a fresh identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::models::{Absence, JustifiedType};
    /// use chrono::NaiveDate;
    ///
    /// let absence = Absence::new(
    ///     NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(),
    ///     "32",
    ///     JustifiedType::AllDay,
    /// );
    /// assert_eq!(absence.code, "32");
    /// assert!(absence.is_all_day());
    /// ```
    pub fn new(date: NaiveDate, code: impl Into<String>, justified_type: JustifiedType) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            code: code.into(),
            justified_type,
            justified_minutes: None,
        }
    }

    /// Creates a `SpecifiedMinutes` absence.
    pub fn with_minutes(date: NaiveDate, code: impl Into<String>, minutes: i64) -> Self {
        Self {
            justified_minutes: Some(minutes),
            ..Self::new(date, code, JustifiedType::SpecifiedMinutes)
        }
    }

    /// Returns true if the absence covers the whole day.
    pub fn is_all_day(&self) -> bool {
        matches!(
            self.justified_type,
            JustifiedType::AllDay | JustifiedType::AssignAllDay
        )
    }
}

/// A baseline of amounts already consumed up to `date`.
///
/// Used when a contract is loaded into the system mid-way: the
/// administrator declares what was used before the system took over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationGroup {
    /// Day of the initialization; absences on or before it are already counted.
    pub date: NaiveDate,
    /// Whole days consumed.
    #[serde(default)]
    pub units_input: i64,
    /// Hours consumed.
    #[serde(default)]
    pub hours_input: i64,
    /// Minutes consumed.
    #[serde(default)]
    pub minutes_input: i64,
    /// Average daily working time in minutes, used to convert minutes to units.
    pub average_week_time: i64,
}

impl InitializationGroup {
    /// Hours and minutes of the baseline expressed in minutes.
    pub fn input_minutes(&self) -> i64 {
        self.hours_input * 60 + self.minutes_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_absence_type_validity_window() {
        let mut code = AbsenceType::new("LAGILE", "Lavoro agile");
        code.valid_from = Some(date(2020, 3, 1));
        code.valid_to = Some(date(2022, 12, 31));

        assert!(!code.is_valid_on(date(2020, 2, 29)));
        assert!(code.is_valid_on(date(2020, 3, 1)));
        assert!(code.is_valid_on(date(2022, 12, 31)));
        assert!(!code.is_valid_on(date(2023, 1, 1)));
    }

    #[test]
    fn test_behaviour_lookup() {
        let mut code = AbsenceType::new("09M", "Visita medica");
        code.behaviours.push(JustifiedBehaviour {
            name: JustifiedBehaviourName::MaximumTime,
            data: Some(240),
        });

        assert_eq!(
            code.behaviour(JustifiedBehaviourName::MaximumTime)
                .and_then(|b| b.data),
            Some(240)
        );
        assert!(code.behaviour(JustifiedBehaviourName::MinimumTime).is_none());
    }

    #[test]
    fn test_absence_with_minutes() {
        let absence = Absence::with_minutes(date(2025, 4, 2), "661", 90);
        assert_eq!(absence.justified_type, JustifiedType::SpecifiedMinutes);
        assert_eq!(absence.justified_minutes, Some(90));
        assert!(!absence.is_all_day());
    }

    #[test]
    fn test_absence_deserialization_generates_id() {
        let json = r#"{
            "date": "2025-04-02",
            "code": "32",
            "justified_type": "all_day"
        }"#;
        let absence: Absence = serde_json::from_str(json).unwrap();
        assert_eq!(absence.code, "32");
        assert_ne!(absence.id, Uuid::nil());
    }

    #[test]
    fn test_initialization_input_minutes() {
        let init = InitializationGroup {
            date: date(2025, 6, 30),
            units_input: 2,
            hours_input: 3,
            minutes_input: 20,
            average_week_time: 432,
        };
        assert_eq!(init.input_minutes(), 200);
    }
}
