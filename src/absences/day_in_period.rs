//! The situation of a single day inside an absence period.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Absence, AbsenceType};

use super::errors_box::AbsenceProblem;
use super::taken::{ComplationAbsence, TakenAbsence};

/// What a period knows about one of its days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInPeriod {
    /// The day.
    pub date: NaiveDate,
    /// Absences counted against the takable amount.
    pub taken_absences: Vec<TakenAbsence>,
    /// Completion absences placed on the day.
    pub existent_complations: Vec<Absence>,
    /// Replacing absences placed on the day.
    pub existent_replacings: Vec<Absence>,
    /// The completion computed for the day.
    pub complation_absence: Option<ComplationAbsence>,
    /// The replacing code the completion requires on the day.
    pub correct_replacing: Option<AbsenceType>,
}

impl DayInPeriod {
    /// An empty day.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            taken_absences: Vec::new(),
            existent_complations: Vec::new(),
            existent_replacings: Vec::new(),
            complation_absence: None,
            correct_replacing: None,
        }
    }

    /// Compares the replacing absences on the day with the computed one.
    ///
    /// Each problem is paired with the absence it should be reported on.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::absences::{AbsenceProblem, DayInPeriod};
    /// use epas_engine::models::{Absence, AbsenceType, JustifiedType};
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
    /// let mut day = DayInPeriod::new(date);
    /// day.existent_complations.push(Absence::with_minutes(date, "23M", 240));
    /// day.correct_replacing = Some(AbsenceType::new("23H7", ""));
    ///
    /// let problems = day.replacing_problem();
    /// assert_eq!(problems[0].1, AbsenceProblem::MissingReplacing);
    /// ```
    pub fn replacing_problem(&self) -> Vec<(Absence, AbsenceProblem)> {
        let mut problems = Vec::new();

        for extra in self.existent_replacings.iter().skip(1) {
            problems.push((extra.clone(), AbsenceProblem::TwoReplacingSameDay));
        }

        match (&self.correct_replacing, self.existent_replacings.first()) {
            (Some(_), None) => {
                if let Some(complation) = self.existent_complations.first() {
                    problems.push((complation.clone(), AbsenceProblem::MissingReplacing));
                }
            }
            (Some(correct), Some(existent)) if existent.code != correct.code => {
                problems.push((existent.clone(), AbsenceProblem::WrongReplacing));
            }
            (None, Some(existent)) => {
                problems.push((existent.clone(), AbsenceProblem::TooEarlyReplacing));
            }
            _ => {}
        }

        problems
    }
}
