//! Validation problems collected while scanning a period.
//!
//! Business problems never abort a computation: they accumulate in an
//! [`ErrorsBox`] attached to the period and are reported with the result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Absence;

/// A problem affecting a single absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceProblem {
    /// The absence exceeds the takable amount of its period.
    LimitExceeded,
    /// A second completion absence on the same day.
    CompromisedTwoComplation,
    /// The completion reached a replacing time but no replacing code was placed.
    MissingReplacing,
    /// The replacing code placed is not the one the completion requires.
    WrongReplacing,
    /// A replacing code placed before the completion reached its time.
    TooEarlyReplacing,
    /// More than one replacing code on the same day.
    TwoReplacingSameDay,
    /// The absence does not belong to the group it was checked against.
    NotPertinent,
}

/// A problem that makes the whole period unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalProblem {
    /// The justified amount of an absence could not be computed.
    IncalcolableJustifiedAmount,
    /// Two replacing codes share the same replacing time.
    ConflictingReplacingTimes,
}

/// An absence problem with the absence it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceError {
    /// The absence affected.
    pub absence: Absence,
    /// What is wrong.
    pub problem: AbsenceProblem,
    /// Other absences involved, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicting: Vec<Absence>,
}

/// A critical problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalError {
    /// The day the problem was found on.
    pub date: NaiveDate,
    /// The absence type code involved, if any.
    pub absence_type: Option<String>,
    /// What is wrong.
    pub problem: CriticalProblem,
}

/// Accumulator of the problems found in a period.
///
/// # Example
///
/// ```
/// use epas_engine::absences::{AbsenceProblem, ErrorsBox};
/// use epas_engine::models::{Absence, JustifiedType};
/// use chrono::NaiveDate;
///
/// let absence = Absence::new(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(), "18", JustifiedType::AllDay);
/// let mut errors = ErrorsBox::default();
/// errors.add_absence_error(&absence, AbsenceProblem::LimitExceeded);
///
/// assert!(errors.contains_absence_problem(AbsenceProblem::LimitExceeded));
/// assert!(!errors.contains_critical_errors());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsBox {
    absence_errors: BTreeMap<Uuid, Vec<AbsenceError>>,
    critical_errors: Vec<CriticalError>,
}

impl ErrorsBox {
    /// Records a problem for `absence`. The same problem is recorded once.
    pub fn add_absence_error(&mut self, absence: &Absence, problem: AbsenceProblem) {
        self.add_absence_error_with(absence, problem, Vec::new());
    }

    /// Records a problem for `absence` involving other absences.
    pub fn add_absence_error_with(
        &mut self,
        absence: &Absence,
        problem: AbsenceProblem,
        conflicting: Vec<Absence>,
    ) {
        let errors = self.absence_errors.entry(absence.id).or_default();
        if errors.iter().any(|e| e.problem == problem) {
            return;
        }
        errors.push(AbsenceError {
            absence: absence.clone(),
            problem,
            conflicting,
        });
    }

    /// Records a critical problem.
    pub fn add_critical_error(
        &mut self,
        date: NaiveDate,
        absence_type: Option<&str>,
        problem: CriticalProblem,
    ) {
        self.critical_errors.push(CriticalError {
            date,
            absence_type: absence_type.map(str::to_string),
            problem,
        });
    }

    /// Returns true if a critical problem was recorded.
    pub fn contains_critical_errors(&self) -> bool {
        !self.critical_errors.is_empty()
    }

    /// Returns true if any absence has `problem`.
    pub fn contains_absence_problem(&self, problem: AbsenceProblem) -> bool {
        self.absence_errors
            .values()
            .flatten()
            .any(|e| e.problem == problem)
    }

    /// The problems recorded for the absence with identifier `id`.
    pub fn absence_problems(&self, id: Uuid) -> Vec<AbsenceProblem> {
        self.absence_errors
            .get(&id)
            .map(|errors| errors.iter().map(|e| e.problem).collect())
            .unwrap_or_default()
    }

    /// All absence errors, grouped by absence.
    pub fn absence_errors(&self) -> impl Iterator<Item = &AbsenceError> {
        self.absence_errors.values().flatten()
    }

    /// All critical errors.
    pub fn critical_errors(&self) -> &[CriticalError] {
        &self.critical_errors
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.absence_errors.is_empty() && self.critical_errors.is_empty()
    }

    /// Removes every recorded problem.
    pub fn clear(&mut self) {
        self.absence_errors.clear();
        self.critical_errors.clear();
    }
}

/// Returns true if any of the boxes holds a critical problem.
pub fn boxes_contain_critical_errors<'a>(boxes: impl IntoIterator<Item = &'a ErrorsBox>) -> bool {
    boxes.into_iter().any(ErrorsBox::contains_critical_errors)
}
