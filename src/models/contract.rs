//! Person, contract and vacation code models.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::DateInterval;

/// A person registered in ePAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier for the person.
    pub id: String,
    /// First name.
    pub name: String,
    /// Last name.
    pub surname: String,
    /// The day the person was registered in the system.
    pub begin_date: NaiveDate,
}

impl Person {
    /// "Surname Name", as shown in the summaries.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.name)
    }
}

/// A work contract of a person.
///
/// `source_*` fields are the initialization data an administrator enters
/// when a contract predates the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier for the contract.
    pub id: String,
    /// The person the contract belongs to.
    pub person_id: String,
    /// First day of the contract.
    pub begin_date: NaiveDate,
    /// Natural end of the contract (none for permanent contracts).
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Early termination day.
    #[serde(default)]
    pub end_contract: Option<NaiveDate>,
    /// Day of the residual-hours initialization.
    #[serde(default)]
    pub source_date_residual: Option<NaiveDate>,
    /// Day of the meal tickets initialization.
    #[serde(default)]
    pub source_date_meal_ticket: Option<NaiveDate>,
    /// Meal tickets still available at `source_date_meal_ticket`.
    #[serde(default)]
    pub source_remaining_meal_ticket: i64,
    /// Residual minutes of the previous year at `source_date_residual`.
    #[serde(default)]
    pub source_remaining_minutes_last_year: i64,
    /// Residual minutes of the current year at `source_date_residual`.
    #[serde(default)]
    pub source_remaining_minutes_current_year: i64,
}

impl Contract {
    /// Creates a contract with no initialization data.
    pub fn new(
        id: impl Into<String>,
        person_id: impl Into<String>,
        begin_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            person_id: person_id.into(),
            begin_date,
            end_date,
            end_contract: None,
            source_date_residual: None,
            source_date_meal_ticket: None,
            source_remaining_meal_ticket: 0,
            source_remaining_minutes_last_year: 0,
            source_remaining_minutes_current_year: 0,
        }
    }

    /// The effective end: the earliest of termination and natural end.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::models::Contract;
    /// use chrono::NaiveDate;
    ///
    /// let mut contract = Contract::new(
    ///     "c_001",
    ///     "p_001",
    ///     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    ///     Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()),
    /// );
    /// contract.end_contract = Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    ///
    /// assert_eq!(contract.calculated_end(), NaiveDate::from_ymd_opt(2025, 6, 30));
    /// ```
    pub fn calculated_end(&self) -> Option<NaiveDate> {
        match (self.end_contract, self.end_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The contract interval, open-ended contracts extend to `NaiveDate::MAX`.
    pub fn interval(&self) -> EngineResult<DateInterval> {
        let end = self.calculated_end().unwrap_or(NaiveDate::MAX);
        DateInterval::new(self.begin_date, end).map_err(|_| EngineError::InvalidContract {
            contract_id: self.id.clone(),
            message: format!("end {} is before begin {}", end, self.begin_date),
        })
    }

    /// The first anniversary of the contract.
    pub fn first_year_end(&self) -> NaiveDate {
        self.begin_date
            .checked_add_months(Months::new(12))
            .unwrap_or(NaiveDate::MAX)
    }

    /// The interval considered for meal tickets: after the initialization day, if any.
    pub fn meal_ticket_interval(&self) -> EngineResult<DateInterval> {
        let interval = self.interval()?;
        let begin = match self.source_date_meal_ticket {
            Some(source) => source.succ_opt().unwrap_or(source).max(interval.begin),
            None => interval.begin,
        };
        DateInterval::new(begin, interval.end)
    }
}

/// The vacation entitlement attached to a contract interval.
///
/// The name reads as "vacation days + law permission days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacationCode {
    /// 26 vacation days, 4 permission days.
    #[serde(rename = "26+4")]
    Code26Plus4,
    /// 28 vacation days, 4 permission days.
    #[serde(rename = "28+4")]
    Code28Plus4,
    /// 21 vacation days, 4 permission days.
    #[serde(rename = "21+4")]
    Code21Plus4,
    /// 22 vacation days, 3 permission days.
    #[serde(rename = "22+3")]
    Code22Plus3,
    /// 21 vacation days, 3 permission days.
    #[serde(rename = "21+3")]
    Code21Plus3,
}

impl VacationCode {
    /// Yearly vacation days.
    pub fn vacation_days(&self) -> i64 {
        match self {
            VacationCode::Code26Plus4 => 26,
            VacationCode::Code28Plus4 => 28,
            VacationCode::Code21Plus4 | VacationCode::Code21Plus3 => 21,
            VacationCode::Code22Plus3 => 22,
        }
    }

    /// Yearly law permission days.
    pub fn permission_days(&self) -> i64 {
        match self {
            VacationCode::Code26Plus4 | VacationCode::Code28Plus4 | VacationCode::Code21Plus4 => 4,
            VacationCode::Code22Plus3 | VacationCode::Code21Plus3 => 3,
        }
    }

    /// The display name, e.g. "28+4".
    pub fn name(&self) -> &'static str {
        match self {
            VacationCode::Code26Plus4 => "26+4",
            VacationCode::Code28Plus4 => "28+4",
            VacationCode::Code21Plus4 => "21+4",
            VacationCode::Code22Plus3 => "22+3",
            VacationCode::Code21Plus3 => "21+3",
        }
    }
}

impl fmt::Display for VacationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VacationCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "26+4" => Ok(VacationCode::Code26Plus4),
            "28+4" => Ok(VacationCode::Code28Plus4),
            "21+4" => Ok(VacationCode::Code21Plus4),
            "22+3" => Ok(VacationCode::Code22Plus3),
            "21+3" => Ok(VacationCode::Code21Plus3),
            other => Err(EngineError::CalculationError {
                message: format!("Unknown vacation code: {}", other),
            }),
        }
    }
}

/// A contract interval with its vacation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationPeriod {
    /// First day the code applies.
    pub begin_date: NaiveDate,
    /// Last day the code applies (open when none).
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// The entitlement.
    pub vacation_code: VacationCode,
}

impl VacationPeriod {
    /// The interval covered by the vacation period.
    pub fn interval(&self) -> EngineResult<DateInterval> {
        DateInterval::new(self.begin_date, self.end_date.unwrap_or(NaiveDate::MAX))
    }
}
