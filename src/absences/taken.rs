//! Immutable records of absences counted by a period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Absence, AmountType};

/// An absence counted against the takable amount of a period.
///
/// The totals are a snapshot taken when the absence was added.
///
/// # Example
///
/// ```
/// use epas_engine::absences::TakenAbsence;
/// use epas_engine::models::{Absence, AmountType, JustifiedType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let taken = TakenAbsence {
///     absence: Absence::new(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(), "18", JustifiedType::AllDay),
///     amount_type: AmountType::Units,
///     period_takable_total: 300,
///     period_taken_before: 250,
///     taken_amount: 100,
///     before_initialization: false,
/// };
///
/// assert_eq!(taken.taken_after(), 350);
/// assert!(taken.exceeds_limit());
/// assert_eq!(taken.taken_days(), Some(Decimal::ONE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakenAbsence {
    /// The absence.
    pub absence: Absence,
    /// Unit of the amounts.
    pub amount_type: AmountType,
    /// Takable amount of the period when the absence was added (negative: no limit).
    pub period_takable_total: i64,
    /// Amount already taken before the absence.
    pub period_taken_before: i64,
    /// Amount taken by the absence.
    pub taken_amount: i64,
    /// The absence is already counted by the period initialization.
    pub before_initialization: bool,
}

impl TakenAbsence {
    /// Amount taken once the absence is counted.
    pub fn taken_after(&self) -> i64 {
        self.period_taken_before + self.taken_amount
    }

    /// Returns true if counting the absence goes over the takable amount.
    pub fn exceeds_limit(&self) -> bool {
        self.period_takable_total >= 0 && self.taken_after() > self.period_takable_total
    }

    /// Days taken by the absence, only for unit amounts.
    pub fn taken_days(&self) -> Option<Decimal> {
        match self.amount_type {
            AmountType::Units => Some(Decimal::new(self.taken_amount, 2).normalize()),
            AmountType::Minutes => None,
        }
    }
}

/// A completion absence with the residual it leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplationAbsence {
    /// The absence.
    pub absence: Absence,
    /// Unit of the amounts.
    pub amount_type: AmountType,
    /// Residual before the absence.
    pub residual_complation_before: i64,
    /// Amount added by the absence.
    pub consumed_complation: i64,
    /// Residual after the absence and its replacing code, if any.
    pub residual_complation_after: i64,
}
