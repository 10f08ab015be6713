//! Absence groups: the rules that bind a set of codes to a limit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::AmountType;

/// How the time window of a group is derived from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// The whole contract.
    Always,
    /// The calendar year of the date.
    Year,
    /// The calendar month of the date.
    Month,
}

/// Strategy used to count a takable or taken amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeCountBehaviour {
    /// Only the period itself.
    Period,
    /// All the sub-periods of the period.
    SumAllPeriod,
    /// The sub-periods that started on or before a date.
    SumUntilPeriod,
}

/// Takable side of a group: which codes consume which budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakableBehaviour {
    /// Unit of the budget.
    pub amount_type: AmountType,
    /// How the budget is counted.
    pub takable_count_behaviour: TakeCountBehaviour,
    /// How the consumption is counted.
    pub taken_count_behaviour: TakeCountBehaviour,
    /// Budget of the period, in days or minutes. Negative means no limit.
    pub fixed_limit: i64,
    /// Codes that can be taken in the period.
    pub takable_codes: BTreeSet<String>,
    /// Codes whose amounts are counted against the budget.
    pub taken_codes: BTreeSet<String>,
}

/// Completion side of a group: partial absences that sum into replacing codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplationBehaviour {
    /// Unit of the completion amounts.
    pub amount_type: AmountType,
    /// Codes whose amounts accumulate.
    pub complation_codes: BTreeSet<String>,
    /// Codes that replace accumulated amounts.
    pub replacing_codes: BTreeSet<String>,
}

/// A group of absence codes sharing a limit and/or a completion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAbsenceType {
    /// Group code (e.g. "G_661").
    pub code: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// How the period window is derived.
    pub period_type: PeriodType,
    /// Takable behaviour, if the group has a budget.
    #[serde(default)]
    pub takable: Option<TakableBehaviour>,
    /// Completion behaviour, if the group completes partial absences.
    #[serde(default)]
    pub complation: Option<ComplationBehaviour>,
}

impl GroupAbsenceType {
    /// Returns true if `code` takes part in the group in any role.
    pub fn involves(&self, code: &str) -> bool {
        let takable = self.takable.as_ref().is_some_and(|t| {
            t.taken_codes.contains(code) || t.takable_codes.contains(code)
        });
        let complation = self.complation.as_ref().is_some_and(|c| {
            c.complation_codes.contains(code) || c.replacing_codes.contains(code)
        });
        takable || complation
    }
}
