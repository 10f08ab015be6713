//! Which residual bounds a compensatory rest.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::month_recap::ContractMonthRecap;

/// The residual a compensatory rest may not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensatoryRestCapacity {
    /// Residual at the day of the rest.
    OnDayResidual,
    /// Residual at the end of the month of the rest.
    OnEndOfMonthResidual,
    /// Residual at the end of the previous month.
    OnEndPastMonthResidual,
    /// Residual at the end of the previous quarter.
    OnEndPastQuarterResidual,
}

impl CompensatoryRestCapacity {
    /// Human readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::OnDayResidual => "residuo del giorno",
            Self::OnEndOfMonthResidual => "residuo a fine mese",
            Self::OnEndPastMonthResidual => "residuo a fine mese precedente",
            Self::OnEndPastQuarterResidual => "residuo a trimestre precedente",
        }
    }

    /// The residual minutes available for a rest on `date`.
    ///
    /// # Arguments
    ///
    /// * `date` - Day of the rest
    /// * `day_residual` - Residual at `date`, used by [`OnDayResidual`](Self::OnDayResidual)
    /// * `recaps` - Month recaps of the contract, in any order
    ///
    /// # Returns
    ///
    /// The residual, 0 when the recap it depends on is missing.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::recaps::CompensatoryRestCapacity;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();
    /// let capacity = CompensatoryRestCapacity::OnDayResidual;
    /// assert_eq!(capacity.residual(date, 480, &[]), 480);
    /// ```
    pub fn residual(&self, date: NaiveDate, day_residual: i64, recaps: &[ContractMonthRecap]) -> i64 {
        let (year, month) = match self {
            Self::OnDayResidual => return day_residual,
            Self::OnEndOfMonthResidual => (date.year(), date.month()),
            Self::OnEndPastMonthResidual => month_before(date.year(), date.month()),
            Self::OnEndPastQuarterResidual => {
                let quarter_start = (date.month() - 1) / 3 * 3 + 1;
                month_before(date.year(), quarter_start)
            }
        };
        recaps
            .iter()
            .find(|r| r.year == year && r.month == month)
            .map(ContractMonthRecap::residual_total)
            .unwrap_or(0)
    }

    /// Returns true if a rest of `rest_minutes` fits in the residual.
    pub fn allows(
        &self,
        date: NaiveDate,
        rest_minutes: i64,
        day_residual: i64,
        recaps: &[ContractMonthRecap],
    ) -> bool {
        rest_minutes <= self.residual(date, day_residual, recaps)
    }
}

fn month_before(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}
