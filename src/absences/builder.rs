//! Construction of the period of a group at a date.

use chrono::{Datelike, Month, NaiveDate};
use tracing::{debug, warn};

use crate::calendar::WorkingCalendar;
use crate::config::AbsenceCatalog;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Contract, DateInterval, GroupAbsenceType, InitializationGroup, PeriodType, TakeCountBehaviour,
};

use super::amounts::replacing_amount;
use super::errors_box::CriticalProblem;
use super::period::AbsencePeriod;

/// The smart working code whose limit depends on the working days of the month.
pub const SMART_WORKING_CODE: &str = "LAGILE";

/// Smart working days that can be taken in February: two less than the group limit.
const FEBRUARY_REDUCTION: i64 = 200;

/// The takable amount of a smart working month, in hundredths of a day.
///
/// February gets the group limit minus two days. Other months allow half of
/// the working days: the half is floored to whole days, and when it is
/// already whole one day is taken off.
///
/// # Example
///
/// ```
/// use epas_engine::absences::smart_working_limit;
/// use chrono::NaiveDate;
///
/// let march = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let february = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
///
/// assert_eq!(smart_working_limit(march, 1000, 21), 1000);
/// assert_eq!(smart_working_limit(march, 1000, 20), 900);
/// assert_eq!(smart_working_limit(february, 1000, 20), 800);
/// ```
pub fn smart_working_limit(month_from: NaiveDate, fixed_amount: i64, working_days: i64) -> i64 {
    if month_from.month() == Month::February.number_from_month() {
        return fixed_amount - FEBRUARY_REDUCTION;
    }
    let count = working_days * 100 / 2;
    if count % 100 != 0 {
        count - count % 100
    } else {
        count - 100
    }
}

/// Builds the [`AbsencePeriod`] of a group for a contract.
///
/// # Example
///
/// ```no_run
/// use epas_engine::absences::PeriodBuilder;
/// use epas_engine::calendar::WeekdayCalendar;
/// use epas_engine::config::ConfigLoader;
/// use epas_engine::models::Contract;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/epas")?;
/// let calendar = WeekdayCalendar::new(432);
/// let contract = Contract::new("c_001", "p_001", NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), None);
///
/// let builder = PeriodBuilder::new(loader.catalog(), &calendar);
/// let group = loader.group("G_661")?;
/// let period = builder.build(group, &contract, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(), None)?;
/// assert_eq!(period.period_takable_amount(), 1080);
/// # Ok::<(), epas_engine::error::EngineError>(())
/// ```
pub struct PeriodBuilder<'a> {
    catalog: &'a AbsenceCatalog,
    calendar: &'a dyn WorkingCalendar,
}

impl<'a> PeriodBuilder<'a> {
    /// Creates a builder reading codes from `catalog` and working days from `calendar`.
    pub fn new(catalog: &'a AbsenceCatalog, calendar: &'a dyn WorkingCalendar) -> Self {
        Self { catalog, calendar }
    }

    /// The window of `group` around `date`, limited to the contract.
    pub fn period_window(
        &self,
        group: &GroupAbsenceType,
        contract: &Contract,
        date: NaiveDate,
    ) -> EngineResult<DateInterval> {
        let contract_interval = contract.interval()?;
        let window = match group.period_type {
            PeriodType::Always => contract_interval,
            PeriodType::Year => DateInterval::year(date.year()),
            PeriodType::Month => DateInterval::month_of(date),
        };
        window
            .intersect(&contract_interval)
            .filter(|w| w.contains(date))
            .ok_or_else(|| EngineError::InvalidPeriod {
                from: window.begin,
                to: window.end,
                message: format!("{} is outside contract {}", date, contract.id),
            })
    }

    /// Builds the period of `group` containing `date`.
    ///
    /// The initialization is attached only when it falls inside the period.
    pub fn build(
        &self,
        group: &GroupAbsenceType,
        contract: &Contract,
        date: NaiveDate,
        initialization: Option<&InitializationGroup>,
    ) -> EngineResult<AbsencePeriod> {
        let window = self.period_window(group, contract, date)?;
        let mut period = AbsencePeriod::new(
            contract.person_id.clone(),
            group.code.clone(),
            window.begin,
            window.end,
        )?;

        if let Some(takable) = &group.takable {
            period.take_amount_type = Some(takable.amount_type);
            period.takable_count_behaviour = takable.takable_count_behaviour;
            period.taken_count_behaviour = takable.taken_count_behaviour;
            period.takable_codes = takable.takable_codes.clone();
            period.taken_codes = takable.taken_codes.clone();
            period.set_fixed_period_takable_amount(takable.fixed_limit);

            if takable.fixed_limit >= 0
                && takable.takable_count_behaviour == TakeCountBehaviour::Period
                && period.takable_codes.contains(SMART_WORKING_CODE)
            {
                let working_days = self.calendar.working_days_between(period.from, period.to);
                let limit = smart_working_limit(
                    period.from,
                    period.fixed_period_takable_amount(),
                    working_days,
                );
                debug!(group = %group.code, from = %period.from, working_days, limit, "smart working limit");
                period.set_scaled_fixed_amount(limit);
            }
        }

        if let Some(complation) = &group.complation {
            period.complation_amount_type = Some(complation.amount_type);
            period.complation_codes = complation.complation_codes.clone();
            for code in &complation.replacing_codes {
                let absence_type = self.catalog.absence_type(code)?;
                let Some(time) = replacing_amount(absence_type, complation.amount_type) else {
                    warn!(group = %group.code, code = %code, "replacing code without replacing time");
                    period.errors_box.add_critical_error(
                        period.from,
                        Some(code),
                        CriticalProblem::IncalcolableJustifiedAmount,
                    );
                    continue;
                };
                if !period.add_replacing_code(absence_type.clone(), time) {
                    warn!(group = %group.code, code = %code, time, "conflicting replacing times");
                    period.errors_box.add_critical_error(
                        period.from,
                        Some(code),
                        CriticalProblem::ConflictingReplacingTimes,
                    );
                }
            }
        }

        if let Some(init) = initialization {
            if period.period_interval().contains(init.date) {
                period.set_initialization(init.clone())?;
            }
        }

        Ok(period)
    }
}
