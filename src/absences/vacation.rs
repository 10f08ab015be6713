//! Vacation and law permission situation of a contract.
//!
//! Vacation days accrue day by day over a calendar year and can be used
//! until the end of August of the following year; law permissions accrue
//! the same way but expire with the year. Each accrual year is an
//! [`AbsencePeriod`] whose sub-periods follow the vacation codes of the
//! contract.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::WorkingCalendar;
use crate::config::AbsenceCatalog;
use crate::error::EngineResult;
use crate::models::{
    Absence, AmountType, AuditTrace, Contract, DateInterval, InitializationGroup, Person,
    TakeCountBehaviour, VacationCode, VacationPeriod, days_in_year, first_day_of_year,
    last_day_of_year,
};

use super::period::AbsencePeriod;

/// Vacation of the previous year, usable until August 31st.
pub const PREVIOUS_YEAR_CODE: &str = "31";
/// Vacation of the current year.
pub const CURRENT_YEAR_CODE: &str = "32";
/// Vacation of the previous year, after August 31st.
pub const PREVIOUS_YEAR_EXTENSION_CODE: &str = "37";
/// Law permission (ex L. 937/77).
pub const LAW_PERMISSION_CODE: &str = "94";

const VACATION_GROUP: &str = "FERIE_CNR";
const PERMISSION_GROUP: &str = "RIPOSI_CNR";

/// Which entitlement a summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSummary {
    /// Vacation days.
    Vacation,
    /// Law permission days.
    Permission,
}

/// Whole days accrued over `days` of a year with `yearly` days of entitlement.
///
/// The proportion is rounded half away from zero.
///
/// # Example
///
/// ```
/// use epas_engine::absences::accrued_days;
///
/// assert_eq!(accrued_days(365, 28, 2025), 28);
/// assert_eq!(accrued_days(59, 28, 2025), 5);
/// ```
pub fn accrued_days(days: i64, yearly: i64, year: i32) -> i64 {
    let proportion = Decimal::from(days * yearly) / Decimal::from(days_in_year(year));
    proportion
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Builds the accrual chain of one year for a contract.
pub struct VacationChainBuilder<'a> {
    contract: &'a Contract,
    vacation_periods: &'a [VacationPeriod],
}

impl<'a> VacationChainBuilder<'a> {
    /// Creates a builder for `contract` and its vacation periods.
    pub fn new(contract: &'a Contract, vacation_periods: &'a [VacationPeriod]) -> Self {
        Self {
            contract,
            vacation_periods,
        }
    }

    /// Builds the chain of `year` for the given entitlement.
    ///
    /// Returns `None` when the contract does not cover any day of the year
    /// or no vacation period applies to it.
    ///
    /// # Arguments
    ///
    /// * `year` - The accrual year
    /// * `type_summary` - Vacation or law permission
    /// * `initialization` - Baseline, attached to the sub-period containing its date
    /// * `reducing_absences` - Absences reducing accrual; those inside the year are applied
    pub fn build(
        &self,
        year: i32,
        type_summary: TypeSummary,
        initialization: Option<&InitializationGroup>,
        reducing_absences: &[Absence],
    ) -> EngineResult<Option<AbsencePeriod>> {
        let contract_interval = self.contract.interval()?;
        let Some(window) = DateInterval::year(year).intersect(&contract_interval) else {
            return Ok(None);
        };

        let (group, code) = match type_summary {
            TypeSummary::Vacation => (VACATION_GROUP, CURRENT_YEAR_CODE),
            TypeSummary::Permission => (PERMISSION_GROUP, LAW_PERMISSION_CODE),
        };
        let person_id = self.contract.person_id.as_str();

        let mut sub_periods = Vec::new();
        for (interval, vacation_code, split_first) in self.segments(&window)? {
            let mut sub = self.sub_period(group, code, interval)?;
            let days = accrued_days(
                interval.day_in_interval(),
                yearly_days(vacation_code, type_summary),
                year,
            );
            sub.vacation_code = Some(vacation_code);
            sub.vacation_amount_before_fix_post_partum = days;
            sub.set_fixed_period_takable_amount(days);
            let index = sub_periods.len();
            match split_first {
                Some(true) => sub.splitted_with = Some(index + 1),
                Some(false) => sub.splitted_with = index.checked_sub(1),
                None => {}
            }
            sub_periods.push(sub);
        }
        if sub_periods.is_empty() {
            return Ok(None);
        }

        let reducing: Vec<Absence> = reducing_absences
            .iter()
            .filter(|a| window.contains(a.date))
            .cloned()
            .collect();
        fix_post_partum(&mut sub_periods, reducing.len() as i64, year, type_summary);
        // The initialization patch leaves accrued amounts as they are.
        for sub in &mut sub_periods {
            sub.vacation_amount_before_initialization_patch = sub.fixed_period_takable_amount() / 100;
        }

        if type_summary == TypeSummary::Vacation {
            let tail_begin = first_day_of_year(year + 1);
            let august = NaiveDate::from_ymd_opt(year + 1, 8, 31).unwrap_or(NaiveDate::MAX);
            if contract_interval.contains(tail_begin) {
                let tail_end = august.min(contract_interval.end);
                sub_periods.push(self.sub_period(
                    group,
                    PREVIOUS_YEAR_CODE,
                    DateInterval::new(tail_begin, tail_end)?,
                )?);

                let extension_begin = august.succ_opt().unwrap_or(august);
                if contract_interval.contains(extension_begin) {
                    let extension_end = last_day_of_year(year + 1).min(contract_interval.end);
                    sub_periods.push(self.sub_period(
                        group,
                        PREVIOUS_YEAR_EXTENSION_CODE,
                        DateInterval::new(extension_begin, extension_end)?,
                    )?);
                }
            }
        }

        if let Some(init) = initialization {
            match sub_periods
                .iter_mut()
                .find(|p| p.period_interval().contains(init.date))
            {
                Some(sub) => sub.set_initialization(init.clone())?,
                None => debug!(date = %init.date, year, "initialization outside the vacation chain"),
            }
        }

        let first = sub_periods[0].from;
        let last = sub_periods[sub_periods.len() - 1].to;
        let mut root = AbsencePeriod::new(person_id, group, first, last)?;
        root.take_amount_type = Some(AmountType::Units);
        root.takable_count_behaviour = TakeCountBehaviour::SumAllPeriod;
        root.taken_count_behaviour = TakeCountBehaviour::SumAllPeriod;
        for sub in &sub_periods {
            root.takable_codes.extend(sub.takable_codes.iter().cloned());
            root.taken_codes.extend(sub.taken_codes.iter().cloned());
        }
        root.reducing_absences = reducing;
        root.sub_periods = sub_periods;

        debug!(
            contract = %self.contract.id,
            year,
            ?type_summary,
            sub_periods = root.sub_periods.len(),
            total = root.period_takable_amount(),
            "vacation chain built"
        );
        Ok(Some(root))
    }

    // Intervals of the vacation periods inside `window`, split at the first
    // contract anniversary. The flag marks the halves of a split.
    fn segments(
        &self,
        window: &DateInterval,
    ) -> EngineResult<Vec<(DateInterval, VacationCode, Option<bool>)>> {
        let anniversary = self.contract.first_year_end();
        let mut periods = self.vacation_periods.to_vec();
        periods.sort_by_key(|p| p.begin_date);

        let mut segments = Vec::new();
        for period in &periods {
            let Some(segment) = period.interval()?.intersect(window) else {
                continue;
            };
            if segment.begin < anniversary && anniversary <= segment.end {
                let before_end = anniversary.pred_opt().unwrap_or(anniversary);
                segments.push((
                    DateInterval::new(segment.begin, before_end)?,
                    period.vacation_code,
                    Some(true),
                ));
                segments.push((
                    DateInterval::new(anniversary, segment.end)?,
                    period.vacation_code,
                    Some(false),
                ));
            } else {
                segments.push((segment, period.vacation_code, None));
            }
        }
        Ok(segments)
    }

    fn sub_period(
        &self,
        group: &str,
        code: &str,
        interval: DateInterval,
    ) -> EngineResult<AbsencePeriod> {
        let mut sub = AbsencePeriod::new(
            self.contract.person_id.as_str(),
            group,
            interval.begin,
            interval.end,
        )?;
        sub.take_amount_type = Some(AmountType::Units);
        sub.takable_codes.insert(code.to_string());
        sub.taken_codes.insert(code.to_string());
        Ok(sub)
    }
}

fn yearly_days(code: VacationCode, type_summary: TypeSummary) -> i64 {
    match type_summary {
        TypeSummary::Vacation => code.vacation_days(),
        TypeSummary::Permission => code.permission_days(),
    }
}

// Reducing days are taken off the accrual starting from the last sub-period.
fn fix_post_partum(sub_periods: &mut [AbsencePeriod], reducing: i64, year: i32, type_summary: TypeSummary) {
    let mut to_assign = reducing;
    for sub in sub_periods.iter_mut().rev() {
        if to_assign == 0 {
            break;
        }
        let Some(code) = sub.vacation_code else {
            continue;
        };
        let days = sub.period_interval().day_in_interval();
        let assigned = to_assign.min(days);
        to_assign -= assigned;
        let fixed = accrued_days(days - assigned, yearly_days(code, type_summary), year);
        sub.set_fixed_period_takable_amount(fixed);
    }
}

/// The situation of one entitlement (vacation or permissions) for one year.
#[derive(Debug, Clone, Serialize)]
pub struct VacationSummary {
    /// Vacation or permission.
    pub type_summary: TypeSummary,
    /// Accrual year.
    pub year: i32,
    /// Reference date: decides what is accrued and what is expired.
    pub date: NaiveDate,
    /// The person.
    pub person: Person,
    /// The contract.
    pub contract: Contract,
    /// The scanned accrual chain.
    pub absence_period: AbsencePeriod,
    /// Trace of the scan of the chain.
    pub trace: AuditTrace,
}

impl VacationSummary {
    /// Wraps a scanned chain.
    pub fn new(
        person: Person,
        contract: Contract,
        absence_period: AbsencePeriod,
        year: i32,
        date: NaiveDate,
        type_summary: TypeSummary,
    ) -> Self {
        Self {
            type_summary,
            year,
            date,
            person,
            contract,
            absence_period,
            trace: AuditTrace::default(),
        }
    }

    fn subs(&self) -> &[AbsencePeriod] {
        self.absence_period.chain()
    }

    /// Total days of the year.
    pub fn total(&self) -> i64 {
        self.absence_period
            .compute_period_takable_amount(TakeCountBehaviour::SumAllPeriod, self.date)
            / 100
    }

    /// Absences that reduced the accrual.
    pub fn post_partum(&self) -> &[Absence] {
        &self.absence_period.reducing_absences
    }

    /// Days accrued at the reference date.
    pub fn accrued(&self) -> i64 {
        self.absence_period
            .compute_period_takable_amount(TakeCountBehaviour::SumUntilPeriod, self.date)
            / 100
    }

    /// Returns true if the chain starts with the contract.
    pub fn is_contract_lower_limit(&self) -> bool {
        self.contract.begin_date == self.absence_period.from
    }

    /// First day of the chain.
    pub fn lower_limit(&self) -> NaiveDate {
        self.absence_period.from
    }

    /// Returns true if the days can be used until the end of the contract.
    pub fn is_contract_upper_limit(&self) -> bool {
        self.contract.calculated_end() == Some(self.upper_limit())
    }

    /// Last day the days can be used, extensions excluded.
    pub fn upper_limit(&self) -> NaiveDate {
        self.last_natural_sub_period().to
    }

    /// Days used.
    pub fn used(&self) -> i64 {
        self.absence_period
            .compute_period_taken_amount(TakeCountBehaviour::SumAllPeriod, self.last_sub_period().to)
            / 100
    }

    /// Days that can be used at the reference date.
    ///
    /// During the first contract year only accrued days can be used.
    pub fn usable(&self) -> i64 {
        if self.expired() {
            return 0;
        }
        if self.date < self.contract.first_year_end() {
            self.accrued() - self.used()
        } else {
            self.total() - self.used()
        }
    }

    /// Returns true if the days can no longer be used at the reference date.
    pub fn expired(&self) -> bool {
        self.last_natural_sub_period().to <= self.date
    }

    /// Days left regardless of accrual and expiry.
    pub fn usable_total(&self) -> i64 {
        self.total() - self.used()
    }

    /// The last sub-period, skipping a trailing extension.
    pub fn last_natural_sub_period(&self) -> &AbsencePeriod {
        let subs = self.subs();
        let last = &subs[subs.len() - 1];
        if subs.len() > 1 && last.taken_codes.contains(PREVIOUS_YEAR_EXTENSION_CODE) {
            return &subs[subs.len() - 2];
        }
        last
    }

    /// The last sub-period.
    pub fn last_sub_period(&self) -> &AbsencePeriod {
        let subs = self.subs();
        &subs[subs.len() - 1]
    }

    fn last_effective_sub_period(&self) -> Option<usize> {
        self.subs().iter().rposition(|p| p.vacation_code.is_some())
    }

    /// Days declared by initializations.
    pub fn sourced(&self) -> i64 {
        self.subs()
            .iter()
            .filter_map(|p| p.initialization.as_ref())
            .map(|i| i.units_input)
            .sum()
    }

    /// Absences used after the initializations.
    pub fn absences_used(&self) -> Vec<&Absence> {
        self.subs()
            .iter()
            .flat_map(|p| p.taken_absences())
            .filter(|t| !t.before_initialization)
            .map(|t| &t.absence)
            .collect()
    }

    /// Days of the year that contributed to the accrual.
    pub fn accrued_day_total(&self) -> i64 {
        self.subs()
            .iter()
            .take_while(|p| p.from.year() == self.year)
            .map(|p| p.period_interval().day_in_interval())
            .sum()
    }

    /// Days of the year that contributed to the accrual up to the reference date.
    pub fn accrued_day(&self) -> i64 {
        self.subs()
            .iter()
            .take_while(|p| p.from.year() == self.year && p.from <= self.date)
            .map(|p| p.period_interval().day_in_interval())
            .sum()
    }

    /// The first contract anniversary, if it falls in the sub-period at `index`.
    pub fn contract_end_first_year_in_period(&self, index: usize) -> Option<NaiveDate> {
        let anniversary = self.contract.first_year_end();
        self.subs()
            .get(index)
            .filter(|p| p.period_interval().contains(anniversary))
            .map(|_| anniversary)
    }

    /// Returns true if the post partum fix changed the sub-period.
    pub fn sub_fixed_post_partum(&self, index: usize) -> bool {
        self.subs().get(index).is_some_and(|p| {
            p.vacation_amount_before_initialization_patch != p.vacation_amount_before_fix_post_partum
        })
    }

    /// Returns true if the sub-period is accrued at the reference date.
    pub fn sub_accrued(&self, index: usize) -> bool {
        self.sub_amount(index) == self.sub_amount_accrued(index)
    }

    /// Days of the sub-period.
    pub fn sub_amount(&self, index: usize) -> i64 {
        self.subs()
            .get(index)
            .map(|p| p.vacation_amount_before_initialization_patch)
            .unwrap_or(0)
    }

    /// Days of the sub-period accrued at the reference date.
    pub fn sub_amount_accrued(&self, index: usize) -> i64 {
        match self.subs().get(index) {
            Some(p) if self.date >= p.from => p.vacation_amount_before_initialization_patch,
            _ => 0,
        }
    }

    /// Days of the sub-period before the post partum fix.
    pub fn sub_amount_before_fixed_post_partum(&self, index: usize) -> i64 {
        self.subs()
            .get(index)
            .map(|p| p.vacation_amount_before_fix_post_partum)
            .unwrap_or(0)
    }

    /// Days of the chain up to the sub-period, included.
    pub fn sub_total_amount(&self, index: usize) -> i64 {
        (0..=index.min(self.subs().len().saturating_sub(1)))
            .map(|i| self.sub_amount(i))
            .sum()
    }

    /// Calendar days covered up to the sub-period, included.
    pub fn sub_day_progression(&self, index: usize) -> i64 {
        self.subs()
            .iter()
            .take(index + 1)
            .map(|p| p.period_interval().day_in_interval())
            .sum()
    }

    /// Post partum days assigned to the sub-period.
    pub fn sub_day_post_partum(&self, index: usize) -> i64 {
        let subs = self.subs();
        let mut to_assign = self.post_partum().len() as i64;
        let mut current = self.last_effective_sub_period();
        while let Some(i) = current {
            if to_assign == 0 {
                return 0;
            }
            let assigned = to_assign.min(subs[i].period_interval().day_in_interval());
            to_assign -= assigned;
            if i == index {
                return assigned;
            }
            current = i.checked_sub(1);
        }
        0
    }

    /// Post partum days assigned from the last sub-period back to this one.
    pub fn sub_day_post_partum_progression(&self, index: usize) -> i64 {
        let mut progress = 0;
        let mut current = self.last_effective_sub_period();
        while let Some(i) = current {
            let assigned = self.sub_day_post_partum(i);
            if assigned == 0 {
                return 0;
            }
            progress += assigned;
            if i == index {
                return progress;
            }
            current = i.checked_sub(1);
        }
        progress
    }

    /// Days of the sub-period that still accrue after the post partum fix.
    pub fn sub_day_to_fix_post_partum(&self, index: usize) -> i64 {
        self.subs()
            .get(index)
            .map(|p| p.period_interval().day_in_interval() - self.sub_day_post_partum(index))
            .unwrap_or(0)
    }

    /// Title of the summary.
    pub fn title(&self) -> String {
        match self.type_summary {
            TypeSummary::Vacation => {
                format!("{} - Riepilogo Ferie {}", self.person.full_name(), self.year)
            }
            TypeSummary::Permission => format!(
                "{} - Riepilogo Permessi Legge {}",
                self.person.full_name(),
                self.year
            ),
        }
    }
}

/// The headline numbers of a [`VacationSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationSummaryCached {
    /// A summary exists for the year.
    pub exists: bool,
    /// Total days.
    pub total: i64,
    /// Accrued days.
    pub accrued: i64,
    /// Used days.
    pub used: i64,
    /// Usable days.
    pub usable: i64,
    /// Days left regardless of accrual and expiry.
    pub usable_total: i64,
    /// The days are expired.
    pub expired: bool,
}

impl VacationSummaryCached {
    /// Caches the numbers of `summary`; a missing summary does not exist.
    pub fn from_summary(summary: Option<&VacationSummary>) -> Self {
        match summary {
            Some(s) => Self {
                exists: true,
                total: s.total(),
                accrued: s.accrued(),
                used: s.used(),
                usable: s.usable(),
                usable_total: s.usable_total(),
                expired: s.expired(),
            },
            None => Self::default(),
        }
    }
}

/// Initializations of the vacation groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacationInitializations {
    /// Previous year vacation.
    #[serde(default)]
    pub last_year: Option<InitializationGroup>,
    /// Current year vacation.
    #[serde(default)]
    pub current_year: Option<InitializationGroup>,
    /// Law permissions.
    #[serde(default)]
    pub permissions: Option<InitializationGroup>,
}

/// The data a vacation situation is computed from.
#[derive(Debug, Clone, Copy)]
pub struct VacationInputs<'a> {
    /// The person.
    pub person: &'a Person,
    /// The contract.
    pub contract: &'a Contract,
    /// Vacation codes of the contract.
    pub vacation_periods: &'a [VacationPeriod],
    /// Absences of the person.
    pub absences: &'a [Absence],
    /// Initializations.
    pub initializations: &'a VacationInitializations,
}

/// Vacation situation of a contract in a year.
#[derive(Debug, Clone, Serialize)]
pub struct VacationSituation {
    /// The person.
    pub person: Person,
    /// The contract.
    pub contract: Contract,
    /// The year.
    pub year: i32,
    /// Reference date.
    pub date: NaiveDate,
    /// Vacation accrued in the previous year.
    pub last_year: Option<VacationSummary>,
    /// Vacation accrued in the year.
    pub current_year: Option<VacationSummary>,
    /// Law permissions of the year.
    pub permissions: Option<VacationSummary>,
    /// Numbers of `last_year`.
    pub last_year_cached: VacationSummaryCached,
    /// Numbers of `current_year`.
    pub current_year_cached: VacationSummaryCached,
    /// Numbers of `permissions`.
    pub permissions_cached: VacationSummaryCached,
}

impl VacationSituation {
    /// Computes the situation of `year` at `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::absences::{VacationInitializations, VacationInputs, VacationSituation};
    /// use epas_engine::calendar::WeekdayCalendar;
    /// use epas_engine::config::AbsenceCatalog;
    /// use epas_engine::models::{AbsenceType, Contract, Person, VacationCode, VacationPeriod};
    /// use chrono::NaiveDate;
    ///
    /// let begin = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    /// let person = Person { id: "p_001".into(), name: "Mario".into(), surname: "Rossi".into(), begin_date: begin };
    /// let contract = Contract::new("c_001", "p_001", begin, None);
    /// let periods = vec![VacationPeriod { begin_date: begin, end_date: None, vacation_code: VacationCode::Code28Plus4 }];
    /// let catalog = AbsenceCatalog::new(vec![AbsenceType::new("32", "Ferie")], vec![]);
    /// let initializations = VacationInitializations::default();
    ///
    /// let inputs = VacationInputs {
    ///     person: &person,
    ///     contract: &contract,
    ///     vacation_periods: &periods,
    ///     absences: &[],
    ///     initializations: &initializations,
    /// };
    /// let situation = VacationSituation::build(
    ///     inputs,
    ///     2025,
    ///     NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
    ///     &catalog,
    ///     &WeekdayCalendar::new(432),
    /// ).unwrap();
    ///
    /// assert_eq!(situation.current_year_cached.total, 28);
    /// assert_eq!(situation.permissions_cached.total, 4);
    /// ```
    pub fn build(
        inputs: VacationInputs<'_>,
        year: i32,
        date: NaiveDate,
        catalog: &AbsenceCatalog,
        calendar: &dyn WorkingCalendar,
    ) -> EngineResult<Self> {
        let reducing: Vec<Absence> = inputs
            .absences
            .iter()
            .filter(|a| catalog.absence_type(&a.code).is_ok_and(|t| t.reduces_accrual))
            .cloned()
            .collect();
        let chains = VacationChainBuilder::new(inputs.contract, inputs.vacation_periods);

        let summary = |chain_year: i32,
                       type_summary: TypeSummary,
                       init: Option<&InitializationGroup>|
         -> EngineResult<Option<VacationSummary>> {
            let Some(mut period) = chains.build(chain_year, type_summary, init, &reducing)? else {
                return Ok(None);
            };
            let trace = period.scan(inputs.absences, catalog, calendar)?;
            let mut summary = VacationSummary::new(
                inputs.person.clone(),
                inputs.contract.clone(),
                period,
                chain_year,
                date,
                type_summary,
            );
            summary.trace = trace;
            Ok(Some(summary))
        };

        let last_year = summary(
            year - 1,
            TypeSummary::Vacation,
            inputs.initializations.last_year.as_ref(),
        )?;
        let current_year = summary(
            year,
            TypeSummary::Vacation,
            inputs.initializations.current_year.as_ref(),
        )?;
        let permissions = summary(
            year,
            TypeSummary::Permission,
            inputs.initializations.permissions.as_ref(),
        )?;

        let situation = Self {
            person: inputs.person.clone(),
            contract: inputs.contract.clone(),
            year,
            date,
            last_year_cached: VacationSummaryCached::from_summary(last_year.as_ref()),
            current_year_cached: VacationSummaryCached::from_summary(current_year.as_ref()),
            permissions_cached: VacationSummaryCached::from_summary(permissions.as_ref()),
            last_year,
            current_year,
            permissions,
        };
        info!(
            contract = %situation.contract.id,
            year,
            %date,
            usable_total = situation.sum_usable_total(),
            "vacation situation computed"
        );
        Ok(situation)
    }

    /// Days left over the previous year, the current year and permissions.
    pub fn sum_usable_total(&self) -> i64 {
        [
            &self.last_year_cached,
            &self.current_year_cached,
            &self.permissions_cached,
        ]
        .into_iter()
        .filter(|c| c.exists)
        .map(|c| c.usable_total)
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;
    use crate::models::{AbsenceType, JustifiedType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn person() -> Person {
        Person {
            id: "p_001".to_string(),
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            begin_date: date(2020, 1, 1),
        }
    }

    fn periods(begin: NaiveDate) -> Vec<VacationPeriod> {
        vec![VacationPeriod {
            begin_date: begin,
            end_date: None,
            vacation_code: VacationCode::Code28Plus4,
        }]
    }

    fn catalog() -> AbsenceCatalog {
        let mut post_partum = AbsenceType::new("24", "");
        post_partum.reduces_accrual = true;
        AbsenceCatalog::new(
            vec![
                AbsenceType::new("31", ""),
                AbsenceType::new("32", ""),
                AbsenceType::new("37", ""),
                AbsenceType::new("94", ""),
                post_partum,
            ],
            vec![],
        )
    }

    fn all_day(d: NaiveDate, code: &str) -> Absence {
        Absence::new(d, code, JustifiedType::AllDay)
    }

    fn summary(
        contract: &Contract,
        year: i32,
        at: NaiveDate,
        absences: &[Absence],
        type_summary: TypeSummary,
    ) -> VacationSummary {
        let periods = periods(contract.begin_date);
        let reducing: Vec<Absence> = absences.iter().filter(|a| a.code == "24").cloned().collect();
        let mut period = VacationChainBuilder::new(contract, &periods)
            .build(year, type_summary, None, &reducing)
            .unwrap()
            .unwrap();
        period
            .scan(absences, &catalog(), &WeekdayCalendar::new(432))
            .unwrap();
        VacationSummary::new(person(), contract.clone(), period, year, at, type_summary)
    }

    // ==========================================================================
    // Accrual
    // ==========================================================================

    #[test]
    fn test_accrued_days_rounds_half_away_from_zero() {
        assert_eq!(accrued_days(183, 1, 2024), 1);
        assert_eq!(accrued_days(182, 1, 2024), 0);
        assert_eq!(accrued_days(366, 28, 2024), 28);
    }

    #[test]
    fn test_full_year_chain() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), None);
        let summary = summary(&contract, 2025, date(2025, 6, 15), &[], TypeSummary::Vacation);

        let subs = summary.absence_period.chain();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].fixed_period_takable_amount(), 2800);
        assert!(subs[1].taken_codes.contains(PREVIOUS_YEAR_CODE));
        assert_eq!(subs[1].to, date(2026, 8, 31));
        assert!(subs[2].taken_codes.contains(PREVIOUS_YEAR_EXTENSION_CODE));
        assert_eq!(subs[2].to, date(2026, 12, 31));

        assert_eq!(summary.total(), 28);
        assert_eq!(summary.usable(), 28);
        assert_eq!(summary.upper_limit(), date(2026, 8, 31));
        assert!(!summary.is_contract_lower_limit());
        assert_eq!(summary.accrued_day_total(), 365);
    }

    #[test]
    fn test_chain_split_at_first_anniversary() {
        let contract = Contract::new("c_001", "p_001", date(2024, 3, 1), None);
        let summary = summary(&contract, 2025, date(2025, 2, 10), &[], TypeSummary::Vacation);

        let subs = summary.absence_period.chain();
        assert_eq!(subs[0].to, date(2025, 2, 28));
        assert_eq!(subs[1].from, date(2025, 3, 1));
        assert_eq!(subs[0].splitted_with, Some(1));
        assert_eq!(subs[1].splitted_with, Some(0));
        // 59 and 306 days of 28
        assert_eq!(summary.sub_amount(0), 5);
        assert_eq!(summary.sub_amount(1), 23);
        assert_eq!(summary.total(), 28);
        assert_eq!(summary.contract_end_first_year_in_period(1), Some(date(2025, 3, 1)));
        assert_eq!(summary.contract_end_first_year_in_period(0), None);

        // first contract year: only accrued days are usable
        assert_eq!(summary.accrued(), 5);
        assert_eq!(summary.usable(), 5);
        assert!(!summary.sub_accrued(1));
        assert!(summary.sub_accrued(0));
        assert_eq!(summary.sub_total_amount(1), 28);
        assert_eq!(summary.sub_day_progression(1), 365);
        assert_eq!(summary.accrued_day(), 59);
    }

    #[test]
    fn test_permissions_expire_with_the_year() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), None);
        let summary = summary(&contract, 2025, date(2025, 12, 31), &[], TypeSummary::Permission);

        assert_eq!(summary.absence_period.chain().len(), 1);
        assert_eq!(summary.total(), 4);
        assert!(summary.expired());
        assert_eq!(summary.usable(), 0);
        assert_eq!(summary.usable_total(), 4);
    }

    #[test]
    fn test_contract_ending_mid_year() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), Some(date(2025, 6, 30)));
        let summary = summary(&contract, 2025, date(2025, 3, 1), &[], TypeSummary::Vacation);

        assert_eq!(summary.absence_period.chain().len(), 1);
        // 181 days of 28
        assert_eq!(summary.total(), 14);
        assert!(summary.is_contract_upper_limit());
        assert_eq!(summary.upper_limit(), date(2025, 6, 30));
    }

    #[test]
    fn test_no_chain_outside_contract() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), Some(date(2024, 6, 30)));
        let periods = periods(contract.begin_date);
        let chain = VacationChainBuilder::new(&contract, &periods)
            .build(2025, TypeSummary::Vacation, None, &[])
            .unwrap();
        assert!(chain.is_none());
    }

    // ==========================================================================
    // Post partum
    // ==========================================================================

    #[test]
    fn test_post_partum_reduces_last_sub_period() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), None);
        let absences: Vec<Absence> = DateInterval::new(date(2025, 1, 1), date(2025, 2, 9))
            .unwrap()
            .days()
            .map(|d| all_day(d, "24"))
            .collect();
        let summary = summary(&contract, 2025, date(2025, 6, 15), &absences, TypeSummary::Vacation);

        assert_eq!(summary.post_partum().len(), 40);
        // 325 days of 28
        assert_eq!(summary.total(), 25);
        assert_eq!(summary.sub_amount_before_fixed_post_partum(0), 28);
        assert!(summary.sub_fixed_post_partum(0));
        assert_eq!(summary.sub_day_post_partum(0), 40);
        assert_eq!(summary.sub_day_post_partum_progression(0), 40);
        assert_eq!(summary.sub_day_to_fix_post_partum(0), 325);
        assert_eq!(summary.sub_day_post_partum(1), 0);
    }

    #[test]
    fn test_post_partum_spills_to_previous_sub_period() {
        let contract = Contract::new("c_001", "p_001", date(2024, 12, 1), None);
        // split on 2025-12-01: 334 + 31 days
        let absences: Vec<Absence> = DateInterval::new(date(2025, 1, 1), date(2025, 2, 9))
            .unwrap()
            .days()
            .map(|d| all_day(d, "24"))
            .collect();
        let summary = summary(&contract, 2025, date(2025, 6, 15), &absences, TypeSummary::Vacation);

        assert_eq!(summary.sub_day_post_partum(1), 31);
        assert_eq!(summary.sub_day_post_partum(0), 9);
        assert_eq!(summary.sub_day_post_partum_progression(0), 40);
        assert_eq!(summary.sub_amount(1), 0);
    }

    // ==========================================================================
    // Situation
    // ==========================================================================

    #[test]
    fn test_situation_counts_previous_and_current_year() {
        let begin = date(2020, 1, 1);
        let person = person();
        let contract = Contract::new("c_001", "p_001", begin, None);
        let periods = periods(begin);
        let absences = vec![
            all_day(date(2025, 2, 3), "31"),
            all_day(date(2025, 2, 4), "31"),
            all_day(date(2025, 5, 5), "32"),
            all_day(date(2025, 5, 6), "94"),
        ];
        let initializations = VacationInitializations::default();
        let inputs = VacationInputs {
            person: &person,
            contract: &contract,
            vacation_periods: &periods,
            absences: &absences,
            initializations: &initializations,
        };

        let situation = VacationSituation::build(
            inputs,
            2025,
            date(2025, 6, 15),
            &catalog(),
            &WeekdayCalendar::new(432),
        )
        .unwrap();

        assert_eq!(situation.last_year_cached.used, 2);
        assert_eq!(situation.last_year_cached.usable, 26);
        assert!(!situation.last_year_cached.expired);
        assert_eq!(situation.current_year_cached.used, 1);
        assert_eq!(situation.permissions_cached.used, 1);
        assert_eq!(situation.sum_usable_total(), 26 + 27 + 3);
        assert_eq!(
            situation.current_year.as_ref().map(|s| s.title()),
            Some("Rossi Mario - Riepilogo Ferie 2025".to_string())
        );
    }

    #[test]
    fn test_initialization_counts_sourced_days() {
        let begin = date(2020, 1, 1);
        let person = person();
        let contract = Contract::new("c_001", "p_001", begin, None);
        let periods = periods(begin);
        let absences = vec![
            all_day(date(2025, 3, 3), "32"),
            all_day(date(2025, 5, 5), "32"),
        ];
        let initializations = VacationInitializations {
            current_year: Some(InitializationGroup {
                date: date(2025, 3, 31),
                units_input: 4,
                hours_input: 0,
                minutes_input: 0,
                average_week_time: 432,
            }),
            ..Default::default()
        };
        let inputs = VacationInputs {
            person: &person,
            contract: &contract,
            vacation_periods: &periods,
            absences: &absences,
            initializations: &initializations,
        };

        let situation = VacationSituation::build(
            inputs,
            2025,
            date(2025, 6, 15),
            &catalog(),
            &WeekdayCalendar::new(432),
        )
        .unwrap();
        let current = situation.current_year.as_ref().unwrap();

        assert_eq!(current.sourced(), 4);
        // the March absence is inside the initialization
        assert_eq!(current.used(), 5);
        assert_eq!(current.absences_used().len(), 1);
    }

    #[test]
    fn test_using_more_than_total_exceeds_limit() {
        let contract = Contract::new("c_001", "p_001", date(2020, 1, 1), Some(date(2025, 1, 31)));
        // 31 days of 28: 2 days
        let absences = vec![
            all_day(date(2025, 1, 13), "32"),
            all_day(date(2025, 1, 14), "32"),
            all_day(date(2025, 1, 15), "32"),
        ];
        let summary = summary(&contract, 2025, date(2025, 1, 20), &absences, TypeSummary::Vacation);

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.usable(), -1);
        assert_eq!(
            summary.absence_period.limit_exceed_date,
            Some(date(2025, 1, 15))
        );
    }
}
