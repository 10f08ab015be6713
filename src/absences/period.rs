//! Absence periods: the window in which a group counts its absences.
//!
//! An [`AbsencePeriod`] holds the limits of a group for a date range and the
//! absences that fell inside it. A period may be split into contiguous
//! sub-periods (vacation accrual is); the count behaviours decide whether
//! totals are read from the period alone or summed along the chain.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::slice;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::calendar::WorkingCalendar;
use crate::config::AbsenceCatalog;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, AbsenceType, AmountType, AuditStep, AuditTrace, DateInterval, InitializationGroup,
    TakeCountBehaviour, VacationCode,
};

use super::amounts::{
    ReplacingCodesDesc, absence_justified_amount, which_replacing_code, working_type_percent,
};
use super::day_in_period::DayInPeriod;
use super::errors_box::{
    AbsenceProblem, CriticalProblem, ErrorsBox, boxes_contain_critical_errors,
};
use super::taken::{ComplationAbsence, TakenAbsence};

/// A contiguous date range in which a group counts absences.
#[derive(Debug, Clone, Serialize)]
pub struct AbsencePeriod {
    /// The person the period belongs to.
    pub person_id: String,
    /// The group the period belongs to.
    pub group_code: String,
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
    /// Baseline of amounts consumed before the engine took over.
    pub initialization: Option<InitializationGroup>,
    /// The days with absences, in date order.
    pub days: BTreeMap<NaiveDate, DayInPeriod>,
    /// Contiguous sub-periods; empty when the period stands alone.
    pub sub_periods: Vec<AbsencePeriod>,

    /// Unit of the takable amount; `None` when the group has no takable side.
    pub take_amount_type: Option<AmountType>,
    /// How the takable amount is counted.
    pub takable_count_behaviour: TakeCountBehaviour,
    /// How the taken amount is counted.
    pub taken_count_behaviour: TakeCountBehaviour,
    fixed_period_takable_amount: i64,
    /// Codes that can be taken.
    pub takable_codes: BTreeSet<String>,
    /// Codes counted against the takable amount.
    pub taken_codes: BTreeSet<String>,
    /// Earliest day on which the limit was exceeded.
    pub limit_exceed_date: Option<NaiveDate>,

    /// Unit of the completion; `None` when the group has no completion side.
    pub complation_amount_type: Option<AmountType>,
    /// Replacing codes ordered by replacing time, largest first.
    #[serde(skip)]
    pub replacing_codes_desc: ReplacingCodesDesc,
    /// Replacing time of each replacing code.
    pub replacing_times: HashMap<String, i64>,
    /// Codes whose amounts accumulate into replacing codes.
    pub complation_codes: BTreeSet<String>,

    /// Problems found in the period.
    pub errors_box: ErrorsBox,
    /// The period is skipped by the caller.
    pub ignore_period: bool,
    /// The absence being simulated, if any.
    pub attempted_insert_absence: Option<Absence>,

    /// Absences that reduced the accrued amount (post partum).
    pub reducing_absences: Vec<Absence>,
    /// Accrued days before the post partum reduction.
    pub vacation_amount_before_fix_post_partum: i64,
    /// Accrued days before the initialization patch.
    pub vacation_amount_before_initialization_patch: i64,
    /// The vacation code that generated the sub-period.
    pub vacation_code: Option<VacationCode>,
    /// Index of the other half, for sub-periods split at the first contract year.
    pub splitted_with: Option<usize>,
}

impl AbsencePeriod {
    /// Creates an empty period with no takable or completion side.
    pub fn new(
        person_id: impl Into<String>,
        group_code: impl Into<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Self> {
        DateInterval::new(from, to)?;
        Ok(Self {
            person_id: person_id.into(),
            group_code: group_code.into(),
            from,
            to,
            initialization: None,
            days: BTreeMap::new(),
            sub_periods: Vec::new(),
            take_amount_type: None,
            takable_count_behaviour: TakeCountBehaviour::Period,
            taken_count_behaviour: TakeCountBehaviour::Period,
            fixed_period_takable_amount: 0,
            takable_codes: BTreeSet::new(),
            taken_codes: BTreeSet::new(),
            limit_exceed_date: None,
            complation_amount_type: None,
            replacing_codes_desc: BTreeMap::new(),
            replacing_times: HashMap::new(),
            complation_codes: BTreeSet::new(),
            errors_box: ErrorsBox::default(),
            ignore_period: false,
            attempted_insert_absence: None,
            reducing_absences: Vec::new(),
            vacation_amount_before_fix_post_partum: 0,
            vacation_amount_before_initialization_patch: 0,
            vacation_code: None,
            splitted_with: None,
        })
    }

    /// The interval covered by the period.
    pub fn period_interval(&self) -> DateInterval {
        DateInterval {
            begin: self.from,
            end: self.to,
        }
    }

    /// The periods totals are summed over: the sub-periods, or the period itself.
    pub fn chain(&self) -> &[AbsencePeriod] {
        if self.sub_periods.is_empty() {
            slice::from_ref(self)
        } else {
            &self.sub_periods
        }
    }

    pub(crate) fn chain_mut(&mut self) -> &mut [AbsencePeriod] {
        if self.sub_periods.is_empty() {
            slice::from_mut(self)
        } else {
            &mut self.sub_periods
        }
    }

    /// Index in [`chain`](Self::chain) of the period containing `date`.
    pub fn chain_index(&self, date: NaiveDate) -> Option<usize> {
        self.chain()
            .iter()
            .position(|p| p.period_interval().contains(date))
    }

    // ---------------------------------------------------------------------
    // Takable side
    // ---------------------------------------------------------------------

    /// Returns true if the group has a takable side.
    pub fn is_takable(&self) -> bool {
        self.take_amount_type.is_some()
    }

    /// Returns true if the period is takable without limit.
    pub fn is_takable_no_limit(&self) -> bool {
        self.is_takable() && self.period_takable_amount() < 0
    }

    /// Returns true if the period is takable up to a limit.
    pub fn is_takable_with_limit(&self) -> bool {
        self.is_takable() && !self.is_takable_no_limit()
    }

    /// Returns true if the limit is counted in units.
    pub fn is_takable_units(&self) -> bool {
        self.is_takable_with_limit() && self.take_amount_type == Some(AmountType::Units)
    }

    /// Returns true if the limit is counted in minutes.
    pub fn is_takable_minutes(&self) -> bool {
        self.is_takable_with_limit() && self.take_amount_type == Some(AmountType::Minutes)
    }

    /// Sets the fixed takable amount; unit amounts are given in days.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::absences::AbsencePeriod;
    /// use epas_engine::models::AmountType;
    /// use chrono::NaiveDate;
    ///
    /// let mut period = AbsencePeriod::new(
    ///     "p_001",
    ///     "G_18",
    ///     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
    /// ).unwrap();
    /// period.take_amount_type = Some(AmountType::Units);
    /// period.set_fixed_period_takable_amount(3);
    ///
    /// assert_eq!(period.fixed_period_takable_amount(), 300);
    /// ```
    pub fn set_fixed_period_takable_amount(&mut self, amount: i64) {
        self.fixed_period_takable_amount = match self.take_amount_type {
            Some(AmountType::Units) => amount * 100,
            _ => amount,
        };
    }

    /// Overrides the fixed takable amount with an already scaled value.
    pub(crate) fn set_scaled_fixed_amount(&mut self, amount: i64) {
        self.fixed_period_takable_amount = amount;
    }

    /// The fixed takable amount (hundredths for unit amounts).
    pub fn fixed_period_takable_amount(&self) -> i64 {
        self.fixed_period_takable_amount
    }

    /// The takable amount of the period.
    pub fn period_takable_amount(&self) -> i64 {
        self.compute_period_takable_amount(self.takable_count_behaviour, self.from)
    }

    /// The takable amount counted with `behaviour` at `date`.
    ///
    /// # Arguments
    ///
    /// * `behaviour` - `Period` reads the fixed amount, `SumAllPeriod` sums
    ///   the whole chain, `SumUntilPeriod` the sub-periods starting on or
    ///   before `date`
    /// * `date` - Reference date for `SumUntilPeriod`
    pub fn compute_period_takable_amount(
        &self,
        behaviour: TakeCountBehaviour,
        date: NaiveDate,
    ) -> i64 {
        match behaviour {
            TakeCountBehaviour::Period => self.fixed_period_takable_amount,
            TakeCountBehaviour::SumAllPeriod => self
                .chain()
                .iter()
                .map(|p| p.fixed_period_takable_amount)
                .sum(),
            TakeCountBehaviour::SumUntilPeriod => self
                .chain()
                .iter()
                .take_while(|p| p.from <= date)
                .map(|p| p.fixed_period_takable_amount)
                .sum(),
        }
    }

    /// The taken amount of the period.
    pub fn period_taken_amount(&self) -> i64 {
        self.compute_period_taken_amount(self.taken_count_behaviour, self.from)
    }

    /// The taken amount counted with `behaviour` at `date`.
    ///
    /// Absences already counted by an initialization are skipped, the
    /// initialization amount is added instead.
    pub fn compute_period_taken_amount(&self, behaviour: TakeCountBehaviour, date: NaiveDate) -> i64 {
        match behaviour {
            TakeCountBehaviour::Period => self.own_taken_amount(),
            TakeCountBehaviour::SumAllPeriod => {
                self.chain().iter().map(AbsencePeriod::own_taken_amount).sum()
            }
            TakeCountBehaviour::SumUntilPeriod => self
                .chain()
                .iter()
                .take_while(|p| p.from <= date)
                .map(AbsencePeriod::own_taken_amount)
                .sum(),
        }
    }

    fn own_taken_amount(&self) -> i64 {
        self.initialization_takable_used()
            + self
                .taken_absences()
                .filter(|t| !t.before_initialization)
                .map(|t| t.taken_amount)
                .sum::<i64>()
    }

    /// Takable amount minus taken amount.
    pub fn remaining_amount(&self) -> i64 {
        self.period_takable_amount() - self.period_taken_amount()
    }

    /// The taken absences of the period itself, in date order.
    pub fn taken_absences(&self) -> impl Iterator<Item = &TakenAbsence> {
        self.days.values().flat_map(|d| d.taken_absences.iter())
    }

    /// Builds the taken record of `absence` against the current totals.
    pub fn build_taken_absence(&self, absence: &Absence, taken_amount: i64) -> TakenAbsence {
        let before_initialization = self
            .initialization
            .as_ref()
            .is_some_and(|init| absence.date <= init.date)
            || self.sub_periods.iter().any(|p| {
                p.period_interval().contains(absence.date)
                    && p.initialization
                        .as_ref()
                        .is_some_and(|init| absence.date <= init.date)
            });

        TakenAbsence {
            absence: absence.clone(),
            amount_type: self.take_amount_type.unwrap_or(AmountType::Units),
            period_takable_total: self.period_takable_amount(),
            period_taken_before: self.period_taken_amount(),
            taken_amount,
            before_initialization,
        }
    }

    /// Adds a taken absence to the period (or sub-period) of its day.
    pub fn add_taken_absence(&mut self, taken_absence: TakenAbsence) {
        let date = taken_absence.absence.date;
        if let Some(period) = self.period_for_date_mut(date) {
            period.day_in_period(date).taken_absences.push(taken_absence);
        }
    }

    /// Keeps the earliest day on which the limit was exceeded.
    pub fn set_limit_exceeded_date(&mut self, date: NaiveDate) {
        if self.limit_exceed_date.is_none_or(|current| current > date) {
            self.limit_exceed_date = Some(date);
        }
    }

    // ---------------------------------------------------------------------
    // Completion side
    // ---------------------------------------------------------------------

    /// Returns true if the group has a completion side.
    pub fn is_complation(&self) -> bool {
        self.complation_amount_type.is_some()
    }

    /// Returns true if completions are counted in units.
    pub fn is_complation_units(&self) -> bool {
        self.complation_amount_type == Some(AmountType::Units)
    }

    /// Returns true if completions are counted in minutes.
    pub fn is_complation_minutes(&self) -> bool {
        self.complation_amount_type == Some(AmountType::Minutes)
    }

    /// Registers a replacing code with its replacing time.
    ///
    /// Returns false if another code valid on the same days already uses
    /// that time.
    pub fn add_replacing_code(&mut self, absence_type: AbsenceType, time: i64) -> bool {
        let codes = self.replacing_codes_desc.entry(Reverse(time)).or_default();
        let overlaps = codes.iter().any(|other| validity_overlaps(other, &absence_type));
        self.replacing_times.insert(absence_type.code.clone(), time);
        codes.push(absence_type);
        !overlaps
    }

    /// Adds a completion absence; a second one on the same day compromises it.
    pub fn add_complation_absence(&mut self, absence: &Absence) {
        let compromised = self
            .period_for_date_mut(absence.date)
            .map(|period| {
                let day = period.day_in_period(absence.date);
                let compromised = !day.existent_complations.is_empty();
                day.existent_complations.push(absence.clone());
                compromised
            })
            .unwrap_or(false);
        if compromised {
            self.errors_box
                .add_absence_error(absence, AbsenceProblem::CompromisedTwoComplation);
        }
    }

    /// Adds a replacing absence.
    pub fn add_replacing_absence(&mut self, absence: &Absence) {
        if let Some(period) = self.period_for_date_mut(absence.date) {
            period
                .day_in_period(absence.date)
                .existent_replacings
                .push(absence.clone());
        }
    }

    /// Computes the replacing code each completion day requires.
    ///
    /// Starting from the initialization residual, the justified amount of
    /// every completion absence after the initialization accumulates; when
    /// the residual reaches a replacing time the largest fitting code becomes
    /// the correct replacing of the day and its time is subtracted.
    pub fn compute_correct_replacing_in_period(
        &mut self,
        catalog: &AbsenceCatalog,
        calendar: &dyn WorkingCalendar,
        trace: &mut AuditTrace,
    ) -> EngineResult<()> {
        let Some(amount_type) = self.complation_amount_type else {
            return Ok(());
        };

        let init_date = self.initialization.as_ref().map(|i| i.date);
        let mut residual = self.initialization_complation_used();
        let dates: Vec<NaiveDate> = self
            .chain_days()
            .filter(|day| {
                init_date.is_none_or(|init| day.date > init) && !day.existent_complations.is_empty()
            })
            .map(|day| day.date)
            .collect();

        for date in dates {
            let Some(day) = self.chain_days().find(|d| d.date == date) else {
                continue;
            };
            if day.existent_complations.len() > 1 {
                warn!(group = %self.group_code, %date, "two completions on the same day, skipped");
                trace.warn(
                    "COMPROMISED_COMPLATION",
                    format!("{}: two completion absences on {}", self.group_code, date),
                    "medium",
                );
                continue;
            }
            let absence = day.existent_complations[0].clone();
            let absence_type = catalog.absence_type(&absence.code)?;
            let Some(amount) = absence_justified_amount(
                &absence,
                absence_type,
                amount_type,
                calendar.work_minutes_on(date),
            ) else {
                self.errors_box.add_critical_error(
                    date,
                    Some(&absence.code),
                    CriticalProblem::IncalcolableJustifiedAmount,
                );
                continue;
            };

            residual += amount;
            let residual_before = residual - amount;
            let replacing = which_replacing_code(&self.replacing_codes_desc, date, residual).cloned();
            if let Some(code) = &replacing {
                residual -= self.replacing_times.get(&code.code).copied().unwrap_or(0);
            }

            trace.steps.push(AuditStep {
                step_number: trace.next_step_number(),
                rule_id: "correct_replacing".to_string(),
                rule_name: "Correct Replacing".to_string(),
                group_code: self.group_code.clone(),
                date,
                input: serde_json::json!({
                    "code": absence.code,
                    "residual_before": residual_before,
                    "consumed": amount,
                }),
                output: serde_json::json!({
                    "replacing": replacing.as_ref().map(|c| c.code.clone()),
                    "residual_after": residual,
                }),
                reasoning: match &replacing {
                    Some(code) => format!(
                        "{} reached {}, replaced by {}",
                        residual_before + amount,
                        self.replacing_times.get(&code.code).copied().unwrap_or(0),
                        code.code
                    ),
                    None => format!("{} accumulated, no replacing time reached", residual),
                },
            });

            if let Some(period) = self.period_for_date_mut(date) {
                let day = period.day_in_period(date);
                day.correct_replacing = replacing;
                day.complation_absence = Some(ComplationAbsence {
                    absence,
                    amount_type,
                    residual_complation_before: residual_before,
                    consumed_complation: amount,
                    residual_complation_after: residual,
                });
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Days and errors
    // ---------------------------------------------------------------------

    /// The absences of `absences` falling inside the period.
    pub fn filter_absences_in_period<'a>(&self, absences: &'a [Absence]) -> Vec<&'a Absence> {
        let interval = self.period_interval();
        absences
            .iter()
            .filter(|a| interval.contains(a.date))
            .collect()
    }

    /// The day structure for `date`, created if missing.
    pub fn day_in_period(&mut self, date: NaiveDate) -> &mut DayInPeriod {
        self.days
            .entry(date)
            .or_insert_with(|| DayInPeriod::new(date))
    }

    /// The days of every period in [`chain`](Self::chain), in date order.
    pub fn chain_days(&self) -> impl Iterator<Item = &DayInPeriod> {
        self.chain().iter().flat_map(|p| p.days.values())
    }

    fn period_for_date_mut(&mut self, date: NaiveDate) -> Option<&mut AbsencePeriod> {
        self.chain_mut()
            .iter_mut()
            .find(|p| p.period_interval().contains(date))
    }

    /// Returns true if the period or one of its sub-periods has critical errors.
    pub fn contains_critical_errors(&self) -> bool {
        boxes_contain_critical_errors(
            std::iter::once(&self.errors_box).chain(self.sub_periods.iter().map(|p| &p.errors_box)),
        )
    }

    /// Returns true if some day holds two completion absences.
    pub fn is_compromised_complation(&self) -> bool {
        self.errors_box
            .contains_absence_problem(AbsenceProblem::CompromisedTwoComplation)
    }

    /// Clears every result of a previous scan.
    pub(crate) fn reset_scan_state(&mut self) {
        self.days.clear();
        self.errors_box.clear();
        self.limit_exceed_date = None;
        for sub in &mut self.sub_periods {
            sub.reset_scan_state();
        }
    }

    // ---------------------------------------------------------------------
    // Initialization
    // ---------------------------------------------------------------------

    /// Takable amount consumed according to the initialization.
    ///
    /// Minute periods read the hours and minutes; unit periods read the
    /// days plus the minutes as a share of the average daily working time.
    pub fn initialization_takable_used(&self) -> i64 {
        let Some(init) = &self.initialization else {
            return 0;
        };
        let minutes = init.input_minutes();
        if self.is_takable_minutes() {
            minutes
        } else if self.is_takable_units() {
            let mut units = init.units_input * 100;
            if minutes > 0 {
                units += working_type_percent(minutes, init.average_week_time);
            }
            units
        } else {
            0
        }
    }

    /// Completion residual carried by the initialization.
    ///
    /// Units: the part of the minutes that does not make a whole day.
    /// Minutes: what is left after subtracting every replacing time that fits.
    pub fn initialization_complation_used(&self) -> i64 {
        let Some(init) = &self.initialization else {
            return 0;
        };
        let mut minutes = init.input_minutes();
        if self.is_complation_units() {
            working_type_percent(minutes, init.average_week_time) % 100
        } else if self.is_complation_minutes() {
            while let Some(code) = which_replacing_code(&self.replacing_codes_desc, init.date, minutes)
            {
                minutes -= self.replacing_times.get(&code.code).copied().unwrap_or(minutes);
            }
            minutes
        } else {
            0
        }
    }

    /// Attaches an initialization, rejecting one outside the period.
    pub fn set_initialization(&mut self, initialization: InitializationGroup) -> EngineResult<()> {
        if !self.period_interval().contains(initialization.date) {
            return Err(EngineError::InvalidPeriod {
                from: self.from,
                to: self.to,
                message: format!("initialization date {} outside the period", initialization.date),
            });
        }
        self.initialization = Some(initialization);
        Ok(())
    }
}

fn validity_overlaps(a: &AbsenceType, b: &AbsenceType) -> bool {
    let a_from = a.valid_from.unwrap_or(NaiveDate::MIN);
    let a_to = a.valid_to.unwrap_or(NaiveDate::MAX);
    let b_from = b.valid_from.unwrap_or(NaiveDate::MIN);
    let b_to = b.valid_to.unwrap_or(NaiveDate::MAX);
    a_from <= b_to && b_from <= a_to
}
