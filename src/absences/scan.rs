//! Populating a period with absence events.
//!
//! [`AbsencePeriod::scan`] walks the absences of a person in date order and
//! records, on the period or sub-period of their day, what each of them
//! means for the group: a taken amount, a completion, a replacing code.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::calendar::WorkingCalendar;
use crate::config::AbsenceCatalog;
use crate::error::EngineResult;
use crate::models::{Absence, AuditStep, AuditTrace};

use super::amounts::absence_justified_amount;
use super::errors_box::{AbsenceProblem, CriticalProblem};
use super::period::AbsencePeriod;

/// The outcome of simulating the insertion of an absence.
#[derive(Debug, Clone, Serialize)]
pub struct InsertSimulation {
    /// The period scanned with the attempted absence.
    pub period: AbsencePeriod,
    /// Problems raised for the attempted absence.
    pub problems: Vec<AbsenceProblem>,
    /// True if the period became incalculable.
    pub critical: bool,
    /// The audit trace of the scan.
    pub trace: AuditTrace,
}

impl InsertSimulation {
    /// Returns true if the absence can be inserted.
    pub fn is_insertable(&self) -> bool {
        self.problems.is_empty() && !self.critical
    }
}

impl AbsencePeriod {
    /// Every code the period (or one of its sub-periods) is concerned with.
    pub fn involved_codes(&self) -> BTreeSet<String> {
        let mut codes = BTreeSet::new();
        for period in std::iter::once(self).chain(self.sub_periods.iter()) {
            codes.extend(period.takable_codes.iter().cloned());
            codes.extend(period.taken_codes.iter().cloned());
            codes.extend(period.complation_codes.iter().cloned());
            codes.extend(period.replacing_times.keys().cloned());
        }
        codes
    }

    /// Records `absences` in the period and checks the group rules.
    ///
    /// Results of a previous scan are discarded. Absences outside the period
    /// or unrelated to the group are ignored.
    ///
    /// # Errors
    ///
    /// Fails when an absence refers to a code missing from the catalog.
    pub fn scan(
        &mut self,
        absences: &[Absence],
        catalog: &AbsenceCatalog,
        calendar: &dyn WorkingCalendar,
    ) -> EngineResult<AuditTrace> {
        let start = Instant::now();
        let mut trace = AuditTrace::default();
        self.reset_scan_state();

        let involved = self.involved_codes();
        let mut relevant: Vec<&Absence> = self
            .filter_absences_in_period(absences)
            .into_iter()
            .filter(|a| involved.contains(&a.code))
            .collect();
        relevant.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.code.cmp(&b.code)));

        debug!(
            group = %self.group_code,
            from = %self.from,
            to = %self.to,
            absences = relevant.len(),
            "scanning period"
        );

        for absence in relevant {
            let absence_type = catalog.absence_type(&absence.code)?;
            let Some(index) = self.chain_index(absence.date) else {
                continue;
            };
            let target = &self.chain()[index];
            let is_taken = target.taken_codes.contains(&absence.code);
            let is_complation = self.complation_codes.contains(&absence.code);
            let is_replacing = self.replacing_times.contains_key(&absence.code);

            if is_complation {
                self.add_complation_absence(absence);
            }
            if is_replacing {
                self.add_replacing_absence(absence);
            }
            if !is_taken {
                continue;
            }

            let Some(amount_type) = self.take_amount_type else {
                continue;
            };
            let work_minutes = calendar.work_minutes_on(absence.date);
            let Some(amount) =
                absence_justified_amount(absence, absence_type, amount_type, work_minutes)
            else {
                self.errors_box.add_critical_error(
                    absence.date,
                    Some(&absence.code),
                    CriticalProblem::IncalcolableJustifiedAmount,
                );
                trace.warn(
                    "INCALCOLABLE_AMOUNT",
                    format!("{} on {}: justified amount unknown", absence.code, absence.date),
                    "high",
                );
                continue;
            };

            let taken = self.build_taken_absence(absence, amount);
            let exceeded = !taken.before_initialization && taken.exceeds_limit();
            trace.steps.push(AuditStep {
                step_number: trace.next_step_number(),
                rule_id: "taken_absence".to_string(),
                rule_name: "Taken Absence".to_string(),
                group_code: self.group_code.clone(),
                date: absence.date,
                input: serde_json::json!({
                    "code": absence.code,
                    "amount": amount,
                    "taken_before": taken.period_taken_before,
                }),
                output: serde_json::json!({
                    "taken_after": taken.taken_after(),
                    "takable_total": taken.period_takable_total,
                    "before_initialization": taken.before_initialization,
                    "limit_exceeded": exceeded,
                }),
                reasoning: if taken.before_initialization {
                    format!("{} already counted by the initialization", absence.code)
                } else if taken.period_takable_total < 0 {
                    format!("{} of {} taken, no limit", amount, absence.code)
                } else {
                    format!(
                        "{} of {} taken, {} of {} used",
                        amount,
                        absence.code,
                        taken.taken_after(),
                        taken.period_takable_total
                    )
                },
            });
            if exceeded {
                info!(group = %self.group_code, date = %absence.date, code = %absence.code, "limit exceeded");
                self.errors_box
                    .add_absence_error(absence, AbsenceProblem::LimitExceeded);
                self.set_limit_exceeded_date(absence.date);
            }
            self.add_taken_absence(taken);
        }

        self.compute_correct_replacing_in_period(catalog, calendar, &mut trace)?;
        self.check_replacing_problems();

        trace.duration_us = start.elapsed().as_micros() as u64;
        Ok(trace)
    }

    fn check_replacing_problems(&mut self) {
        if !self.is_complation() {
            return;
        }
        let init_date = self.initialization.as_ref().map(|i| i.date);
        let problems: Vec<_> = self
            .chain_days()
            .filter(|day| init_date.is_none_or(|init| day.date > init))
            .flat_map(|day| day.replacing_problem())
            .collect();
        for (absence, problem) in problems {
            self.errors_box.add_absence_error(&absence, problem);
        }
    }

    /// Scans a copy of the period with `absence` added to `absences`.
    ///
    /// The period itself is left untouched. An absence whose code is not
    /// part of the group is reported as [`AbsenceProblem::NotPertinent`].
    pub fn simulate_insert(
        &self,
        absence: &Absence,
        absences: &[Absence],
        catalog: &AbsenceCatalog,
        calendar: &dyn WorkingCalendar,
    ) -> EngineResult<InsertSimulation> {
        let mut period = self.clone();
        period.attempted_insert_absence = Some(absence.clone());

        if !period.involved_codes().contains(&absence.code)
            || !period.period_interval().contains(absence.date)
        {
            period.reset_scan_state();
            period
                .errors_box
                .add_absence_error(absence, AbsenceProblem::NotPertinent);
            return Ok(InsertSimulation {
                problems: vec![AbsenceProblem::NotPertinent],
                critical: false,
                trace: AuditTrace::default(),
                period,
            });
        }

        let mut all: Vec<Absence> = absences.to_vec();
        all.push(absence.clone());
        let trace = period.scan(&all, catalog, calendar)?;

        Ok(InsertSimulation {
            problems: period.errors_box.absence_problems(absence.id),
            critical: period.contains_critical_errors(),
            trace,
            period,
        })
    }
}
