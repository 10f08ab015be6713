//! JSON requests and reports of the vacation situation.
//!
//! A request carries everything the engine needs about one contract: the
//! person, the contract with its vacation codes, the absences and the
//! initializations. The report is what the `vacation_situation` binary
//! prints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::absences::{
    TypeSummary, VacationInitializations, VacationInputs, VacationSituation, VacationSummary,
    VacationSummaryCached,
};
use crate::calendar::{PublicHoliday, WeekdayCalendar};
use crate::config::EpasConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{Absence, AuditStep, AuditWarning, Contract, Person, VacationPeriod};

/// A vacation situation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationSituationRequest {
    /// The person.
    pub person: Person,
    /// The contract.
    pub contract: Contract,
    /// Vacation codes of the contract.
    pub vacation_periods: Vec<VacationPeriod>,
    /// Absences of the person.
    #[serde(default)]
    pub absences: Vec<Absence>,
    /// Initializations of the vacation groups.
    #[serde(default)]
    pub initializations: VacationInitializations,
    /// The year.
    pub year: i32,
    /// Reference date.
    pub date: NaiveDate,
    /// Public holidays of the office.
    #[serde(default)]
    pub public_holidays: Vec<PublicHoliday>,
}

impl VacationSituationRequest {
    /// Decodes a request.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] naming `source_name` when the
    /// JSON does not decode.
    pub fn from_json(json: &str, source_name: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidRequest {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// The calendar of the request: weekdays, office working time and holidays.
    pub fn calendar(&self, daily_work_minutes: i64) -> WeekdayCalendar {
        self.public_holidays
            .iter()
            .fold(WeekdayCalendar::new(daily_work_minutes), |calendar, h| {
                calendar.with_holiday(h.date, h.name.clone())
            })
    }

    /// Computes the situation and its report.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use epas_engine::config::ConfigLoader;
    /// use epas_engine::requests::VacationSituationRequest;
    ///
    /// let loader = ConfigLoader::load("./config/epas").unwrap();
    /// let json = std::fs::read_to_string("request.json").unwrap();
    /// let request = VacationSituationRequest::from_json(&json, "request.json").unwrap();
    ///
    /// let report = request.evaluate(loader.config()).unwrap();
    /// println!("{}", report.sum_usable_total);
    /// ```
    pub fn evaluate(&self, config: &EpasConfig) -> EngineResult<VacationSituationReport> {
        let report_id = Uuid::new_v4();
        info!(%report_id, contract = %self.contract.id, year = self.year, "evaluating vacation situation");

        let calendar = self.calendar(config.office().daily_work_minutes);
        let inputs = VacationInputs {
            person: &self.person,
            contract: &self.contract,
            vacation_periods: &self.vacation_periods,
            absences: &self.absences,
            initializations: &self.initializations,
        };
        let situation =
            VacationSituation::build(inputs, self.year, self.date, config.catalog(), &calendar)?;

        let report = VacationSituationReport::new(report_id, &situation);
        if report.critical_errors {
            warn!(%report_id, "vacation situation has critical errors");
        }
        Ok(report)
    }
}

/// One sub-period of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPeriodReport {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
    /// Codes used in the sub-period.
    pub codes: Vec<String>,
    /// Vacation code, none for the usage tail.
    pub vacation_code: Option<String>,
    /// Days of the sub-period.
    pub amount: i64,
    /// Days accrued at the reference date.
    pub accrued: i64,
    /// Days before the post partum fix.
    pub amount_before_post_partum: i64,
    /// Post partum days assigned.
    pub post_partum_days: i64,
}

/// One summary of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Title.
    pub title: String,
    /// Vacation or permission.
    pub type_summary: TypeSummary,
    /// Accrual year.
    pub year: i32,
    /// First day of the chain.
    pub lower_limit: NaiveDate,
    /// Last day the days can be used.
    pub upper_limit: NaiveDate,
    /// Headline numbers.
    pub numbers: VacationSummaryCached,
    /// Days declared by initializations.
    pub sourced: i64,
    /// Absences used, after initializations.
    pub absences_used: Vec<Absence>,
    /// Sub-periods.
    pub sub_periods: Vec<SubPeriodReport>,
    /// Scan steps.
    pub steps: Vec<AuditStep>,
    /// Scan warnings.
    pub warnings: Vec<AuditWarning>,
}

impl SummaryReport {
    fn new(summary: &VacationSummary) -> Self {
        let sub_periods = summary
            .absence_period
            .chain()
            .iter()
            .enumerate()
            .map(|(index, sub)| SubPeriodReport {
                from: sub.from,
                to: sub.to,
                codes: sub.taken_codes.iter().cloned().collect(),
                vacation_code: sub.vacation_code.map(|c| c.name().to_string()),
                amount: summary.sub_amount(index),
                accrued: summary.sub_amount_accrued(index),
                amount_before_post_partum: summary.sub_amount_before_fixed_post_partum(index),
                post_partum_days: summary.sub_day_post_partum(index),
            })
            .collect();

        Self {
            title: summary.title(),
            type_summary: summary.type_summary,
            year: summary.year,
            lower_limit: summary.lower_limit(),
            upper_limit: summary.upper_limit(),
            numbers: VacationSummaryCached::from_summary(Some(summary)),
            sourced: summary.sourced(),
            absences_used: summary.absences_used().into_iter().cloned().collect(),
            sub_periods,
            steps: summary.trace.steps.clone(),
            warnings: summary.trace.warnings.clone(),
        }
    }
}

/// The vacation situation as printed by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationSituationReport {
    /// Identifier of the evaluation.
    pub report_id: Uuid,
    /// Engine version.
    pub engine_version: String,
    /// Person, "Surname Name".
    pub person: String,
    /// Contract.
    pub contract_id: String,
    /// Year.
    pub year: i32,
    /// Reference date.
    pub date: NaiveDate,
    /// Previous year vacation.
    pub last_year: Option<SummaryReport>,
    /// Current year vacation.
    pub current_year: Option<SummaryReport>,
    /// Law permissions.
    pub permissions: Option<SummaryReport>,
    /// Days left over the three summaries.
    pub sum_usable_total: i64,
    /// Some chain could not be computed reliably.
    pub critical_errors: bool,
}

impl VacationSituationReport {
    /// Builds the report of a computed situation.
    pub fn new(report_id: Uuid, situation: &VacationSituation) -> Self {
        let summaries = [
            &situation.last_year,
            &situation.current_year,
            &situation.permissions,
        ];
        let critical_errors = summaries
            .iter()
            .filter_map(|s| s.as_ref())
            .any(|s| s.absence_period.contains_critical_errors());

        Self {
            report_id,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            person: situation.person.full_name(),
            contract_id: situation.contract.id.clone(),
            year: situation.year,
            date: situation.date,
            last_year: situation.last_year.as_ref().map(SummaryReport::new),
            current_year: situation.current_year.as_ref().map(SummaryReport::new),
            permissions: situation.permissions.as_ref().map(SummaryReport::new),
            sum_usable_total: situation.sum_usable_total(),
            critical_errors,
        }
    }
}
