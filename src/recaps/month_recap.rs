//! Monthly work time balance of a contract.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::WorkingCalendar;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, Contract, DateInterval, PersonDay, first_day_of_month, last_day_of_month,
};

/// Compensatory rest code: a day off paid with residual minutes.
pub const COMPENSATORY_REST_CODE: &str = "91";

/// What a month recap is computed from.
pub struct MonthRecapInput<'a> {
    /// The contract.
    pub contract: &'a Contract,
    /// Year of the month.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Days of the person; days outside the month are skipped.
    pub person_days: &'a [PersonDay],
    /// Recap of the month before, when the contract already existed.
    pub previous: Option<&'a ContractMonthRecap>,
    /// Working time of each day.
    pub calendar: &'a dyn WorkingCalendar,
}

/// Residual minutes of a contract at the end of a month.
///
/// Residuals are kept in two buckets: the one carried from the previous
/// year and the one of the current year. Compensatory rests and negative
/// months consume the previous year first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMonthRecap {
    /// The contract.
    pub contract_id: String,
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Days counted.
    pub interval: Option<DateInterval>,
    /// Previous year residual at the start of the month.
    pub init_residual_last_year: i64,
    /// Current year residual at the start of the month.
    pub init_residual_current_year: i64,
    /// Sum of the daily differences (compensatory rest days excluded).
    pub progressive_final_month: i64,
    /// Minutes of compensatory rest taken in the month.
    pub compensatory_rest_minutes: i64,
    /// Compensatory rest minutes charged to the previous year.
    pub compensatory_rest_last_year: i64,
    /// Compensatory rest minutes charged to the current year.
    pub compensatory_rest_current_year: i64,
    /// Number of compensatory rest days.
    pub compensatory_rest_days: usize,
    /// Previous year residual at the end of the month.
    pub remaining_minutes_last_year: i64,
    /// Current year residual at the end of the month.
    pub remaining_minutes_current_year: i64,
    /// Whether the month shows a previous year residual.
    pub has_residual_last_year: bool,
    /// How the residuals were computed.
    pub audit_steps: Vec<AuditStep>,
}

impl ContractMonthRecap {
    /// Computes the recap of a month.
    ///
    /// The starting residuals come from `previous` when it is the recap of
    /// the month before; in January the current year residual of December
    /// becomes the previous year residual and the older one expires.
    /// The contract initialization takes over in the month it falls in, and
    /// months ending before it count nothing. Without a previous recap the
    /// initialization is used when it falls before the month, otherwise
    /// both residuals start at 0.
    ///
    /// # Errors
    ///
    /// Fails when the month is not valid or the contract interval is broken.
    pub fn build(input: MonthRecapInput<'_>) -> EngineResult<Self> {
        let contract = input.contract;
        let month_begin = NaiveDate::from_ymd_opt(input.year, input.month, 1).ok_or_else(|| {
            EngineError::CalculationError {
                message: format!("invalid month {}-{}", input.year, input.month),
            }
        })?;
        let month = DateInterval::new(first_day_of_month(month_begin), last_day_of_month(month_begin))?;
        let mut interval = month.intersect(&contract.interval()?);

        let mut steps = Vec::new();
        let source = contract.source_date_residual;
        let from_previous = input
            .previous
            .filter(|p| p.is_month_before(input.year, input.month));
        let (init_last, init_current) = match (source, from_previous) {
            // the initialization replaces every day up to its date
            (Some(source), _) if source > month.end => {
                interval = None;
                (0, 0)
            }
            (Some(source), _) if month.contains(source) => {
                interval = Self::after_initialization(interval, source);
                Self::source_residuals(contract, source, input.year)
            }
            (_, Some(previous)) => {
                if previous.year == input.year {
                    (
                        previous.remaining_minutes_last_year,
                        previous.remaining_minutes_current_year,
                    )
                } else {
                    (previous.remaining_minutes_current_year, 0)
                }
            }
            (Some(source), None) => Self::source_residuals(contract, source, input.year),
            (None, None) => (0, 0),
        };
        steps.push(step(
            1,
            "init_residuals",
            "Initial Residuals",
            month.begin,
            serde_json::json!({ "previous": input.previous.map(|p| (p.year, p.month)) }),
            serde_json::json!({ "last_year": init_last, "current_year": init_current }),
            format!("starting from {} last year and {} current year minutes", init_last, init_current),
        ));

        let mut progressive = 0;
        let mut rest_days = 0;
        let mut rest_minutes = 0;
        if let Some(interval) = &interval {
            for day in input.person_days.iter().filter(|d| interval.contains(d.date)) {
                let work_minutes = input.calendar.work_minutes_on(day.date);
                if day.absences.iter().any(|a| a.code == COMPENSATORY_REST_CODE) {
                    rest_days += 1;
                    rest_minutes += work_minutes;
                } else {
                    progressive += day.difference(work_minutes);
                }
            }
        }

        let mut last = init_last;
        let mut current = init_current;

        let rest_last = rest_minutes.min(last.max(0));
        last -= rest_last;
        let rest_current = rest_minutes - rest_last;
        current -= rest_current;

        if progressive >= 0 {
            current += progressive;
        } else {
            let negative = -progressive;
            let from_last = negative.min(last.max(0));
            last -= from_last;
            current -= negative - from_last;
        }
        steps.push(step(
            2,
            "month_balance",
            "Month Balance",
            month.end,
            serde_json::json!({
                "progressive": progressive,
                "compensatory_rest_minutes": rest_minutes,
            }),
            serde_json::json!({ "last_year": last, "current_year": current }),
            format!(
                "{} rest minutes ({} last year, {} current year), progressive {}",
                rest_minutes, rest_last, rest_current, progressive
            ),
        ));

        let has_residual_last_year = contract.interval()?.contains(
            NaiveDate::from_ymd_opt(input.year - 1, 12, 31).unwrap_or(NaiveDate::MIN),
        ) || init_last != 0;

        debug!(
            contract = %contract.id,
            year = input.year,
            month = input.month,
            progressive,
            last_year = last,
            current_year = current,
            "month recap computed"
        );

        Ok(Self {
            contract_id: contract.id.clone(),
            year: input.year,
            month: input.month,
            interval,
            init_residual_last_year: init_last,
            init_residual_current_year: init_current,
            progressive_final_month: progressive,
            compensatory_rest_minutes: rest_minutes,
            compensatory_rest_last_year: rest_last,
            compensatory_rest_current_year: rest_current,
            compensatory_rest_days: rest_days,
            remaining_minutes_last_year: last,
            remaining_minutes_current_year: current,
            has_residual_last_year,
            audit_steps: steps,
        })
    }

    /// Positive part of the month progressive.
    pub fn progressive_final_positive(&self) -> i64 {
        self.progressive_final_month.max(0)
    }

    /// Negative part of the month progressive, as a positive number.
    pub fn progressive_final_negative(&self) -> i64 {
        (-self.progressive_final_month).max(0)
    }

    /// Residual of both buckets at the end of the month.
    pub fn residual_total(&self) -> i64 {
        self.remaining_minutes_last_year + self.remaining_minutes_current_year
    }

    /// Returns true if the contract initialization falls in `year`-`month`.
    pub fn residual_init_in_year_month(contract: &Contract, year: i32, month: u32) -> bool {
        contract
            .source_date_residual
            .is_some_and(|d| d.year() == year && d.month() == month)
    }

    fn after_initialization(
        interval: Option<DateInterval>,
        source: NaiveDate,
    ) -> Option<DateInterval> {
        let from = source.succ_opt()?;
        interval.and_then(|i| DateInterval::new(from.max(i.begin), i.end).ok())
    }

    // Residuals declared at `source`, seen from `year`.
    fn source_residuals(contract: &Contract, source: NaiveDate, year: i32) -> (i64, i64) {
        if source.year() == year {
            (
                contract.source_remaining_minutes_last_year,
                contract.source_remaining_minutes_current_year,
            )
        } else {
            (
                contract.source_remaining_minutes_current_year
                    + contract.source_remaining_minutes_last_year,
                0,
            )
        }
    }

    fn is_month_before(&self, year: i32, month: u32) -> bool {
        if month == 1 {
            self.year == year - 1 && self.month == 12
        } else {
            self.year == year && self.month == month - 1
        }
    }
}

fn step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    date: NaiveDate,
    input: serde_json::Value,
    output: serde_json::Value,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        group_code: COMPENSATORY_REST_CODE.to_string(),
        date,
        input,
        output,
        reasoning,
    }
}

/// Recaps of consecutive months, each starting from the one before.
///
/// # Example
///
/// ```
/// use epas_engine::calendar::WeekdayCalendar;
/// use epas_engine::models::{Contract, PersonDay};
/// use epas_engine::recaps::month_recaps;
/// use chrono::NaiveDate;
///
/// let begin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let contract = Contract::new("c_001", "p_001", begin, None);
/// let mut day = PersonDay::new("p_001", NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
/// day.time_at_work = 492;
///
/// let recaps = month_recaps(&contract, &[day], 2025, 1, 2025, 2, &WeekdayCalendar::new(432)).unwrap();
///
/// assert_eq!(recaps.len(), 2);
/// assert_eq!(recaps[1].remaining_minutes_current_year, 60);
/// ```
pub fn month_recaps(
    contract: &Contract,
    person_days: &[PersonDay],
    from_year: i32,
    from_month: u32,
    to_year: i32,
    to_month: u32,
    calendar: &dyn WorkingCalendar,
) -> EngineResult<Vec<ContractMonthRecap>> {
    let mut recaps: Vec<ContractMonthRecap> = Vec::new();
    let (mut year, mut month) = (from_year, from_month);
    while (year, month) <= (to_year, to_month) {
        let recap = ContractMonthRecap::build(MonthRecapInput {
            contract,
            year,
            month,
            person_days,
            previous: recaps.last(),
            calendar,
        })?;
        recaps.push(recap);
        (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    }
    Ok(recaps)
}
