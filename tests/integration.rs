//! Integration tests for the ePAS engine.
//!
//! Every scenario runs against the catalog in `./config/epas`:
//! - Absence periods built from the configured groups
//! - Vacation situations, from JSON requests and from values
//! - Month recaps and compensatory rests
//! - Stamping day recaps feeding the meal ticket balance
//! - Approval flows with the office approval parameters

use chrono::{NaiveDate, NaiveDateTime};

use epas_engine::absences::{
    AbsenceProblem, PeriodBuilder, VacationInitializations, VacationInputs, VacationSituation,
};
use epas_engine::calendar::{WeekdayCalendar, WorkingCalendar};
use epas_engine::config::ConfigLoader;
use epas_engine::error::EngineError;
use epas_engine::flows::{
    AbsenceRequestType, ApprovalFlow, ApprovalStep, CompetenceRequestType, FlowStatus, RequestType,
};
use epas_engine::meal_tickets::MealTicketRecap;
use epas_engine::models::{
    Absence, Contract, InitializationGroup, JustifiedType, MealTicket, Person, PersonDay, Stamping,
    VacationCode, VacationPeriod, WayType,
};
use epas_engine::recaps::{CompensatoryRestCapacity, COMPENSATORY_REST_CODE, month_recaps};
use epas_engine::requests::VacationSituationRequest;
use epas_engine::stampings::{
    DayRecapContext, MealTicketStatus, PairIdSequence, PersonStampingDayRecap, Troubles,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/epas").expect("Failed to load config")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    d.and_hms_opt(h, m, 0).unwrap()
}

fn person() -> Person {
    Person {
        id: "p_001".to_string(),
        name: "Mario".to_string(),
        surname: "Rossi".to_string(),
        begin_date: date(2020, 1, 1),
    }
}

fn permanent_contract() -> Contract {
    Contract::new("c_001", "p_001", date(2020, 1, 1), None)
}

fn worked_day(d: NaiveDate, minutes: i64) -> PersonDay {
    let mut day = PersonDay::new("p_001", d);
    day.time_at_work = minutes;
    day
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_loads_catalog() {
    let loader = load_config();

    assert_eq!(loader.office().daily_work_minutes, 432);
    assert!(loader.absence_type("661").is_ok());
    assert!(loader.group("G_23").is_ok());
    assert!(matches!(
        loader.group("G_MISSING"),
        Err(EngineError::GroupNotFound { .. })
    ));
}

#[test]
fn test_missing_config_directory() {
    let result = ConfigLoader::load("./config/does_not_exist");
    assert!(matches!(result, Err(EngineError::ConfigNotFound { .. })));
}

// =============================================================================
// Absence periods
// =============================================================================

#[test]
fn test_medical_visit_minutes_are_bounded() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(loader.office().daily_work_minutes);
    let builder = PeriodBuilder::new(loader.catalog(), &calendar);
    let contract = permanent_contract();

    let mut period = builder
        .build(loader.group("G_09").unwrap(), &contract, date(2025, 3, 3), None)
        .unwrap();
    let absences = vec![
        Absence::with_minutes(date(2025, 3, 3), "09M", 30),
        Absence::with_minutes(date(2025, 3, 4), "09M", 300),
        Absence::with_minutes(date(2025, 3, 5), "09M", 120),
    ];

    let trace = period.scan(&absences, loader.catalog(), &calendar).unwrap();

    // 30 minutes count as 60, 300 as 240
    assert_eq!(period.period_taken_amount(), 60 + 240 + 120);
    assert_eq!(period.remaining_amount(), 1080 - 420);
    assert_eq!(trace.steps.len(), 3);
    assert!(period.errors_box.is_empty());
}

#[test]
fn test_disability_permission_monthly_limit() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let builder = PeriodBuilder::new(loader.catalog(), &calendar);
    let contract = permanent_contract();

    let period = builder
        .build(loader.group("G_18").unwrap(), &contract, date(2025, 3, 3), None)
        .unwrap();
    let existing = vec![
        Absence::new(date(2025, 3, 3), "18", JustifiedType::AllDay),
        Absence::new(date(2025, 3, 4), "18", JustifiedType::AllDay),
    ];

    let third = Absence::new(date(2025, 3, 5), "18", JustifiedType::AllDay);
    let simulation = period
        .simulate_insert(&third, &existing, loader.catalog(), &calendar)
        .unwrap();
    assert!(simulation.is_insertable());

    let mut three = existing.clone();
    three.push(third);
    let fourth = Absence::new(date(2025, 3, 6), "18", JustifiedType::AllDay);
    let simulation = period
        .simulate_insert(&fourth, &three, loader.catalog(), &calendar)
        .unwrap();
    assert!(!simulation.is_insertable());
    assert_eq!(simulation.problems, vec![AbsenceProblem::LimitExceeded]);
}

#[test]
fn test_period_outside_contract_is_an_error() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let builder = PeriodBuilder::new(loader.catalog(), &calendar);
    let contract = Contract::new("c_001", "p_001", date(2025, 1, 1), Some(date(2025, 6, 30)));

    let result = builder.build(loader.group("G_661").unwrap(), &contract, date(2025, 9, 1), None);
    assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
}

// =============================================================================
// Vacation situation
// =============================================================================

#[test]
fn test_vacation_situation_from_values() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let person = person();
    let contract = permanent_contract();
    let periods = vec![VacationPeriod {
        begin_date: contract.begin_date,
        end_date: None,
        vacation_code: VacationCode::Code28Plus4,
    }];
    let absences = vec![
        Absence::new(date(2025, 2, 3), "31", JustifiedType::AllDay),
        Absence::new(date(2025, 2, 4), "31", JustifiedType::AllDay),
        Absence::new(date(2025, 5, 5), "32", JustifiedType::AllDay),
        Absence::new(date(2025, 5, 6), "94", JustifiedType::AllDay),
    ];
    let initializations = VacationInitializations::default();

    let situation = VacationSituation::build(
        VacationInputs {
            person: &person,
            contract: &contract,
            vacation_periods: &periods,
            absences: &absences,
            initializations: &initializations,
        },
        2025,
        date(2025, 6, 15),
        loader.catalog(),
        &calendar,
    )
    .unwrap();

    assert_eq!(situation.last_year_cached.used, 2);
    assert_eq!(situation.current_year_cached.used, 1);
    assert_eq!(situation.permissions_cached.used, 1);
    assert_eq!(situation.sum_usable_total(), 26 + 27 + 3);
}

#[test]
fn test_vacation_situation_with_initialization() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let person = person();
    let contract = permanent_contract();
    let periods = vec![VacationPeriod {
        begin_date: contract.begin_date,
        end_date: None,
        vacation_code: VacationCode::Code28Plus4,
    }];
    let absences = vec![
        Absence::new(date(2025, 3, 3), "32", JustifiedType::AllDay),
        Absence::new(date(2025, 5, 5), "32", JustifiedType::AllDay),
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

    let situation = VacationSituation::build(
        VacationInputs {
            person: &person,
            contract: &contract,
            vacation_periods: &periods,
            absences: &absences,
            initializations: &initializations,
        },
        2025,
        date(2025, 6, 15),
        loader.catalog(),
        &calendar,
    )
    .unwrap();

    let current = situation.current_year.as_ref().unwrap();
    // the March absence is already part of the 4 sourced days
    assert_eq!(current.sourced(), 4);
    assert_eq!(current.used(), 5);
    assert_eq!(current.absences_used().len(), 1);
}

#[test]
fn test_vacation_request_report() {
    let loader = load_config();
    let json = r#"{
        "person": {"id": "p_002", "name": "Anna", "surname": "Bianchi", "begin_date": "2020-01-01"},
        "contract": {"id": "c_002", "person_id": "p_002", "begin_date": "2020-01-01"},
        "vacation_periods": [{"begin_date": "2020-01-01", "vacation_code": "28+4"}],
        "absences": [
            {"date": "2025-07-07", "code": "32", "justified_type": "all_day"},
            {"date": "2025-07-08", "code": "32", "justified_type": "all_day"},
            {"date": "2025-07-09", "code": "32", "justified_type": "all_day"}
        ],
        "year": 2025,
        "date": "2025-09-15"
    }"#;

    let request = VacationSituationRequest::from_json(json, "inline").unwrap();
    let report = request.evaluate(loader.config()).unwrap();

    assert_eq!(report.person, "Bianchi Anna");
    assert_eq!(report.contract_id, "c_002");
    assert!(!report.critical_errors);
    let last_year = report.last_year.as_ref().unwrap();
    assert!(last_year.numbers.expired);
    assert_eq!(last_year.numbers.usable, 0);
    let current = report.current_year.as_ref().unwrap();
    assert_eq!(current.numbers.used, 3);
    assert_eq!(current.absences_used.len(), 3);
    // expired days still count in the total left
    assert_eq!(report.sum_usable_total, 28 + 25 + 4);

    let rendered = serde_json::to_value(&report).unwrap();
    assert_eq!(rendered["current_year"]["numbers"]["used"], 3);
}

// =============================================================================
// Month recaps
// =============================================================================

#[test]
fn test_month_recaps_with_compensatory_rest() {
    let contract = permanent_contract();
    let calendar = WeekdayCalendar::new(432);
    let mut rest = PersonDay::new("p_001", date(2025, 2, 10));
    rest.absences.push(Absence::new(
        date(2025, 2, 10),
        COMPENSATORY_REST_CODE,
        JustifiedType::AllDay,
    ));
    let days = vec![
        worked_day(date(2025, 1, 7), 552),
        worked_day(date(2025, 1, 8), 552),
        worked_day(date(2025, 1, 9), 552),
        worked_day(date(2025, 1, 10), 552),
        rest,
    ];

    let recaps = month_recaps(&contract, &days, 2025, 1, 2025, 2, &calendar).unwrap();

    assert_eq!(recaps[0].progressive_final_month, 480);
    assert_eq!(recaps[0].remaining_minutes_current_year, 480);
    assert_eq!(recaps[1].compensatory_rest_days, 1);
    assert_eq!(recaps[1].compensatory_rest_minutes, 432);
    assert_eq!(recaps[1].remaining_minutes_current_year, 48);

    let capacity = CompensatoryRestCapacity::OnEndPastMonthResidual;
    assert!(capacity.allows(date(2025, 2, 10), 432, 0, &recaps));
    assert!(!capacity.allows(date(2025, 3, 10), 432, 0, &recaps));
}

// =============================================================================
// Stampings and meal tickets
// =============================================================================

#[test]
fn test_week_of_stampings_feeds_meal_tickets() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let person = person();
    let mut contract = permanent_contract();
    contract.source_date_meal_ticket = Some(date(2024, 12, 31));
    let today = date(2025, 3, 10);
    let context = DayRecapContext {
        office: loader.office(),
        calendar: &calendar,
        person: &person,
        month_contracts: None,
        fixed_time_at_work: false,
        personal_work_time: None,
        today,
    };

    let mut sequence = PairIdSequence::new();
    let mut recaps = Vec::new();
    for d in 3..=7 {
        let day_date = date(2025, 3, d);
        let mut day = worked_day(day_date, 480);
        day.stampings = vec![
            Stamping::new(at(day_date, 8, 0), WayType::In),
            Stamping::new(at(day_date, 12, 0), WayType::Out),
            Stamping::new(at(day_date, 13, 0), WayType::In),
            Stamping::new(at(day_date, 17, 0), WayType::Out),
        ];
        day.ticket_available = true;
        recaps.push(PersonStampingDayRecap::build(day, &context, &mut sequence));
    }

    assert!(recaps.iter().all(|r| r.troubles.is_empty()));
    assert!(recaps.iter().all(|r| r.meal_ticket == Some(MealTicketStatus::Yes)));
    assert_eq!(recaps[4].pairs.len(), 2);
    assert!(!calendar.is_holiday(date(2025, 3, 7)));

    let tickets: Vec<MealTicket> = (1..=3)
        .map(|number| MealTicket {
            contract_id: "c_001".to_string(),
            block: "2025A".to_string(),
            number,
            delivery_date: date(2025, 2, 3),
            expire_date: date(2026, 12, 31),
            returned: false,
        })
        .collect();
    let days: Vec<PersonDay> = recaps.into_iter().map(|r| r.person_day).collect();

    let recap = MealTicketRecap::build(&contract, &days, &tickets, today).unwrap();

    assert_eq!(recap.remaining, -2);
    assert_eq!(recap.date_run_out, Some(date(2025, 3, 6)));
    assert_eq!(recap.negative_residual(), 2);
    assert_eq!(recap.block_received().len(), 1);
}

#[test]
fn test_day_without_stampings_is_a_trouble() {
    let loader = load_config();
    let calendar = WeekdayCalendar::new(432);
    let person = person();
    let context = DayRecapContext {
        office: loader.office(),
        calendar: &calendar,
        person: &person,
        month_contracts: None,
        fixed_time_at_work: false,
        personal_work_time: None,
        today: date(2025, 3, 10),
    };

    let recap = PersonStampingDayRecap::build(
        PersonDay::new("p_001", date(2025, 3, 4)),
        &context,
        &mut PairIdSequence::new(),
    );

    assert_eq!(recap.troubles, vec![Troubles::NoAbsNoStamp]);
}

// =============================================================================
// Approval flows
// =============================================================================

#[test]
fn test_vacation_flow_with_office_approvals() {
    let loader = load_config();
    let approvals = &loader.office().approvals;
    let now = at(date(2025, 5, 12), 9, 0);

    let mut flow = ApprovalFlow::new(RequestType::Absence(AbsenceRequestType::Vacation), approvals);
    assert_eq!(flow.required_steps, vec![ApprovalStep::Manager, ApprovalStep::OfficeHead]);

    flow.start(now).unwrap();
    assert!(flow.approve(ApprovalStep::OfficeHead, now).is_err());
    flow.approve(ApprovalStep::Manager, now).unwrap();
    assert_eq!(flow.next_step(), Some(ApprovalStep::OfficeHead));
    flow.approve(ApprovalStep::OfficeHead, now).unwrap();

    assert_eq!(flow.status, FlowStatus::Approved);
    assert!(flow.is_ended());
}

#[test]
fn test_personal_permission_skips_manager() {
    let loader = load_config();
    let approvals = &loader.office().approvals;

    let flow = ApprovalFlow::new(
        RequestType::Absence(AbsenceRequestType::PersonalPermission),
        approvals,
    );

    assert_eq!(
        flow.required_steps,
        vec![ApprovalStep::Administrative, ApprovalStep::OfficeHead]
    );
}

#[test]
fn test_reperibility_change_refused() {
    let loader = load_config();
    let approvals = &loader.office().approvals;
    let now = at(date(2025, 5, 12), 9, 0);

    let mut flow = ApprovalFlow::new(
        RequestType::Competence(CompetenceRequestType::ChangeReperibilityRequest),
        approvals,
    );
    flow.start(now).unwrap();
    flow.approve(ApprovalStep::Employee, now).unwrap();
    flow.refuse(ApprovalStep::ReperibilityManager, now, "turno scoperto").unwrap();

    assert_eq!(flow.status, FlowStatus::Refused);
    assert!(matches!(
        flow.approve(ApprovalStep::ReperibilityManager, now),
        Err(EngineError::InvalidFlowTransition { .. })
    ));
}
