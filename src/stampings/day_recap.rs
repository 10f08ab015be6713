//! One row of the monthly stamping table.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::WorkingCalendar;
use crate::config::OfficeConfig;
use crate::models::{Contract, Person, PersonDay, Stamping, TimeInterval, WayType};

use super::pair_stamping::{PairIdSequence, PairStamping, valid_pairs};
use super::troubles::{Troubles, day_troubles};

/// Where a cell sits with respect to its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampingPosition {
    /// Entrance of a valid pair.
    Left,
    /// Between the two sides of a valid pair.
    Center,
    /// Exit of a valid pair.
    Right,
    /// Outside any pair.
    None,
}

/// A cell of the stamping table; fictitious cells have no stamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampingTemplate {
    /// The stamping, `None` for padding cells.
    pub stamping: Option<Stamping>,
    /// Direction of the cell.
    pub way: WayType,
    /// Position in the pair.
    pub position: StampingPosition,
    /// `HH:MM`, empty for padding cells.
    pub hour: String,
}

/// Meal ticket column of the stamping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealTicketStatus {
    /// Not earned yet.
    NotYet,
    /// Earned.
    Yes,
    /// Earned if the person leaves now.
    YesIfExitNow,
    /// Not earned.
    No,
}

/// What the recap needs besides the day itself.
pub struct DayRecapContext<'a> {
    /// Office parameters: intervals and table width.
    pub office: &'a OfficeConfig,
    /// Holidays of the person.
    pub calendar: &'a dyn WorkingCalendar,
    /// The person.
    pub person: &'a Person,
    /// Contracts active in the month, when known.
    pub month_contracts: Option<&'a [Contract]>,
    /// The person does not need to stamp.
    pub fixed_time_at_work: bool,
    /// Personal working time slot.
    pub personal_work_time: Option<(NaiveTime, NaiveTime)>,
    /// The current date.
    pub today: NaiveDate,
}

/// A person day as shown in the monthly stamping table.
#[derive(Debug, Clone, Serialize)]
pub struct PersonStampingDayRecap {
    /// The day, with holiday flag and pair identifiers set.
    pub person_day: PersonDay,
    /// Valid pairs of the day.
    pub pairs: Vec<PairStamping>,
    /// Office lunch window.
    pub lunch_interval: TimeInterval,
    /// Office work window.
    pub work_interval: TimeInterval,
    /// Personal work window; none when missing or inverted.
    pub personal_work_interval: Option<TimeInterval>,
    /// Day outside the contract or before its initialization.
    pub ignore_day: bool,
    /// First day of a contract.
    pub first_day: bool,
    /// Cells of the table, padded to the table width.
    pub stampings_template: Vec<StampingTemplate>,
    /// Meal ticket column; none when nothing is shown.
    pub meal_ticket: Option<MealTicketStatus>,
    /// Show the fixed working time marker.
    pub fixed_working_time: bool,
    /// `HH:MM: note` for each annotated stamping.
    pub notes: Vec<String>,
    /// Anomalies of the day.
    pub troubles: Vec<Troubles>,
}

impl PersonStampingDayRecap {
    /// Builds the recap of `person_day`.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::calendar::WeekdayCalendar;
    /// use epas_engine::config::OfficeConfig;
    /// use epas_engine::models::{Person, PersonDay, Stamping, WayType};
    /// use epas_engine::stampings::{DayRecapContext, MealTicketStatus, PairIdSequence, PersonStampingDayRecap};
    /// use chrono::NaiveDate;
    ///
    /// let office: OfficeConfig = serde_yaml::from_str(r#"
    /// office: { code: IIT, name: Istituto }
    /// daily_work_minutes: 432
    /// lunch_interval: { from: "12:00:00", to: "15:00:00" }
    /// work_interval: { from: "07:00:00", to: "20:00:00" }
    /// "#).unwrap();
    /// let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    /// let person = Person { id: "p_001".into(), name: "Mario".into(), surname: "Rossi".into(), begin_date: date };
    /// let calendar = WeekdayCalendar::new(432);
    /// let mut day = PersonDay::new("p_001", date);
    /// day.stampings.push(Stamping::new(date.and_hms_opt(8, 0, 0).unwrap(), WayType::In));
    /// day.ticket_available = true;
    ///
    /// let context = DayRecapContext {
    ///     office: &office,
    ///     calendar: &calendar,
    ///     person: &person,
    ///     month_contracts: None,
    ///     fixed_time_at_work: false,
    ///     personal_work_time: None,
    ///     today: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    /// };
    /// let recap = PersonStampingDayRecap::build(day, &context, &mut PairIdSequence::new());
    ///
    /// assert_eq!(recap.stampings_template.len(), 4);
    /// assert_eq!(recap.meal_ticket, Some(MealTicketStatus::Yes));
    /// ```
    pub fn build(
        mut person_day: PersonDay,
        context: &DayRecapContext<'_>,
        sequence: &mut PairIdSequence,
    ) -> Self {
        if person_day.is_today(context.today) {
            debug!(person = %person_day.person_id, "recap of the current day");
        }
        person_day.is_holiday = context.calendar.is_holiday(person_day.date);

        let pairs = valid_pairs(&mut person_day.stampings, sequence);
        let stampings_template =
            stampings_template(&person_day.stampings, context.office.number_of_in_out);
        let notes = stampings_note(&stampings_template);

        let all_day_absences = person_day.has_all_day_absences();
        let fixed_working_time =
            context.fixed_time_at_work && !person_day.is_holiday && !all_day_absences;

        let mut ignore_day = false;
        let mut first_day = false;
        for contract in context.month_contracts.unwrap_or_default() {
            if contract.begin_date > person_day.date
                || contract
                    .source_date_residual
                    .is_some_and(|source| person_day.date < source)
                || person_day.date < context.person.begin_date
            {
                ignore_day = true;
            }
            if contract.begin_date == person_day.date {
                first_day = true;
            }
        }

        let meal_ticket =
            meal_ticket_status(&person_day, all_day_absences, ignore_day, context.today);
        let troubles = if ignore_day {
            Vec::new()
        } else {
            day_troubles(
                &person_day,
                context.fixed_time_at_work,
                context.calendar.work_minutes_on(person_day.date),
                context.today,
            )
        };

        Self {
            person_day,
            pairs,
            lunch_interval: context.office.lunch_interval,
            work_interval: context.office.work_interval,
            personal_work_interval: context
                .personal_work_time
                .and_then(|(from, to)| TimeInterval::checked(from, to)),
            ignore_day,
            first_day,
            stampings_template,
            meal_ticket,
            fixed_working_time,
            notes,
            troubles,
        }
    }
}

/// The meal ticket column for a day.
///
/// # Returns
///
/// `None` when the column stays empty: ignored days, holidays without
/// approved work and future days without all-day absences.
pub fn meal_ticket_status(
    person_day: &PersonDay,
    all_day_absences: bool,
    ignore_day: bool,
    today: NaiveDate,
) -> Option<MealTicketStatus> {
    if ignore_day {
        return None;
    }
    if person_day.is_holiday
        && person_day.approved_on_holiday <= 0
        && !person_day.ticket_forced_by_admin
    {
        return None;
    }
    if person_day.is_future(today) {
        return all_day_absences.then_some(MealTicketStatus::No);
    }

    let status = if person_day.ticket_available {
        if person_day.ticket_forced_by_admin || !person_day.is_today(today) {
            MealTicketStatus::Yes
        } else if all_day_absences {
            MealTicketStatus::No
        } else if person_day.considered_exiting_now {
            MealTicketStatus::YesIfExitNow
        } else {
            MealTicketStatus::Yes
        }
    } else if person_day.ticket_forced_by_admin || person_day.is_past(today) {
        MealTicketStatus::No
    } else if person_day.is_today(today) || !all_day_absences {
        MealTicketStatus::NotYet
    } else {
        MealTicketStatus::No
    };
    Some(status)
}

// Alternates entrances and exits, inserting fictitious cells where two
// stampings of the same direction follow each other, then pads the row.
fn stampings_template(stampings: &[Stamping], number_of_in_out: usize) -> Vec<StampingTemplate> {
    let mut cells: Vec<(Option<&Stamping>, WayType)> = Vec::new();
    let mut last_in = false;

    for stamping in stampings {
        match (last_in, stamping.way) {
            (true, WayType::Out) => {
                cells.push((Some(stamping), WayType::Out));
                last_in = false;
            }
            (true, WayType::In) => {
                cells.push((None, WayType::Out));
                cells.push((Some(stamping), WayType::In));
            }
            (false, WayType::In) => {
                cells.push((Some(stamping), WayType::In));
                last_in = true;
            }
            (false, WayType::Out) => {
                cells.push((None, WayType::In));
                cells.push((Some(stamping), WayType::Out));
            }
        }
    }
    while cells.len() < number_of_in_out * 2 {
        let way = if last_in { WayType::Out } else { WayType::In };
        cells.push((None, way));
        last_in = !last_in;
    }

    let mut same_pair = false;
    cells
        .into_iter()
        .map(|(stamping, way)| {
            let paired = stamping.is_some_and(|s| s.pair_id != 0);
            let position = if paired && way == WayType::In {
                same_pair = true;
                StampingPosition::Left
            } else if paired {
                same_pair = false;
                StampingPosition::Right
            } else if same_pair {
                StampingPosition::Center
            } else {
                StampingPosition::None
            };
            StampingTemplate {
                hour: stamping.map(Stamping::hour).unwrap_or_default(),
                stamping: stamping.cloned(),
                way,
                position,
            }
        })
        .collect()
}

fn stampings_note(templates: &[StampingTemplate]) -> Vec<String> {
    templates
        .iter()
        .filter_map(|t| {
            let note = t.stamping.as_ref()?.note.as_deref()?;
            (!note.is_empty()).then(|| format!("{}: {}", t.hour, note))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;
    use crate::models::{Absence, JustifiedType};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn office() -> OfficeConfig {
        serde_yaml::from_str(
            r#"
office: { code: IIT, name: Istituto }
daily_work_minutes: 432
lunch_interval: { from: "12:00:00", to: "15:00:00" }
work_interval: { from: "07:00:00", to: "20:00:00" }
"#,
        )
        .unwrap()
    }

    fn person() -> Person {
        Person {
            id: "p_001".to_string(),
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            begin_date: date(1),
        }
    }

    fn stamp(d: u32, h: u32, m: u32, way: WayType) -> Stamping {
        Stamping::new(date(d).and_hms_opt(h, m, 0).unwrap(), way)
    }

    fn recap(day: PersonDay, contracts: Option<&[Contract]>, today: NaiveDate) -> PersonStampingDayRecap {
        let office = office();
        let person = person();
        let calendar = WeekdayCalendar::new(432);
        let context = DayRecapContext {
            office: &office,
            calendar: &calendar,
            person: &person,
            month_contracts: contracts,
            fixed_time_at_work: false,
            personal_work_time: None,
            today,
        };
        PersonStampingDayRecap::build(day, &context, &mut PairIdSequence::new())
    }

    // ==========================================================================
    // Stamping template
    // ==========================================================================

    #[test]
    fn test_template_positions_for_full_day() {
        let mut day = PersonDay::new("p_001", date(3));
        day.stampings = vec![
            stamp(3, 8, 0, WayType::In),
            stamp(3, 12, 0, WayType::Out),
            stamp(3, 13, 0, WayType::In),
            stamp(3, 17, 0, WayType::Out),
        ];
        day.time_at_work = 480;
        let recap = recap(day, None, date(10));

        let positions: Vec<_> = recap.stampings_template.iter().map(|t| t.position).collect();
        assert_eq!(
            positions,
            vec![
                StampingPosition::Left,
                StampingPosition::Right,
                StampingPosition::Left,
                StampingPosition::Right
            ]
        );
        assert_eq!(recap.pairs.len(), 2);
        assert!(recap.troubles.is_empty());
    }

    #[test]
    fn test_template_inserts_fictitious_cells() {
        let mut day = PersonDay::new("p_001", date(3));
        day.stampings = vec![stamp(3, 8, 0, WayType::In), stamp(3, 9, 0, WayType::In)];
        let recap = recap(day, None, date(10));

        let cells: Vec<_> = recap
            .stampings_template
            .iter()
            .map(|t| (t.stamping.is_some(), t.way))
            .collect();
        assert_eq!(
            cells,
            vec![
                (true, WayType::In),
                (false, WayType::Out),
                (true, WayType::In),
                (false, WayType::Out)
            ]
        );
        assert!(recap.stampings_template.iter().all(|t| t.position == StampingPosition::None));
        assert_eq!(recap.troubles, vec![Troubles::UncoupledWorking]);
    }

    #[test]
    fn test_notes_carry_the_hour() {
        let mut day = PersonDay::new("p_001", date(3));
        let mut entrance = stamp(3, 8, 15, WayType::In);
        entrance.note = Some("treno in ritardo".to_string());
        day.stampings = vec![entrance];
        let recap = recap(day, None, date(10));

        assert_eq!(recap.notes, vec!["08:15: treno in ritardo".to_string()]);
    }

    // ==========================================================================
    // Contract flags
    // ==========================================================================

    #[test]
    fn test_days_before_contract_are_ignored() {
        let contracts = vec![Contract::new("c_001", "p_001", date(5), None)];
        let before = recap(PersonDay::new("p_001", date(4)), Some(&contracts), date(10));
        let first = recap(PersonDay::new("p_001", date(5)), Some(&contracts), date(10));

        assert!(before.ignore_day);
        assert!(before.meal_ticket.is_none());
        assert!(before.troubles.is_empty());
        assert!(first.first_day);
        assert!(!first.ignore_day);
    }

    #[test]
    fn test_weekend_is_holiday() {
        let recap = recap(PersonDay::new("p_001", date(8)), None, date(10));
        assert!(recap.person_day.is_holiday);
        assert!(recap.meal_ticket.is_none());
    }

    // ==========================================================================
    // Meal ticket
    // ==========================================================================

    #[test]
    fn test_meal_ticket_decision_table() {
        let today = date(10);
        let mut day = PersonDay::new("p_001", today);

        assert_eq!(meal_ticket_status(&day, false, false, today), Some(MealTicketStatus::NotYet));

        day.ticket_available = true;
        assert_eq!(meal_ticket_status(&day, false, false, today), Some(MealTicketStatus::Yes));
        day.considered_exiting_now = true;
        assert_eq!(
            meal_ticket_status(&day, false, false, today),
            Some(MealTicketStatus::YesIfExitNow)
        );
        assert_eq!(meal_ticket_status(&day, true, false, today), Some(MealTicketStatus::No));

        day.date = date(7);
        day.ticket_available = false;
        assert_eq!(meal_ticket_status(&day, false, false, today), Some(MealTicketStatus::No));

        day.date = date(12);
        assert_eq!(meal_ticket_status(&day, false, false, today), None);
        assert_eq!(meal_ticket_status(&day, true, false, today), Some(MealTicketStatus::No));
    }

    #[test]
    fn test_meal_ticket_forced_on_holiday() {
        let today = date(10);
        let mut day = PersonDay::new("p_001", date(8));
        day.is_holiday = true;
        day.ticket_available = true;
        assert_eq!(meal_ticket_status(&day, false, false, today), None);
        day.ticket_forced_by_admin = true;
        assert_eq!(meal_ticket_status(&day, false, false, today), Some(MealTicketStatus::Yes));
    }

    #[test]
    fn test_personal_interval_inverted_is_dropped() {
        let office = office();
        let person = person();
        let calendar = WeekdayCalendar::new(432);
        let mut context = DayRecapContext {
            office: &office,
            calendar: &calendar,
            person: &person,
            month_contracts: None,
            fixed_time_at_work: true,
            personal_work_time: Some((
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            )),
            today: date(10),
        };
        let mut day = PersonDay::new("p_001", date(3));
        day.absences
            .push(Absence::with_minutes(date(3), "661", 60));

        let recap = PersonStampingDayRecap::build(day.clone(), &context, &mut PairIdSequence::new());
        assert!(recap.personal_work_interval.is_none());
        assert!(recap.fixed_working_time);

        context.personal_work_time = Some((
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        ));
        day.absences
            .push(Absence::new(date(3), "32", JustifiedType::AllDay));
        let recap = PersonStampingDayRecap::build(day, &context, &mut PairIdSequence::new());
        assert_eq!(recap.personal_work_interval.map(|i| i.minutes()), Some(540));
        assert!(!recap.fixed_working_time);
    }
}
