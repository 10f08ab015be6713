//! Property tests for the arithmetic of the engine.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use epas_engine::absences::{accrued_days, working_type_percent};
use epas_engine::calendar::{WeekdayCalendar, WorkingCalendar};
use epas_engine::models::{Contract, PersonDay, Stamping, WayType, days_in_year};
use epas_engine::recaps::month_recaps;
use epas_engine::stampings::{PairIdSequence, time_in_pairs, valid_pairs};

fn stamping(minute: u32, is_in: bool) -> Stamping {
    let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    let time = day.and_hms_opt(minute / 60, minute % 60, 0).unwrap();
    Stamping::new(time, if is_in { WayType::In } else { WayType::Out })
}

proptest! {
    #[test]
    fn test_accrual_never_exceeds_yearly(
        year in 2000i32..2100,
        yearly in 0i64..40,
        days in 0i64..=365,
    ) {
        let accrued = accrued_days(days, yearly, year);
        prop_assert!(accrued >= 0);
        prop_assert!(accrued <= yearly);
        prop_assert_eq!(accrued_days(days_in_year(year), yearly, year), yearly);
    }

    #[test]
    fn test_accrual_grows_with_days(
        year in 2000i32..2100,
        yearly in 0i64..40,
        days in 0i64..365,
    ) {
        prop_assert!(accrued_days(days, yearly, year) <= accrued_days(days + 1, yearly, year));
    }

    #[test]
    fn test_working_percent_of_a_part_is_at_most_a_day(
        work_time in 1i64..720,
        share in 0.0f64..=1.0,
    ) {
        let minutes = (work_time as f64 * share) as i64;
        let percent = working_type_percent(minutes, work_time);
        prop_assert!((0..=100).contains(&percent));
    }

    #[test]
    fn test_valid_pairs_couple_entrances_with_exits(
        raw in prop::collection::vec((0u32..1440, any::<bool>()), 0..12),
    ) {
        let mut stampings: Vec<Stamping> = raw.iter().map(|(m, w)| stamping(*m, *w)).collect();
        let pairs = valid_pairs(&mut stampings, &mut PairIdSequence::new());

        let mut ids: Vec<u32> = pairs.iter().map(|p| p.first.pair_id).collect();
        ids.dedup();
        prop_assert_eq!(ids.len(), pairs.len());
        for pair in &pairs {
            prop_assert!(pair.first.is_in());
            prop_assert!(pair.second.is_out());
            prop_assert!(pair.first.pair_id > 0);
            prop_assert_eq!(pair.first.pair_id, pair.second.pair_id);
        }
        let coupled = stampings.iter().filter(|s| s.pair_id != 0).count();
        prop_assert_eq!(coupled, pairs.len() * 2);
        prop_assert!(time_in_pairs(&pairs) >= 0);
    }

    #[test]
    fn test_month_residual_is_the_sum_of_differences(
        worked in prop::collection::btree_map(0u64..90, 0i64..720, 0..40),
    ) {
        let begin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let contract = Contract::new("c_001", "p_001", NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), None);
        let calendar = WeekdayCalendar::new(432);
        let days: Vec<PersonDay> = worked
            .iter()
            .map(|(offset, minutes)| {
                let mut day = PersonDay::new("p_001", begin + Days::new(*offset));
                day.time_at_work = *minutes;
                day
            })
            .collect();
        let expected: i64 = days
            .iter()
            .map(|d| d.difference(calendar.work_minutes_on(d.date)))
            .sum();

        let recaps = month_recaps(&contract, &days, 2025, 1, 2025, 3, &calendar).unwrap();

        let by_month: BTreeMap<u32, i64> =
            recaps.iter().map(|r| (r.month, r.progressive_final_month)).collect();
        prop_assert_eq!(by_month.values().sum::<i64>(), expected);
        prop_assert_eq!(recaps[2].remaining_minutes_last_year, 0);
        prop_assert_eq!(recaps[2].remaining_minutes_current_year, expected);
    }
}
