//! Core data models for the ePAS engine.
//!
//! This module contains the domain values the engine reads and produces:
//! contracts, absences, catalog entries, stampings, meal tickets and the
//! audit trace.

mod absence;
mod absence_group;
mod audit;
mod contract;
mod date_interval;
mod meal_ticket;
mod person_day;
mod stamping;

pub use absence::{
    Absence, AbsenceType, AmountType, InitializationGroup, JustifiedBehaviour,
    JustifiedBehaviourName, JustifiedType,
};
pub use absence_group::{
    ComplationBehaviour, GroupAbsenceType, PeriodType, TakableBehaviour, TakeCountBehaviour,
};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use contract::{Contract, Person, VacationCode, VacationPeriod};
pub use date_interval::{
    DateInterval, days_in_year, first_day_of_month, first_day_of_year, last_day_of_month,
    last_day_of_year,
};
pub use meal_ticket::MealTicket;
pub use person_day::PersonDay;
pub use stamping::{StampType, Stamping, TimeInterval, WayType};
