//! Attendance and leave engine for ePAS
//!
//! This crate computes what an employee is entitled to and what is left:
//! vacation and law permission chains across contract periods, absence
//! limits and completions, daily stamping recaps, monthly work time
//! residuals, meal ticket balances and approval flows.
//!
//! Persistence is not part of the crate: callers pass plain values
//! (contracts, absences, stampings, tickets) and get values back.

#![warn(missing_docs)]

pub mod absences;
pub mod calendar;
pub mod config;
pub mod error;
pub mod flows;
pub mod meal_tickets;
pub mod models;
pub mod recaps;
pub mod requests;
pub mod stampings;
pub mod telemetry;
