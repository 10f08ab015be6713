//! Meal ticket balance of a contract.

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::models::{Contract, DateInterval, MealTicket, PersonDay};

use super::block::{BlockMealTicket, block_meal_tickets};

/// Delivered, returned and consumed meal tickets of a contract.
///
/// Tickets are consumed in expiry order, after the tickets declared by
/// the contract initialization.
#[derive(Debug, Clone, Serialize)]
pub struct MealTicketRecap {
    /// The contract.
    pub contract: Contract,
    /// Days considered: after the initialization, up to the recap date.
    pub meal_ticket_interval: Option<DateInterval>,
    /// Expiry of the next ticket to be used, while tickets are left.
    pub date_expire: Option<NaiveDate>,
    /// First day not covered by a ticket.
    pub date_run_out: Option<NaiveDate>,
    /// Days that used a ticket, in date order.
    pub person_days_meal_tickets: Vec<PersonDay>,
    /// Returned tickets, latest delivery first.
    pub returned_delivery_desc: Vec<MealTicket>,
    /// Received tickets, earliest expiry first.
    pub received_expire_asc: Vec<MealTicket>,
    /// Received tickets delivered inside the interval, earliest expiry first.
    pub received_expire_asc_post_init: Vec<MealTicket>,
    /// Received tickets delivered inside the interval, latest delivery first.
    pub received_delivery_desc: Vec<MealTicket>,
    /// Tickets left.
    pub remaining: i64,
    /// Tickets declared by the initialization.
    pub sourced_in_interval: i64,
}

impl MealTicketRecap {
    /// Computes the recap of `contract` up to `until`.
    ///
    /// # Arguments
    ///
    /// * `contract` - The contract, with its meal ticket initialization
    /// * `person_days` - Days of the person; only those using a ticket count
    /// * `tickets` - Tickets of the person; other contracts are skipped
    /// * `until` - Last day considered
    pub fn build(
        contract: &Contract,
        person_days: &[PersonDay],
        tickets: &[MealTicket],
        until: NaiveDate,
    ) -> EngineResult<Self> {
        let contract_interval = contract.meal_ticket_interval()?;
        let meal_ticket_interval = if until < contract_interval.begin {
            None
        } else {
            Some(DateInterval::new(
                contract_interval.begin,
                contract_interval.end.min(until),
            )?)
        };

        let mut received_expire_asc: Vec<MealTicket> = tickets
            .iter()
            .filter(|t| t.contract_id == contract.id && !t.returned)
            .cloned()
            .collect();
        received_expire_asc.sort_by(|a, b| {
            (a.expire_date, &a.block, a.number).cmp(&(b.expire_date, &b.block, b.number))
        });

        let in_interval = |t: &MealTicket| {
            meal_ticket_interval
                .as_ref()
                .is_some_and(|i| i.contains(t.delivery_date))
        };
        let received_expire_asc_post_init: Vec<MealTicket> = received_expire_asc
            .iter()
            .filter(|t| in_interval(t))
            .cloned()
            .collect();

        let mut received_delivery_desc = received_expire_asc_post_init.clone();
        received_delivery_desc
            .sort_by_key(|t| Reverse((t.delivery_date, t.block.clone(), t.number)));

        let mut returned_delivery_desc: Vec<MealTicket> = tickets
            .iter()
            .filter(|t| t.contract_id == contract.id && t.returned)
            .cloned()
            .collect();
        returned_delivery_desc
            .sort_by_key(|t| Reverse((t.delivery_date, t.block.clone(), t.number)));

        let sourced_in_interval = if contract.source_date_meal_ticket.is_some() {
            contract.source_remaining_meal_ticket
        } else {
            0
        };

        let mut person_days_meal_tickets: Vec<PersonDay> = person_days
            .iter()
            .filter(|d| {
                meal_ticket_interval
                    .as_ref()
                    .is_some_and(|i| i.contains(d.date))
                    && d.uses_meal_ticket()
            })
            .cloned()
            .collect();
        person_days_meal_tickets.sort_by_key(|d| d.date);

        let mut sourced_left = sourced_in_interval;
        let mut next_ticket = 0;
        let mut date_run_out = None;
        for day in &person_days_meal_tickets {
            if sourced_left > 0 {
                sourced_left -= 1;
            } else if next_ticket < received_expire_asc_post_init.len() {
                next_ticket += 1;
            } else {
                date_run_out = Some(day.date);
                break;
            }
        }

        let remaining = sourced_in_interval + received_expire_asc_post_init.len() as i64
            - person_days_meal_tickets.len() as i64;
        let date_expire = if remaining > 0 {
            received_expire_asc_post_init
                .get(next_ticket)
                .map(|t| t.expire_date)
        } else {
            None
        };

        if let Some(run_out) = date_run_out {
            info!(contract = %contract.id, %run_out, remaining, "meal tickets run out");
        } else {
            debug!(contract = %contract.id, remaining, "meal ticket recap computed");
        }

        Ok(Self {
            contract: contract.clone(),
            meal_ticket_interval,
            date_expire,
            date_run_out,
            person_days_meal_tickets,
            returned_delivery_desc,
            received_expire_asc,
            received_expire_asc_post_init,
            received_delivery_desc,
            remaining,
            sourced_in_interval,
        })
    }

    /// Tickets missing, as a positive number when the balance is negative.
    pub fn negative_residual(&self) -> i64 {
        -(self.sourced_in_interval + self.received_delivery_desc.len() as i64
            - self.person_days_meal_tickets.len() as i64)
    }

    /// Blocks received in the interval, earliest expiry first.
    pub fn block_received(&self) -> Vec<BlockMealTicket> {
        block_meal_tickets(&self.received_expire_asc, self.meal_ticket_interval.as_ref())
    }

    /// Blocks delivered before the initialization.
    pub fn block_previous_initialization(&self) -> EngineResult<Vec<BlockMealTicket>> {
        let Some(source) = self.contract.source_date_meal_ticket else {
            return Ok(Vec::new());
        };
        let interval = DateInterval::new(self.contract.begin_date, source)?;
        Ok(block_meal_tickets(&self.received_expire_asc, Some(&interval)))
    }

    /// Blocks delivered in `year`.
    pub fn block_received_in_year(&self, year: i32) -> Vec<BlockMealTicket> {
        block_meal_tickets(&self.received_expire_asc, Some(&DateInterval::year(year)))
    }

    /// Blocks received in the interval, latest delivery first.
    pub fn block_received_delivery_desc(&self) -> Vec<BlockMealTicket> {
        block_meal_tickets(&self.received_delivery_desc, self.meal_ticket_interval.as_ref())
    }

    /// Returned blocks, latest delivery first.
    pub fn block_returned_delivery_desc(&self) -> Vec<BlockMealTicket> {
        block_meal_tickets(&self.returned_delivery_desc, self.meal_ticket_interval.as_ref())
    }
}
