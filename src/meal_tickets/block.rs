//! Grouping of meal tickets into delivered blocks.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DateInterval, MealTicket};

/// A run of tickets of the same block with consecutive numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockMealTicket {
    /// Block code.
    pub block: String,
    /// Tickets, in the order of the list they were grouped from.
    pub tickets: Vec<MealTicket>,
}

impl BlockMealTicket {
    fn starting_with(ticket: &MealTicket) -> Self {
        Self {
            block: ticket.block.clone(),
            tickets: vec![ticket.clone()],
        }
    }

    // Same block, same delivery and adjacent number in either direction.
    fn continues_with(&self, ticket: &MealTicket) -> bool {
        let Some(last) = self.tickets.last() else {
            return false;
        };
        last.block == ticket.block
            && last.delivery_date == ticket.delivery_date
            && last.number.abs_diff(ticket.number) == 1
    }

    /// Number of tickets in the block.
    pub fn dimension(&self) -> usize {
        self.tickets.len()
    }

    /// Lowest ticket number.
    pub fn first(&self) -> u32 {
        self.tickets.iter().map(|t| t.number).min().unwrap_or(0)
    }

    /// Highest ticket number.
    pub fn last(&self) -> u32 {
        self.tickets.iter().map(|t| t.number).max().unwrap_or(0)
    }

    /// Day the block was delivered.
    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.tickets.first().map(|t| t.delivery_date)
    }

    /// Earliest expiry of the tickets in the block.
    pub fn expire_date(&self) -> Option<NaiveDate> {
        self.tickets.iter().map(|t| t.expire_date).min()
    }

    /// Tickets of the block given back.
    pub fn returned(&self) -> usize {
        self.tickets.iter().filter(|t| t.returned).count()
    }
}

/// Groups an ordered ticket list into blocks.
///
/// Only tickets delivered inside `interval` are considered, when given.
///
/// # Example
///
/// ```
/// use epas_engine::meal_tickets::block_meal_tickets;
/// use epas_engine::models::MealTicket;
/// use chrono::NaiveDate;
///
/// let delivery = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// let expire = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
/// let tickets: Vec<MealTicket> = [1, 2, 3, 7]
///     .into_iter()
///     .map(|number| MealTicket {
///         contract_id: "c_001".to_string(),
///         block: "2025001".to_string(),
///         number,
///         delivery_date: delivery,
///         expire_date: expire,
///         returned: false,
///     })
///     .collect();
///
/// let blocks = block_meal_tickets(&tickets, None);
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].dimension(), 3);
/// ```
pub fn block_meal_tickets(
    tickets: &[MealTicket],
    interval: Option<&DateInterval>,
) -> Vec<BlockMealTicket> {
    let mut blocks: Vec<BlockMealTicket> = Vec::new();
    for ticket in tickets
        .iter()
        .filter(|t| interval.is_none_or(|i| i.contains(t.delivery_date)))
    {
        match blocks.last_mut() {
            Some(block) if block.continues_with(ticket) => block.tickets.push(ticket.clone()),
            _ => blocks.push(BlockMealTicket::starting_with(ticket)),
        }
    }
    blocks
}
