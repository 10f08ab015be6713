//! Meal ticket balance: delivered blocks and their consumption.

mod block;
mod recap;

pub use block::{BlockMealTicket, block_meal_tickets};
pub use recap::MealTicketRecap;
