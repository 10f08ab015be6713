//! Meal ticket model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single meal ticket delivered to (or returned by) a contract.
///
/// Tickets come in numbered blocks; `code` is the block code followed by
/// the ticket number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealTicket {
    /// The contract the ticket was delivered to.
    pub contract_id: String,
    /// Block code.
    pub block: String,
    /// Number of the ticket inside its block.
    pub number: u32,
    /// Delivery day.
    pub delivery_date: NaiveDate,
    /// Expiry day.
    pub expire_date: NaiveDate,
    /// Whether the ticket was given back.
    #[serde(default)]
    pub returned: bool,
}

impl MealTicket {
    /// The full ticket code.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::models::MealTicket;
    /// use chrono::NaiveDate;
    ///
    /// let ticket = MealTicket {
    ///     contract_id: "c_001".to_string(),
    ///     block: "2025001".to_string(),
    ///     number: 7,
    ///     delivery_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
    ///     expire_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    ///     returned: false,
    /// };
    /// assert_eq!(ticket.code(), "202500107");
    /// ```
    pub fn code(&self) -> String {
        format!("{}{:02}", self.block, self.number)
    }
}
