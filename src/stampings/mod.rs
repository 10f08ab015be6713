//! Stampings of a day: valid pairs, the stamping table row and troubles.

mod day_recap;
mod pair_stamping;
mod troubles;

pub use day_recap::{
    DayRecapContext, MealTicketStatus, PersonStampingDayRecap, StampingPosition,
    StampingTemplate, meal_ticket_status,
};
pub use pair_stamping::{PairIdSequence, PairStamping, time_in_pairs, valid_pairs};
pub use troubles::{Troubles, day_troubles};
