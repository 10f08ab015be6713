//! Monthly residual recaps and compensatory rest capacity.

mod compensatory_rest;
mod month_recap;

pub use compensatory_rest::CompensatoryRestCapacity;
pub use month_recap::{COMPENSATORY_REST_CODE, ContractMonthRecap, MonthRecapInput, month_recaps};
