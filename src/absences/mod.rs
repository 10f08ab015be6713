//! Absence periods and the vacation situation.
//!
//! An [`AbsencePeriod`] is the window in which a group of absence codes is
//! counted. It tracks the amount taken against a limit, the completion
//! residual of partial-day codes and the replacing codes that should turn
//! those residuals into whole days. Problems found while scanning are
//! collected in the period's [`ErrorsBox`].

mod amounts;
mod builder;
mod day_in_period;
mod errors_box;
mod period;
mod scan;
mod taken;
mod vacation;

pub use amounts::{
    ReplacingCodesDesc, UNITS_PER_DAY, absence_justified_amount, replacing_amount,
    which_replacing_code, working_type_percent,
};
pub use builder::{PeriodBuilder, SMART_WORKING_CODE, smart_working_limit};
pub use day_in_period::DayInPeriod;
pub use errors_box::{
    AbsenceError, AbsenceProblem, CriticalError, CriticalProblem, ErrorsBox,
    boxes_contain_critical_errors,
};
pub use period::AbsencePeriod;
pub use scan::InsertSimulation;
pub use taken::{ComplationAbsence, TakenAbsence};
pub use vacation::{
    CURRENT_YEAR_CODE, LAW_PERMISSION_CODE, PREVIOUS_YEAR_CODE, PREVIOUS_YEAR_EXTENSION_CODE,
    TypeSummary, VacationChainBuilder, VacationInitializations, VacationInputs, VacationSituation,
    VacationSummary, VacationSummaryCached, accrued_days,
};
