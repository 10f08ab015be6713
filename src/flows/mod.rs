//! Approval workflows.
//!
//! Requests go through the approval steps the office configuration asks
//! for, in a fixed order. Some steps are never asked for some request
//! types, whatever the configuration says.

mod approval;

pub use approval::{
    AbsenceRequestType, ApprovalFlow, ApprovalStep, CompetenceRequestType, FlowAction,
    FlowEvent, FlowStatus, RequestType,
};
