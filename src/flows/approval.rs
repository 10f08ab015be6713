//! Approval workflows of absence and competence requests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AbsenceApprovalParams, ApprovalParams};
use crate::error::{EngineError, EngineResult};

/// Someone who has to approve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStep {
    /// The colleague involved in a change.
    Employee,
    /// The reperibility (on-call) manager.
    ReperibilityManager,
    /// The group manager.
    Manager,
    /// The personnel administrator.
    Administrative,
    /// The office head.
    OfficeHead,
}

/// Requests about competences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetenceRequestType {
    /// Swap of reperibility days with a colleague.
    ChangeReperibilityRequest,
}

impl CompetenceRequestType {
    /// The employee approval is never asked.
    pub fn always_skip_employee_approval(&self) -> bool {
        false
    }

    /// The reperibility manager approval is never asked.
    pub fn always_skip_reperibility_manager_approval(&self) -> bool {
        false
    }

    /// Steps required by the office configuration, in order.
    pub fn required_steps(&self, approvals: &ApprovalParams) -> Vec<ApprovalStep> {
        let params = match self {
            Self::ChangeReperibilityRequest => approvals.change_reperibility_request,
        };
        let mut steps = Vec::new();
        if params.employee_approval_required && !self.always_skip_employee_approval() {
            steps.push(ApprovalStep::Employee);
        }
        if params.reperibility_manager_approval_required
            && !self.always_skip_reperibility_manager_approval()
        {
            steps.push(ApprovalStep::ReperibilityManager);
        }
        steps
    }
}

/// Requests of absences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceRequestType {
    /// Vacation days.
    Vacation,
    /// Compensatory rest days.
    CompensatoryRest,
    /// Hourly personal permission.
    PersonalPermission,
}

impl AbsenceRequestType {
    /// The group manager approval is never asked.
    pub fn always_skip_manager_approval(&self) -> bool {
        matches!(self, Self::PersonalPermission)
    }

    /// The administrative approval is never asked.
    pub fn always_skip_administrative_approval(&self) -> bool {
        matches!(self, Self::Vacation | Self::CompensatoryRest)
    }

    /// The office head approval is never asked.
    pub fn always_skip_office_head_approval(&self) -> bool {
        false
    }

    fn params(&self, approvals: &ApprovalParams) -> AbsenceApprovalParams {
        match self {
            Self::Vacation => approvals.vacation_request,
            Self::CompensatoryRest => approvals.compensatory_rest_request,
            Self::PersonalPermission => approvals.personal_permission_request,
        }
    }

    /// Steps required by the office configuration, in order.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::config::{AbsenceApprovalParams, ApprovalParams};
    /// use epas_engine::flows::{AbsenceRequestType, ApprovalStep};
    ///
    /// let mut approvals = ApprovalParams::default();
    /// approvals.vacation_request = AbsenceApprovalParams {
    ///     manager_approval_required: true,
    ///     administrative_approval_required: true,
    ///     office_head_approval_required: true,
    /// };
    ///
    /// assert_eq!(
    ///     AbsenceRequestType::Vacation.required_steps(&approvals),
    ///     vec![ApprovalStep::Manager, ApprovalStep::OfficeHead]
    /// );
    /// ```
    pub fn required_steps(&self, approvals: &ApprovalParams) -> Vec<ApprovalStep> {
        let params = self.params(approvals);
        let mut steps = Vec::new();
        if params.manager_approval_required && !self.always_skip_manager_approval() {
            steps.push(ApprovalStep::Manager);
        }
        if params.administrative_approval_required && !self.always_skip_administrative_approval() {
            steps.push(ApprovalStep::Administrative);
        }
        if params.office_head_approval_required && !self.always_skip_office_head_approval() {
            steps.push(ApprovalStep::OfficeHead);
        }
        steps
    }
}

/// The kind of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "type", rename_all = "snake_case")]
pub enum RequestType {
    /// An absence request.
    Absence(AbsenceRequestType),
    /// A competence request.
    Competence(CompetenceRequestType),
}

impl RequestType {
    /// Steps required by the office configuration, in order.
    pub fn required_steps(&self, approvals: &ApprovalParams) -> Vec<ApprovalStep> {
        match self {
            Self::Absence(kind) => kind.required_steps(approvals),
            Self::Competence(kind) => kind.required_steps(approvals),
        }
    }
}

/// Where a flow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// Created, not submitted.
    Draft,
    /// Waiting for approvals.
    Started,
    /// Every required step approved.
    Approved,
    /// Refused at some step.
    Refused,
}

/// Something that happened to a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEvent {
    /// When.
    pub at: NaiveDateTime,
    /// The step acting, none for the submission.
    pub step: Option<ApprovalStep>,
    /// What happened.
    pub action: FlowAction,
    /// Free text, e.g. the reason of a refusal.
    pub note: Option<String>,
}

/// Flow transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    /// The request was submitted.
    Start,
    /// A step approved.
    Approve,
    /// A step refused.
    Refuse,
}

/// The approval workflow of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFlow {
    /// Kind of request.
    pub request_type: RequestType,
    /// Steps to go through, in order.
    pub required_steps: Vec<ApprovalStep>,
    /// Steps already approved.
    pub approved_steps: Vec<ApprovalStep>,
    /// Current status.
    pub status: FlowStatus,
    /// History of the flow.
    pub events: Vec<FlowEvent>,
}

impl ApprovalFlow {
    /// A draft flow with the steps the office requires.
    pub fn new(request_type: RequestType, approvals: &ApprovalParams) -> Self {
        Self {
            request_type,
            required_steps: request_type.required_steps(approvals),
            approved_steps: Vec::new(),
            status: FlowStatus::Draft,
            events: Vec::new(),
        }
    }

    /// The step expected to act next.
    pub fn next_step(&self) -> Option<ApprovalStep> {
        if self.status != FlowStatus::Started {
            return None;
        }
        self.required_steps.get(self.approved_steps.len()).copied()
    }

    /// Returns true once the flow is approved or refused.
    pub fn is_ended(&self) -> bool {
        matches!(self.status, FlowStatus::Approved | FlowStatus::Refused)
    }

    /// Submits the request. A flow with no required step is approved at once.
    ///
    /// # Errors
    ///
    /// Fails unless the flow is a draft.
    pub fn start(&mut self, at: NaiveDateTime) -> EngineResult<()> {
        if self.status != FlowStatus::Draft {
            return Err(invalid("start", format!("flow is {:?}", self.status)));
        }
        self.events.push(FlowEvent {
            at,
            step: None,
            action: FlowAction::Start,
            note: None,
        });
        self.status = if self.required_steps.is_empty() {
            FlowStatus::Approved
        } else {
            FlowStatus::Started
        };
        info!(request = ?self.request_type, status = ?self.status, "flow started");
        Ok(())
    }

    /// Approves the next step.
    ///
    /// # Errors
    ///
    /// Fails when the flow is not waiting for `step`.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::config::ApprovalParams;
    /// use epas_engine::flows::{AbsenceRequestType, ApprovalFlow, ApprovalStep, FlowStatus, RequestType};
    /// use chrono::NaiveDate;
    ///
    /// let mut approvals = ApprovalParams::default();
    /// approvals.compensatory_rest_request.manager_approval_required = true;
    /// let at = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap().and_hms_opt(9, 0, 0).unwrap();
    ///
    /// let mut flow = ApprovalFlow::new(RequestType::Absence(AbsenceRequestType::CompensatoryRest), &approvals);
    /// flow.start(at).unwrap();
    /// flow.approve(ApprovalStep::Manager, at).unwrap();
    ///
    /// assert_eq!(flow.status, FlowStatus::Approved);
    /// ```
    pub fn approve(&mut self, step: ApprovalStep, at: NaiveDateTime) -> EngineResult<()> {
        self.check_turn("approve", step)?;
        self.approved_steps.push(step);
        self.events.push(FlowEvent {
            at,
            step: Some(step),
            action: FlowAction::Approve,
            note: None,
        });
        if self.approved_steps.len() == self.required_steps.len() {
            self.status = FlowStatus::Approved;
            info!(request = ?self.request_type, "flow approved");
        }
        Ok(())
    }

    /// Refuses the request at `step`.
    ///
    /// # Errors
    ///
    /// Fails when the flow is not waiting for `step`.
    pub fn refuse(
        &mut self,
        step: ApprovalStep,
        at: NaiveDateTime,
        reason: impl Into<String>,
    ) -> EngineResult<()> {
        self.check_turn("refuse", step)?;
        self.events.push(FlowEvent {
            at,
            step: Some(step),
            action: FlowAction::Refuse,
            note: Some(reason.into()),
        });
        self.status = FlowStatus::Refused;
        info!(request = ?self.request_type, ?step, "flow refused");
        Ok(())
    }

    fn check_turn(&self, action: &str, step: ApprovalStep) -> EngineResult<()> {
        match self.next_step() {
            Some(expected) if expected == step => Ok(()),
            Some(expected) => Err(invalid(
                action,
                format!("waiting for {:?}, not {:?}", expected, step),
            )),
            None => Err(invalid(action, format!("flow is {:?}", self.status))),
        }
    }
}

fn invalid(action: &str, message: String) -> EngineError {
    EngineError::InvalidFlowTransition {
        action: action.to_string(),
        message,
    }
}
