//! Audit trace models.
//!
//! Every rule the engine applies to an absence records an [`AuditStep`],
//! so that the numbers shown to an administrator can be explained.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording an engine decision.
///
/// # Example
///
/// ```
/// use epas_engine::models::AuditStep;
/// use chrono::NaiveDate;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "taken_absence".to_string(),
///     rule_name: "Taken Absence".to_string(),
///     group_code: "G_661".to_string(),
///     date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
///     input: serde_json::json!({"code": "661", "amount": 90}),
///     output: serde_json::json!({"taken_after": 90}),
///     reasoning: "90 minutes of 1080 consumed".to_string(),
/// };
/// assert_eq!(step.rule_id, "taken_absence");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The absence group the rule belongs to.
    pub group_code: String,
    /// The day the decision is about.
    pub date: NaiveDate,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during a computation.
///
/// Warnings flag data the engine skipped or could not fully trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace of a computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated.
    pub warnings: Vec<AuditWarning>,
    /// The total duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The number the next step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Records a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        });
    }
}
