//! Configuration types for the ePAS engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files: the absence catalog and
//! the office parameters.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{AbsenceType, GroupAbsenceType, TimeInterval};

/// Metadata about the office the configuration belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficeMetadata {
    /// The office code (e.g., "IIT").
    pub code: String,
    /// The human-readable name of the office.
    pub name: String,
}

/// Approval switches for competence requests.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CompetenceApprovalParams {
    /// Whether the colleague involved must approve.
    #[serde(default)]
    pub employee_approval_required: bool,
    /// Whether the reperibility manager must approve.
    #[serde(default)]
    pub reperibility_manager_approval_required: bool,
}

/// Approval switches for absence requests.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AbsenceApprovalParams {
    /// Whether the group manager must approve.
    #[serde(default)]
    pub manager_approval_required: bool,
    /// Whether the personnel administrator must approve.
    #[serde(default)]
    pub administrative_approval_required: bool,
    /// Whether the office head must approve.
    #[serde(default)]
    pub office_head_approval_required: bool,
}

/// All approval parameters of an office.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApprovalParams {
    /// Change of reperibility (on-call) days.
    #[serde(default)]
    pub change_reperibility_request: CompetenceApprovalParams,
    /// Vacation requests.
    #[serde(default)]
    pub vacation_request: AbsenceApprovalParams,
    /// Compensatory rest requests.
    #[serde(default)]
    pub compensatory_rest_request: AbsenceApprovalParams,
    /// Hourly personal permission requests.
    #[serde(default)]
    pub personal_permission_request: AbsenceApprovalParams,
}

/// Office configuration from office.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficeConfig {
    /// Office metadata.
    pub office: OfficeMetadata,
    /// Default working minutes per day.
    pub daily_work_minutes: i64,
    /// The window in which lunch breaks are taken.
    pub lunch_interval: TimeInterval,
    /// The window in which stampings count as work.
    pub work_interval: TimeInterval,
    /// Number of in/out columns shown in the monthly stamping table.
    #[serde(default = "default_number_of_in_out")]
    pub number_of_in_out: usize,
    /// Approval parameters.
    #[serde(default)]
    pub approvals: ApprovalParams,
}

fn default_number_of_in_out() -> usize {
    2
}

/// Absence types file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AbsenceTypesConfig {
    /// The absence types.
    pub absence_types: Vec<AbsenceType>,
}

/// Absence groups file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupsConfig {
    /// The absence groups.
    pub groups: Vec<GroupAbsenceType>,
}

/// The absence catalog: absence types and groups indexed by code.
///
/// # Example
///
/// ```
/// use epas_engine::config::AbsenceCatalog;
/// use epas_engine::models::AbsenceType;
///
/// let catalog = AbsenceCatalog::new(vec![AbsenceType::new("32", "Ferie")], vec![]);
/// assert!(catalog.absence_type("32").is_ok());
/// assert!(catalog.absence_type("99").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbsenceCatalog {
    absence_types: HashMap<String, AbsenceType>,
    groups: HashMap<String, GroupAbsenceType>,
}

impl AbsenceCatalog {
    /// Creates a catalog from its component parts.
    pub fn new(absence_types: Vec<AbsenceType>, groups: Vec<GroupAbsenceType>) -> Self {
        Self {
            absence_types: absence_types
                .into_iter()
                .map(|t| (t.code.clone(), t))
                .collect(),
            groups: groups.into_iter().map(|g| (g.code.clone(), g)).collect(),
        }
    }

    /// Gets an absence type by its code.
    pub fn absence_type(&self, code: &str) -> EngineResult<&AbsenceType> {
        self.absence_types
            .get(code)
            .ok_or_else(|| EngineError::AbsenceTypeNotFound {
                code: code.to_string(),
            })
    }

    /// Gets a group by its code.
    pub fn group(&self, code: &str) -> EngineResult<&GroupAbsenceType> {
        self.groups.get(code).ok_or_else(|| EngineError::GroupNotFound {
            code: code.to_string(),
        })
    }

    /// Returns all absence types.
    pub fn absence_types(&self) -> &HashMap<String, AbsenceType> {
        &self.absence_types
    }

    /// Returns all groups.
    pub fn groups(&self) -> &HashMap<String, GroupAbsenceType> {
        &self.groups
    }

    /// Checks that every code referenced by a group exists.
    pub fn validate(&self) -> EngineResult<()> {
        for group in self.groups.values() {
            let mut referenced: Vec<&String> = Vec::new();
            if let Some(takable) = &group.takable {
                referenced.extend(takable.takable_codes.iter());
                referenced.extend(takable.taken_codes.iter());
            }
            if let Some(complation) = &group.complation {
                referenced.extend(complation.complation_codes.iter());
                referenced.extend(complation.replacing_codes.iter());
            }
            for code in referenced {
                self.absence_type(code)?;
            }
        }
        Ok(())
    }
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EpasConfig {
    office: OfficeConfig,
    catalog: AbsenceCatalog,
}

impl EpasConfig {
    /// Creates a new EpasConfig from its component parts.
    pub fn new(office: OfficeConfig, catalog: AbsenceCatalog) -> Self {
        Self { office, catalog }
    }

    /// Returns the office configuration.
    pub fn office(&self) -> &OfficeConfig {
        &self.office
    }

    /// Returns the absence catalog.
    pub fn catalog(&self) -> &AbsenceCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmountType, PeriodType, TakableBehaviour, TakeCountBehaviour};

    fn group_with_codes(codes: &[&str]) -> GroupAbsenceType {
        GroupAbsenceType {
            code: "G_TEST".to_string(),
            description: String::new(),
            period_type: PeriodType::Year,
            takable: Some(TakableBehaviour {
                amount_type: AmountType::Units,
                takable_count_behaviour: TakeCountBehaviour::Period,
                taken_count_behaviour: TakeCountBehaviour::Period,
                fixed_limit: 5,
                takable_codes: codes.iter().map(|c| c.to_string()).collect(),
                taken_codes: codes.iter().map(|c| c.to_string()).collect(),
            }),
            complation: None,
        }
    }

    #[test]
    fn test_validate_detects_unknown_code() {
        let catalog = AbsenceCatalog::new(
            vec![AbsenceType::new("18", "Permesso 104")],
            vec![group_with_codes(&["18", "18P"])],
        );
        match catalog.validate() {
            Err(EngineError::AbsenceTypeNotFound { code }) => assert_eq!(code, "18P"),
            other => panic!("Expected AbsenceTypeNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_complete_catalog() {
        let catalog = AbsenceCatalog::new(
            vec![AbsenceType::new("18", "Permesso 104")],
            vec![group_with_codes(&["18"])],
        );
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_group_lookup_unknown_returns_error() {
        let catalog = AbsenceCatalog::default();
        assert!(matches!(
            catalog.group("G_1"),
            Err(EngineError::GroupNotFound { .. })
        ));
    }
}
