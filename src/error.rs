//! Error types for the ePAS engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the structural failures of the engine. Business rule violations
//! (limits exceeded, wrong replacing codes, ...) are not errors: they are
//! collected in the period's [`ErrorsBox`](crate::absences::ErrorsBox).

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the ePAS engine.
///
/// # Example
///
/// ```
/// use epas_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/groups.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/groups.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Absence type code is not part of the catalog.
    #[error("Absence type not found: {code}")]
    AbsenceTypeNotFound {
        /// The absence type code that was not found.
        code: String,
    },

    /// Absence group code is not part of the catalog.
    #[error("Absence group not found: {code}")]
    GroupNotFound {
        /// The group code that was not found.
        code: String,
    },

    /// A date range could not be built (e.g. begin after end, outside contract).
    #[error("Invalid period {from} - {to}: {message}")]
    InvalidPeriod {
        /// The requested begin date.
        from: NaiveDate,
        /// The requested end date.
        to: NaiveDate,
        /// A description of what made the period invalid.
        message: String,
    },

    /// A contract record was invalid or contained inconsistent data.
    #[error("Invalid contract '{contract_id}': {message}")]
    InvalidContract {
        /// The ID of the invalid contract.
        contract_id: String,
        /// A description of what made the contract invalid.
        message: String,
    },

    /// An approval flow transition is not allowed in the current state.
    #[error("Invalid flow transition '{action}': {message}")]
    InvalidFlowTransition {
        /// The attempted action.
        action: String,
        /// Why the action was rejected.
        message: String,
    },

    /// A request file could not be read or decoded.
    #[error("Invalid request '{source_name}': {message}")]
    InvalidRequest {
        /// Where the request came from.
        source_name: String,
        /// A description of the decoding problem.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_absence_type_not_found_displays_code() {
        let error = EngineError::AbsenceTypeNotFound {
            code: "XYZ".to_string(),
        };
        assert_eq!(error.to_string(), "Absence type not found: XYZ");
    }

    #[test]
    fn test_group_not_found_displays_code() {
        let error = EngineError::GroupNotFound {
            code: "G_99".to_string(),
        };
        assert_eq!(error.to_string(), "Absence group not found: G_99");
    }

    #[test]
    fn test_invalid_period_displays_dates() {
        let error = EngineError::InvalidPeriod {
            from: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            message: "begin after end".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid period 2025-03-01 - 2025-02-01: begin after end"
        );
    }

    #[test]
    fn test_invalid_contract_displays_id_and_message() {
        let error = EngineError::InvalidContract {
            contract_id: "c_001".to_string(),
            message: "end date before begin date".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid contract 'c_001': end date before begin date"
        );
    }

    #[test]
    fn test_invalid_flow_transition_displays_action() {
        let error = EngineError::InvalidFlowTransition {
            action: "approve".to_string(),
            message: "flow already ended".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid flow transition 'approve': flow already ended"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_group_not_found() -> EngineResult<()> {
            Err(EngineError::GroupNotFound {
                code: "G_18".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_group_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
