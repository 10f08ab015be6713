//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the absence
//! catalog and the office parameters from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AbsenceType, GroupAbsenceType};

use super::types::{AbsenceCatalog, AbsenceTypesConfig, EpasConfig, GroupsConfig, OfficeConfig};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/epas/
/// ├── absence_types.yaml  # Absence type catalog
/// ├── groups.yaml         # Absence groups (limits and completions)
/// └── office.yaml         # Office parameters and approval switches
/// ```
///
/// # Example
///
/// ```no_run
/// use epas_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/epas").unwrap();
/// let vacation = loader.absence_type("32").unwrap();
/// println!("{}: {}", vacation.code, vacation.description);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EpasConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Fails if a file is missing, contains invalid YAML, or a group refers
    /// to an absence type that is not in the catalog.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let office = Self::load_yaml::<OfficeConfig>(&path.join("office.yaml"))?;
        let types = Self::load_yaml::<AbsenceTypesConfig>(&path.join("absence_types.yaml"))?;
        let groups = Self::load_yaml::<GroupsConfig>(&path.join("groups.yaml"))?;

        let catalog = AbsenceCatalog::new(types.absence_types, groups.groups);
        catalog.validate()?;

        debug!(
            office = %office.office.code,
            absence_types = catalog.absence_types().len(),
            groups = catalog.groups().len(),
            "configuration loaded"
        );

        Ok(Self {
            config: EpasConfig::new(office, catalog),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EpasConfig {
        &self.config
    }

    /// Returns the office parameters.
    pub fn office(&self) -> &OfficeConfig {
        self.config.office()
    }

    /// Returns the absence catalog.
    pub fn catalog(&self) -> &AbsenceCatalog {
        self.config.catalog()
    }

    /// Gets an absence type by its code.
    pub fn absence_type(&self, code: &str) -> EngineResult<&AbsenceType> {
        self.catalog().absence_type(code)
    }

    /// Gets an absence group by its code.
    pub fn group(&self, code: &str) -> EngineResult<&GroupAbsenceType> {
        self.catalog().group(code)
    }
}
