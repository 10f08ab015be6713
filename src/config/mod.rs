//! Configuration loading for the ePAS engine.
//!
//! The absence catalog (absence types and groups) and the office
//! parameters are loaded from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use epas_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/epas").unwrap();
//! println!("Loaded office: {}", config.office().office.name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AbsenceApprovalParams, AbsenceCatalog, AbsenceTypesConfig, ApprovalParams,
    CompetenceApprovalParams, EpasConfig, GroupsConfig, OfficeConfig, OfficeMetadata,
};
