//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading awards and
//! rate tables from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::Award;

use super::types::RateTableFile;

/// The rate table compiled into the crate, served when the live source fails.
const BUNDLED_RATE_TABLES: &str = include_str!("../../config/tax_tables/default.yaml");
const BUNDLED_RATE_TABLES_PATH: &str = "<bundled>/config/tax_tables/default.yaml";

/// Loads awards and rate tables from YAML files.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── awards/
/// │   └── retail.yaml       # One award per file
/// └── tax_tables/
///     ├── default.yaml      # Bundled fallback, compiled in
///     └── 2024-25.yaml      # One fiscal year per file
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let award = ConfigLoader::load_award("./config/awards/retail.yaml")?;
/// let tables = ConfigLoader::load_rate_tables("./config/tax_tables/2024-25.yaml")?;
/// println!("{} at ${}/h, tables for {}", award.name, award.base_rate, tables.tax_year);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads an award from a YAML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file cannot be read, `ConfigParseError`
    /// if it is not a valid award, or `InvalidAward` if its values are unusable.
    pub fn load_award<P: AsRef<Path>>(path: P) -> EngineResult<Award> {
        let award: Award = Self::load_yaml(path.as_ref())?;
        award.validate()?;
        Ok(award)
    }

    /// Loads one fiscal year's rate tables from a YAML file.
    ///
    /// The tables are checked for tiling before they are returned.
    pub fn load_rate_tables<P: AsRef<Path>>(path: P) -> EngineResult<RateTableFile> {
        let file: RateTableFile = Self::load_yaml(path.as_ref())?;
        file.to_snapshot().validate()?;
        Ok(file)
    }

    /// Parses the rate tables compiled into the crate.
    pub fn bundled_rate_tables() -> EngineResult<RateTableFile> {
        let file = Self::parse_yaml::<RateTableFile>(BUNDLED_RATE_TABLES, BUNDLED_RATE_TABLES_PATH)?;
        file.to_snapshot().validate()?;
        Ok(file)
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_yaml(&content, &path_str)
    }

    fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, path: &str) -> EngineResult<T> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}
