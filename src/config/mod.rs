//! Configuration loading for awards and withholding rate tables.
//!
//! Awards and rate tables live as YAML files. One rate table is compiled
//! into the crate and serves as the fallback when the live source fails.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let tables = ConfigLoader::load_rate_tables("./config/tax_tables/2024-25.yaml").unwrap();
//! println!("Loaded rate tables for {}", tables.tax_year);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{CoefficientEntry, MedicareEntry, RateTableFile, StudyLoanEntry};
