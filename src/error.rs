//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during pay and tax calculation.
//!
//! Not every failure mode is an error. A missing tax bracket or an unreachable
//! rate-table source still produces a number; those results are flagged as
//! degraded instead (see [`crate::models::TaxBreakdown`]).

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::PeriodNotFound {
///     period_id: "pp_2025_01".to_string(),
/// };
/// assert_eq!(error.to_string(), "Pay period not found: pp_2025_01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// A shift was invalid or contained inconsistent data.
    #[error("Invalid shift '{shift_id}': {message}")]
    InvalidShift {
        /// The ID of the invalid shift.
        shift_id: String,
        /// A description of what made the shift invalid.
        message: String,
    },

    /// An award carried values that cannot be used for calculation.
    #[error("Invalid award '{award_id}': {message}")]
    InvalidAward {
        /// The ID of the invalid award.
        award_id: String,
        /// A description of what made the award invalid.
        message: String,
    },

    /// A calculation input outside shifts and awards was malformed.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A rate table does not tile the earnings axis.
    #[error("Invalid rate table for {tax_year}: {message}")]
    InvalidRateTable {
        /// The fiscal year of the table.
        tax_year: String,
        /// A description of the tiling problem.
        message: String,
    },

    /// The rate-table source could not be read.
    #[error("Rate table store unavailable: {message}")]
    StoreUnavailable {
        /// A description of the failure.
        message: String,
    },

    /// No pay period exists with the given ID.
    #[error("Pay period not found: {period_id}")]
    PeriodNotFound {
        /// The missing period ID.
        period_id: String,
    },

    /// No shift exists with the given ID.
    #[error("Shift not found: {shift_id}")]
    ShiftNotFound {
        /// The missing shift ID.
        shift_id: String,
    },

    /// No award exists with the given ID.
    #[error("Award not found: {award_id}")]
    AwardNotFound {
        /// The missing award ID.
        award_id: String,
    },

    /// The pay period has been paid and can no longer be recomputed.
    #[error("Pay period '{period_id}' is locked")]
    PeriodLocked {
        /// The locked period ID.
        period_id: String,
    },

    /// The caller's persistence layer failed a read or write.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the failure.
        message: String,
    },

    /// The sync queue worker has shut down.
    #[error("Sync queue closed")]
    QueueClosed,
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
    fn test_invalid_shift_displays_id_and_message() {
        let error = EngineError::InvalidShift {
            shift_id: "shift_001".to_string(),
            message: "end time before start time".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid shift 'shift_001': end time before start time"
        );
    }

    #[test]
    fn test_invalid_rate_table_displays_year() {
        let error = EngineError::InvalidRateTable {
            tax_year: "2024-25".to_string(),
            message: "gap at 18200".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid rate table for 2024-25: gap at 18200"
        );
    }

    #[test]
    fn test_period_locked_displays_id() {
        let error = EngineError::PeriodLocked {
            period_id: "pp_001".to_string(),
        };
        assert_eq!(error.to_string(), "Pay period 'pp_001' is locked");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::ShiftNotFound {
                shift_id: "s1".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
