//! Versioned rate-table snapshots and their tiling checks.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    MedicareLevyConfig, StudyLoanThresholdRow, TableOrigin, TaxCoefficientRow, TaxScale,
};

/// Every rate table needed to withhold tax for one fiscal year.
///
/// Snapshots are immutable. The store hands them out behind an `Arc`; callers
/// can also build one directly and pass it to the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTableSnapshot {
    /// Fiscal year identifier.
    pub tax_year: String,
    /// Store generation when the snapshot was loaded.
    pub generation: u64,
    /// Where the rows came from.
    pub origin: TableOrigin,
    coefficients: BTreeMap<TaxScale, Vec<TaxCoefficientRow>>,
    /// Health-levy thresholds.
    pub medicare: MedicareLevyConfig,
    /// Study-loan bands, ordered by lower bound.
    pub study_loan: Vec<StudyLoanThresholdRow>,
}

impl RateTableSnapshot {
    /// Builds an injected snapshot, grouping rows by scale and sorting each
    /// group by lower bound.
    pub fn new(
        tax_year: &str,
        coefficient_rows: Vec<TaxCoefficientRow>,
        medicare: MedicareLevyConfig,
        mut study_loan: Vec<StudyLoanThresholdRow>,
    ) -> Self {
        let mut coefficients: BTreeMap<TaxScale, Vec<TaxCoefficientRow>> = BTreeMap::new();
        for row in coefficient_rows {
            coefficients.entry(row.scale).or_default().push(row);
        }
        for rows in coefficients.values_mut() {
            rows.sort_by(|a, b| a.earnings_from.cmp(&b.earnings_from));
        }
        study_loan.sort_by(|a, b| a.income_from.cmp(&b.income_from));

        Self {
            tax_year: tax_year.to_string(),
            generation: 0,
            origin: TableOrigin::Injected,
            coefficients,
            medicare,
            study_loan,
        }
    }

    /// Stamps the snapshot with its origin and store generation.
    pub fn with_origin(mut self, origin: TableOrigin, generation: u64) -> Self {
        self.origin = origin;
        self.generation = generation;
        self
    }

    /// Rows for a scale, ordered by lower bound. Empty if the scale is absent.
    pub fn coefficients(&self, scale: TaxScale) -> &[TaxCoefficientRow] {
        self.coefficients
            .get(&scale)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Scales that have at least one row.
    pub fn scales(&self) -> impl Iterator<Item = TaxScale> + '_ {
        self.coefficients.keys().copied()
    }

    /// Checks every table in the snapshot.
    pub fn validate(&self) -> EngineResult<()> {
        for rows in self.coefficients.values() {
            validate_coefficient_rows(&self.tax_year, rows)?;
        }
        if !self.study_loan.is_empty() {
            validate_study_loan_rows(&self.tax_year, &self.study_loan)?;
        }

        let medicare = &self.medicare;
        let invalid = |message: String| EngineError::InvalidRateTable {
            tax_year: self.tax_year.clone(),
            message,
        };
        if medicare.low_threshold > medicare.high_threshold {
            return Err(invalid(format!(
                "levy low threshold {} exceeds high threshold {}",
                medicare.low_threshold, medicare.high_threshold
            )));
        }
        if medicare.rate < Decimal::ZERO || medicare.phase_in_rate < Decimal::ZERO {
            return Err(invalid("levy rates cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// A half-open band on an income axis.
trait Band {
    fn lower(&self) -> Decimal;
    fn upper(&self) -> Option<Decimal>;
}

impl Band for TaxCoefficientRow {
    fn lower(&self) -> Decimal {
        self.earnings_from
    }

    fn upper(&self) -> Option<Decimal> {
        self.earnings_to
    }
}

impl Band for StudyLoanThresholdRow {
    fn lower(&self) -> Decimal {
        self.income_from
    }

    fn upper(&self) -> Option<Decimal> {
        self.income_to
    }
}

fn validate_bands<T: Band>(tax_year: &str, table: &str, rows: &[T]) -> EngineResult<()> {
    let invalid = |message: String| EngineError::InvalidRateTable {
        tax_year: tax_year.to_string(),
        message: format!("{}: {}", table, message),
    };

    let mut sorted: Vec<&T> = rows.iter().collect();
    sorted.sort_by(|a, b| a.lower().cmp(&b.lower()));

    let first = sorted.first().ok_or_else(|| invalid("no rows".to_string()))?;
    if !first.lower().is_zero() {
        return Err(invalid(format!("first band starts at {}, not 0", first.lower())));
    }

    for (index, row) in sorted.iter().enumerate() {
        let is_last = index + 1 == sorted.len();
        match (row.upper(), is_last) {
            (None, true) => {}
            (None, false) => {
                return Err(invalid(format!(
                    "unbounded band from {} is not the top band",
                    row.lower()
                )));
            }
            (Some(upper), true) => {
                return Err(invalid(format!("top band ends at {}; it must be unbounded", upper)));
            }
            (Some(upper), false) => {
                if upper <= row.lower() {
                    return Err(invalid(format!(
                        "band from {} ends at {}",
                        row.lower(),
                        upper
                    )));
                }
                let next = sorted[index + 1].lower();
                if next > upper {
                    return Err(invalid(format!("gap between {} and {}", upper, next)));
                }
                if next < upper {
                    return Err(invalid(format!("overlap between {} and {}", next, upper)));
                }
            }
        }
    }
    Ok(())
}

/// Checks that a scale's rows tile the earnings axis from zero with strictly
/// increasing bounds and exactly one unbounded top row.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{TaxCoefficientRow, TaxScale};
/// use payroll_engine::tax_store::validate_coefficient_rows;
/// use rust_decimal::Decimal;
///
/// let row = |from: i64, to: Option<i64>| TaxCoefficientRow {
///     tax_year: "2024-25".to_string(),
///     scale: TaxScale::TaxFreeThreshold,
///     earnings_from: Decimal::from(from),
///     earnings_to: to.map(Decimal::from),
///     coefficient_a: Decimal::ZERO,
///     coefficient_b: Decimal::ZERO,
/// };
///
/// assert!(validate_coefficient_rows("2024-25", &[row(0, Some(100)), row(100, None)]).is_ok());
/// assert!(validate_coefficient_rows("2024-25", &[row(0, Some(100)), row(150, None)]).is_err());
/// ```
pub fn validate_coefficient_rows(tax_year: &str, rows: &[TaxCoefficientRow]) -> EngineResult<()> {
    let table = rows
        .first()
        .map(|r| r.scale.to_string())
        .unwrap_or_else(|| "coefficients".to_string());
    validate_bands(tax_year, &table, rows)
}

/// Checks that study-loan bands tile the income axis the same way.
pub fn validate_study_loan_rows(tax_year: &str, rows: &[StudyLoanThresholdRow]) -> EngineResult<()> {
    validate_bands(tax_year, "study loan", rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(from: i64, to: Option<i64>) -> TaxCoefficientRow {
        TaxCoefficientRow {
            tax_year: "2024-25".to_string(),
            scale: TaxScale::TaxFreeThreshold,
            earnings_from: Decimal::from(from),
            earnings_to: to.map(Decimal::from),
            coefficient_a: Decimal::ZERO,
            coefficient_b: Decimal::ZERO,
        }
    }

    fn medicare() -> MedicareLevyConfig {
        MedicareLevyConfig {
            tax_year: "2024-25".to_string(),
            rate: Decimal::new(2, 2),
            low_threshold: Decimal::from(26000),
            high_threshold: Decimal::from(32500),
            phase_in_rate: Decimal::new(10, 2),
        }
    }

    #[test]
    fn test_valid_tiling_accepted_in_any_order() {
        let rows = vec![row(100, Some(200)), row(200, None), row(0, Some(100))];
        assert!(validate_coefficient_rows("2024-25", &rows).is_ok());
    }

    #[test]
    fn test_must_start_at_zero() {
        let err = validate_coefficient_rows("2024-25", &[row(10, None)]).unwrap_err();
        assert!(err.to_string().contains("not 0"));
    }

    #[test]
    fn test_gap_rejected() {
        let err =
            validate_coefficient_rows("2024-25", &[row(0, Some(100)), row(101, None)]).unwrap_err();
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn test_overlap_rejected() {
        let err =
            validate_coefficient_rows("2024-25", &[row(0, Some(100)), row(90, None)]).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_two_unbounded_rows_rejected() {
        assert!(validate_coefficient_rows("2024-25", &[row(0, None), row(100, None)]).is_err());
    }

    #[test]
    fn test_bounded_top_row_rejected() {
        let err = validate_coefficient_rows("2024-25", &[row(0, Some(100))]).unwrap_err();
        assert!(err.to_string().contains("must be unbounded"));
    }

    #[test]
    fn test_empty_band_rejected() {
        assert!(
            validate_coefficient_rows("2024-25", &[row(0, Some(0)), row(0, None)]).is_err()
        );
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(validate_coefficient_rows("2024-25", &[]).is_err());
    }

    #[test]
    fn test_snapshot_groups_and_sorts_rows() {
        let mut scale1 = row(0, None);
        scale1.scale = TaxScale::NoTaxFreeThreshold;
        let snapshot = RateTableSnapshot::new(
            "2024-25",
            vec![row(100, None), scale1, row(0, Some(100))],
            medicare(),
            vec![],
        );
        let rows = snapshot.coefficients(TaxScale::TaxFreeThreshold);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].earnings_from, Decimal::ZERO);
        assert_eq!(snapshot.coefficients(TaxScale::NoTaxFreeThreshold).len(), 1);
        assert!(snapshot.coefficients(TaxScale::ForeignResident).is_empty());
        assert_eq!(snapshot.origin, TableOrigin::Injected);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_snapshot_rejects_inverted_levy_thresholds() {
        let mut levy = medicare();
        levy.low_threshold = Decimal::from(40000);
        let snapshot = RateTableSnapshot::new("2024-25", vec![row(0, None)], levy, vec![]);
        assert!(snapshot.validate().is_err());
    }
}
