//! Configuration file structures.
//!
//! These are deserialized from YAML. A rate-table file holds one fiscal
//! year's coefficient rows for every scale, the levy thresholds, and the
//! study-loan bands; rows inherit the file's `tax_year`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    MedicareLevyConfig, StudyLoanThresholdRow, TaxCoefficientRow, TaxScale,
};
use crate::tax_store::RateTableSnapshot;

/// One coefficient row as written in a rate-table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientEntry {
    /// Scale the row belongs to.
    pub scale: TaxScale,
    /// Inclusive lower bound of annual earnings.
    pub earnings_from: Decimal,
    /// Exclusive upper bound; omitted for the top bracket.
    #[serde(default)]
    pub earnings_to: Option<Decimal>,
    /// Multiplier.
    pub coefficient_a: Decimal,
    /// Offset.
    pub coefficient_b: Decimal,
}

/// Levy thresholds as written in a rate-table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareEntry {
    /// Full levy rate.
    pub rate: Decimal,
    /// Annual income below which nothing is payable.
    pub low_threshold: Decimal,
    /// Annual income from which the full rate applies.
    pub high_threshold: Decimal,
    /// Rate on the excess over the low threshold inside the phase-in band.
    pub phase_in_rate: Decimal,
}

/// One study-loan band as written in a rate-table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLoanEntry {
    /// Inclusive lower bound of annual income.
    pub income_from: Decimal,
    /// Exclusive upper bound; omitted for the top band.
    #[serde(default)]
    pub income_to: Option<Decimal>,
    /// Repayment rate.
    pub rate: Decimal,
}

/// A complete rate-table file for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTableFile {
    /// Fiscal year identifier, e.g. "2024-25".
    pub tax_year: String,
    /// Coefficient rows for every scale.
    pub coefficients: Vec<CoefficientEntry>,
    /// Levy thresholds.
    pub medicare: MedicareEntry,
    /// Study-loan bands.
    #[serde(default)]
    pub study_loan: Vec<StudyLoanEntry>,
}

impl RateTableFile {
    /// Coefficient rows for one scale, stamped with the file's year.
    pub fn coefficient_rows(&self, scale: TaxScale) -> Vec<TaxCoefficientRow> {
        self.coefficients
            .iter()
            .filter(|entry| entry.scale == scale)
            .map(|entry| self.coefficient_row(entry))
            .collect()
    }

    /// Levy configuration stamped with the file's year.
    pub fn medicare_config(&self) -> MedicareLevyConfig {
        MedicareLevyConfig {
            tax_year: self.tax_year.clone(),
            rate: self.medicare.rate,
            low_threshold: self.medicare.low_threshold,
            high_threshold: self.medicare.high_threshold,
            phase_in_rate: self.medicare.phase_in_rate,
        }
    }

    /// Study-loan rows stamped with the file's year.
    pub fn study_loan_rows(&self) -> Vec<StudyLoanThresholdRow> {
        self.study_loan
            .iter()
            .map(|entry| StudyLoanThresholdRow {
                tax_year: self.tax_year.clone(),
                income_from: entry.income_from,
                income_to: entry.income_to,
                rate: entry.rate,
            })
            .collect()
    }

    /// Converts the whole file into an injected snapshot.
    pub fn to_snapshot(&self) -> RateTableSnapshot {
        let rows = self
            .coefficients
            .iter()
            .map(|entry| self.coefficient_row(entry))
            .collect();
        RateTableSnapshot::new(
            &self.tax_year,
            rows,
            self.medicare_config(),
            self.study_loan_rows(),
        )
    }

    fn coefficient_row(&self, entry: &CoefficientEntry) -> TaxCoefficientRow {
        TaxCoefficientRow {
            tax_year: self.tax_year.clone(),
            scale: entry.scale,
            earnings_from: entry.earnings_from,
            earnings_to: entry.earnings_to,
            coefficient_a: entry.coefficient_a,
            coefficient_b: entry.coefficient_b,
        }
    }
}
