//! Tax profile and rate-table models.
//!
//! Rate-table rows are read-only snapshots supplied by the persistence
//! collaborator. A profile decides which withholding scale applies.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Level of health-levy exemption an employee has claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicareExemption {
    /// No exemption.
    #[default]
    None,
    /// Half the levy is exempt.
    Half,
    /// The whole levy is exempt.
    Full,
}

/// An employee's declared withholding situation.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{TaxScale, TaxWithholdingProfile};
///
/// let profile = TaxWithholdingProfile::resident_with_threshold();
/// assert_eq!(profile.scale(), TaxScale::TaxFreeThreshold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxWithholdingProfile {
    /// Whether the tax-free threshold is claimed from this payer.
    pub claimed_tax_free_threshold: bool,
    /// Whether the employee is a foreign resident for tax purposes.
    pub is_foreign_resident: bool,
    /// Whether a tax file number has been supplied.
    pub has_tax_identifier: bool,
    /// Health-levy exemption level.
    #[serde(default)]
    pub medicare_exemption: MedicareExemption,
    /// Whether a study loan is outstanding.
    #[serde(default)]
    pub has_study_loan: bool,
    /// Voluntary flat amount withheld on top of PAYG each period.
    #[serde(default)]
    pub extra_withholding: Decimal,
}

impl TaxWithholdingProfile {
    /// A resident who has supplied a tax file number and claims the threshold.
    pub fn resident_with_threshold() -> Self {
        Self {
            claimed_tax_free_threshold: true,
            is_foreign_resident: false,
            has_tax_identifier: true,
            medicare_exemption: MedicareExemption::None,
            has_study_loan: false,
            extra_withholding: Decimal::ZERO,
        }
    }

    /// The profile assumed when none is on record: withhold the most.
    pub fn conservative_default() -> Self {
        Self {
            claimed_tax_free_threshold: false,
            is_foreign_resident: false,
            has_tax_identifier: false,
            medicare_exemption: MedicareExemption::None,
            has_study_loan: false,
            extra_withholding: Decimal::ZERO,
        }
    }

    /// Resolves the withholding scale by priority.
    ///
    /// Missing tax identifier beats foreign residency, which beats a levy
    /// exemption, which beats the threshold claim.
    pub fn scale(&self) -> TaxScale {
        if !self.has_tax_identifier {
            TaxScale::NoTaxIdentifier
        } else if self.is_foreign_resident {
            TaxScale::ForeignResident
        } else if self.medicare_exemption == MedicareExemption::Full {
            TaxScale::FullMedicareExemption
        } else if self.medicare_exemption == MedicareExemption::Half {
            TaxScale::HalfMedicareExemption
        } else if self.claimed_tax_free_threshold {
            TaxScale::TaxFreeThreshold
        } else {
            TaxScale::NoTaxFreeThreshold
        }
    }
}

/// A named withholding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxScale {
    /// Scale 1: threshold not claimed.
    NoTaxFreeThreshold,
    /// Scale 2: threshold claimed.
    TaxFreeThreshold,
    /// Scale 3: foreign resident, flat rates.
    ForeignResident,
    /// Scale 4: no tax file number, highest withholding.
    NoTaxIdentifier,
    /// Scale 5: full health-levy exemption.
    FullMedicareExemption,
    /// Scale 6: half health-levy exemption.
    HalfMedicareExemption,
}

impl TaxScale {
    /// Every scale, in scale-number order.
    pub const ALL: [TaxScale; 6] = [
        TaxScale::NoTaxFreeThreshold,
        TaxScale::TaxFreeThreshold,
        TaxScale::ForeignResident,
        TaxScale::NoTaxIdentifier,
        TaxScale::FullMedicareExemption,
        TaxScale::HalfMedicareExemption,
    ];

    /// The published scale number.
    pub fn number(self) -> u8 {
        match self {
            TaxScale::NoTaxFreeThreshold => 1,
            TaxScale::TaxFreeThreshold => 2,
            TaxScale::ForeignResident => 3,
            TaxScale::NoTaxIdentifier => 4,
            TaxScale::FullMedicareExemption => 5,
            TaxScale::HalfMedicareExemption => 6,
        }
    }

    /// The scale used when the profile cannot be resolved.
    pub fn conservative_default() -> Self {
        TaxScale::NoTaxIdentifier
    }
}

impl fmt::Display for TaxScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale {}", self.number())
    }
}

/// One bracket of a withholding scale: `annual tax = earnings × A − B`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCoefficientRow {
    /// Fiscal year identifier, e.g. "2024-25".
    pub tax_year: String,
    /// Scale the row belongs to.
    pub scale: TaxScale,
    /// Inclusive lower bound of annual earnings.
    pub earnings_from: Decimal,
    /// Exclusive upper bound; `None` for the top bracket.
    #[serde(default)]
    pub earnings_to: Option<Decimal>,
    /// Multiplier.
    pub coefficient_a: Decimal,
    /// Offset.
    pub coefficient_b: Decimal,
}

impl TaxCoefficientRow {
    /// Returns true if the row's bracket contains the annual earnings.
    pub fn covers(&self, annual_earnings: Decimal) -> bool {
        annual_earnings >= self.earnings_from
            && self.earnings_to.is_none_or(|to| annual_earnings < to)
    }
}

/// One band of study-loan repayment rates by annual income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLoanThresholdRow {
    /// Fiscal year identifier.
    pub tax_year: String,
    /// Inclusive lower bound of annual income.
    pub income_from: Decimal,
    /// Exclusive upper bound; `None` for the top band.
    #[serde(default)]
    pub income_to: Option<Decimal>,
    /// Repayment rate applied to gross pay.
    pub rate: Decimal,
}

impl StudyLoanThresholdRow {
    /// Returns true if the band contains the annual income.
    pub fn covers(&self, annual_income: Decimal) -> bool {
        annual_income >= self.income_from && self.income_to.is_none_or(|to| annual_income < to)
    }
}

/// Health-levy thresholds for a fiscal year.
///
/// Below `low_threshold` nothing is payable. Between the thresholds the levy
/// is `phase_in_rate` of the excess over `low_threshold`, capped at the full
/// levy. From `high_threshold` up the full `rate` applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareLevyConfig {
    /// Fiscal year identifier.
    pub tax_year: String,
    /// Full levy rate, e.g. 0.02.
    pub rate: Decimal,
    /// Annual income below which no levy applies.
    pub low_threshold: Decimal,
    /// Annual income from which the full levy applies.
    pub high_threshold: Decimal,
    /// Rate applied to income above the low threshold inside the phase-in band.
    pub phase_in_rate: Decimal,
}

/// Cumulative figures for an employee within one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearToDateTax {
    /// The employee.
    pub owner_id: String,
    /// Fiscal year identifier.
    pub tax_year: String,
    /// Cumulative gross pay.
    pub gross_pay: Decimal,
    /// Cumulative total withholdings.
    pub total_withheld: Decimal,
}

impl YearToDateTax {
    /// A zeroed record for the owner and year.
    pub fn empty(owner_id: &str, tax_year: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            tax_year: tax_year.to_string(),
            gross_pay: Decimal::ZERO,
            total_withheld: Decimal::ZERO,
        }
    }
}

/// A parsed fiscal-year identifier of the form `"2024-25"`, running from
/// 1 July of the first year to 30 June of the next.
///
/// # Example
///
/// ```
/// use payroll_engine::models::TaxYear;
/// use chrono::NaiveDate;
///
/// let year: TaxYear = "2024-25".parse().unwrap();
/// assert!(year.contains(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
/// assert!(!year.contains(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaxYear {
    start_year: i32,
}

impl TaxYear {
    /// The fiscal year containing the date.
    pub fn containing(date: NaiveDate) -> Self {
        use chrono::Datelike;
        let start_year = if date.month() >= 7 {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start_year }
    }

    /// 1 July of the starting year.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 7, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 30 June of the following year.
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 6, 30).unwrap_or(NaiveDate::MAX)
    }

    /// Returns true if the date falls inside the fiscal year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1) % 100)
    }
}

impl FromStr for TaxYear {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidInput {
            field: "tax_year".to_string(),
            message: format!("expected a fiscal year like 2024-25, got '{}'", s),
        };

        let (first, second) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start_year: i32 = first.parse().map_err(|_| invalid())?;
        let suffix: i32 = second.parse().map_err(|_| invalid())?;
        if second.len() != 2 || (start_year + 1) % 100 != suffix {
            return Err(invalid());
        }
        Ok(Self { start_year })
    }
}
