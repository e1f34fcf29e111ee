//! Per-period tax withholding.
//!
//! Withholding is computed on annualised earnings: the period's gross is
//! multiplied by the number of periods in a year, the bracket's linear
//! formula `earnings × A − B` gives the annual tax, and the result is divided
//! back down and rounded to the cent. The levy and study-loan repayment are
//! worked out the same way. Each period stands alone; year-to-date figures are
//! only reported.
//!
//! Rate tables are passed in as a [`RateTableSnapshot`], so the calculation
//! depends on nothing but its arguments.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    MedicareExemption, MedicareLevyConfig, PayFrequency, StudyLoanThresholdRow, TableOrigin,
    TaxBreakdown, TaxCoefficientRow, TaxScale, TaxWithholdingProfile, YearToDateTax,
};
use crate::tax_store::RateTableSnapshot;

use super::time_math::round_money;

/// 0.5, applied to the levy under a half exemption.
const HALF: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Computes the withholding for one period's gross pay.
///
/// A missing profile is treated as the conservative default (no tax file
/// number) and the result is flagged degraded. So is a scale with no rows in
/// the snapshot, an earnings figure no bracket covers, and a snapshot built
/// from the bundled fallback tables. Payroll always gets a number.
///
/// The profile's flat extra withholding is added to `payg_withholding`
/// unmodified and also reported on its own as `extra_withholding`.
///
/// # Errors
///
/// Returns `InvalidInput` for a negative gross or negative extra withholding,
/// and `InvalidRateTable` if the snapshot has no coefficient rows at all.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_period_tax;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::{PayFrequency, TaxScale, TaxWithholdingProfile};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let tables = ConfigLoader::bundled_rate_tables()?.to_snapshot();
/// let profile = TaxWithholdingProfile::resident_with_threshold();
///
/// let tax = calculate_period_tax(
///     Decimal::from(1000),
///     Some(&profile),
///     PayFrequency::Weekly,
///     None,
///     &tables,
/// )?;
/// assert_eq!(tax.scale, TaxScale::TaxFreeThreshold);
/// assert_eq!(tax.payg_withholding, Decimal::from_str("122.85").unwrap());
/// assert_eq!(tax.medicare_levy, Decimal::from_str("20.00").unwrap());
/// assert!(!tax.degraded);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn calculate_period_tax(
    gross: Decimal,
    profile: Option<&TaxWithholdingProfile>,
    pay_frequency: PayFrequency,
    year_to_date: Option<&YearToDateTax>,
    tables: &RateTableSnapshot,
) -> EngineResult<TaxBreakdown> {
    if gross < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "gross_pay".to_string(),
            message: format!("gross pay cannot be negative, got {}", gross),
        });
    }

    let mut notes = Vec::new();
    let mut degraded = false;

    let conservative;
    let profile = match profile {
        Some(profile) => profile,
        None => {
            conservative = TaxWithholdingProfile::conservative_default();
            degraded = true;
            notes.push("no withholding profile on record; conservative scale applied".to_string());
            &conservative
        }
    };
    if profile.extra_withholding < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "extra_withholding".to_string(),
            message: format!(
                "extra withholding cannot be negative, got {}",
                profile.extra_withholding
            ),
        });
    }

    if tables.origin == TableOrigin::BundledDefault {
        degraded = true;
        notes.push(format!(
            "rate tables for {} unavailable; bundled defaults used",
            tables.tax_year
        ));
    }

    let periods = Decimal::from(pay_frequency.periods_per_year());
    let annual_earnings = gross * periods;

    let (scale, rows) = resolve_rows(profile.scale(), tables, &mut notes)?;
    if scale != profile.scale() {
        degraded = true;
    }

    let mut breakdown = TaxBreakdown {
        tax_year: tables.tax_year.clone(),
        scale,
        gross_pay: gross,
        annual_earnings,
        payg_withholding: Decimal::ZERO,
        extra_withholding: Decimal::ZERO,
        medicare_levy: Decimal::ZERO,
        study_loan_amount: Decimal::ZERO,
        total_withholdings: Decimal::ZERO,
        net_pay: gross,
        degraded,
        source: tables.origin,
        generation: tables.generation,
        notes,
    };

    if gross.is_zero() {
        return Ok(breakdown);
    }

    let (row, exact) = find_bracket(rows, annual_earnings);
    if !exact {
        breakdown.degraded = true;
        breakdown.notes.push(format!(
            "no {} bracket covers annual earnings of {}; nearest bracket from {} used",
            scale, annual_earnings, row.earnings_from
        ));
        warn!(
            tax_year = %tables.tax_year,
            scale = %scale,
            annual_earnings = %annual_earnings,
            "Degraded bracket lookup"
        );
    }

    let annual_tax = (annual_earnings * row.coefficient_a - row.coefficient_b).max(Decimal::ZERO);
    let payg = round_money(annual_tax / periods);

    breakdown.extra_withholding = profile.extra_withholding;
    breakdown.payg_withholding = payg + profile.extra_withholding;
    breakdown.medicare_levy = round_money(
        annual_medicare_levy(annual_earnings, profile, &tables.medicare) / periods,
    );
    if profile.has_study_loan {
        breakdown.study_loan_amount = study_loan_repayment(gross, annual_earnings, &tables.study_loan);
    }

    breakdown.total_withholdings =
        breakdown.payg_withholding + breakdown.medicare_levy + breakdown.study_loan_amount;
    breakdown.net_pay = gross - breakdown.total_withholdings;

    match year_to_date {
        Some(ytd) => debug!(
            owner_id = %ytd.owner_id,
            tax_year = %ytd.tax_year,
            ytd_gross = %ytd.gross_pay,
            ytd_withheld = %ytd.total_withheld,
            period_withheld = %breakdown.total_withholdings,
            "Calculated period tax"
        ),
        None => debug!(
            scale = %scale,
            gross = %gross,
            period_withheld = %breakdown.total_withholdings,
            "Calculated period tax"
        ),
    }

    Ok(breakdown)
}

/// Picks the rows for the scale, falling back to the conservative scale and
/// then to any scale the snapshot has.
fn resolve_rows<'a>(
    scale: TaxScale,
    tables: &'a RateTableSnapshot,
    notes: &mut Vec<String>,
) -> EngineResult<(TaxScale, &'a [TaxCoefficientRow])> {
    let rows = tables.coefficients(scale);
    if !rows.is_empty() {
        return Ok((scale, rows));
    }

    let fallback = std::iter::once(TaxScale::conservative_default())
        .chain(tables.scales())
        .find(|candidate| !tables.coefficients(*candidate).is_empty())
        .ok_or_else(|| EngineError::InvalidRateTable {
            tax_year: tables.tax_year.clone(),
            message: "no coefficient rows for any scale".to_string(),
        })?;

    notes.push(format!("no rows for {}; {} used instead", scale, fallback));
    warn!(
        tax_year = %tables.tax_year,
        requested = %scale,
        used = %fallback,
        "Scale missing from rate tables"
    );
    Ok((fallback, tables.coefficients(fallback)))
}

/// Returns the covering bracket, or the nearest one below (the first one if
/// earnings sit below every bracket) with `false`.
fn find_bracket(rows: &[TaxCoefficientRow], annual_earnings: Decimal) -> (&TaxCoefficientRow, bool) {
    if let Some(row) = rows.iter().find(|row| row.covers(annual_earnings)) {
        return (row, true);
    }
    let nearest = rows
        .iter()
        .rev()
        .find(|row| row.earnings_from <= annual_earnings)
        .unwrap_or(&rows[0]);
    (nearest, false)
}

/// The levy on annual earnings: nothing below the low threshold, the lesser
/// of the phase-in amount and the full rate between the thresholds, and the
/// full rate from the high threshold up.
fn annual_medicare_levy(
    annual_earnings: Decimal,
    profile: &TaxWithholdingProfile,
    config: &MedicareLevyConfig,
) -> Decimal {
    if profile.is_foreign_resident || profile.medicare_exemption == MedicareExemption::Full {
        return Decimal::ZERO;
    }

    let full = annual_earnings * config.rate;
    let levy = if annual_earnings < config.low_threshold {
        Decimal::ZERO
    } else if annual_earnings < config.high_threshold {
        (config.phase_in_rate * (annual_earnings - config.low_threshold)).min(full)
    } else {
        full
    };

    match profile.medicare_exemption {
        MedicareExemption::Half => levy * HALF,
        _ => levy,
    }
}

/// Study-loan repayment: the annual-income band's rate applied to the
/// period's gross.
fn study_loan_repayment(
    gross: Decimal,
    annual_earnings: Decimal,
    bands: &[StudyLoanThresholdRow],
) -> Decimal {
    bands
        .iter()
        .find(|band| band.covers(annual_earnings))
        .map(|band| round_money(gross * band.rate))
        .unwrap_or(Decimal::ZERO)
}
