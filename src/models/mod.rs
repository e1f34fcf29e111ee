//! Core data models for the payroll engine.
//!
//! This module contains the plain records the engine consumes (shifts, awards,
//! pay periods, tax profiles, rate-table rows) and the result records it
//! returns.

mod award;
mod pay_period;
mod results;
mod shift;
mod tax;

pub use award::{Award, OvertimeRule, PenaltyRule, PublicHoliday, RuleConditions};
pub use pay_period::{PayFrequency, PayPeriod, PayPeriodStatus};
pub use results::{
    AuditStep, EngineWarning, FieldDrift, PayPeriodResult, PaySegment, PayTotals, SegmentKind,
    ShiftBreakdown, ShiftDuration, TableOrigin, TaxBreakdown, ValidationReport,
};
pub use shift::{BreakPeriod, Shift};
pub use tax::{
    MedicareExemption, MedicareLevyConfig, StudyLoanThresholdRow, TaxCoefficientRow, TaxScale,
    TaxWithholdingProfile, TaxYear, YearToDateTax,
};
