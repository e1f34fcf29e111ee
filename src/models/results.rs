//! Result records produced by the engine.
//!
//! These are immutable value records: [`ShiftBreakdown`] for one shift,
//! [`PayPeriodResult`] for a synchronized period, and [`ValidationReport`]
//! for drift detection. All of them serialize with serde so callers can pick
//! their own transport.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TaxScale;

/// What a segment of worked time is paid as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Ordinary time at the loaded base rate.
    Regular,
    /// Time covered by a day-of-week or time-window penalty rule.
    Penalty,
    /// Time worked on a public holiday.
    Holiday,
    /// The first two hours past the daily threshold.
    OvertimeTier1,
    /// Overtime beyond the first two hours.
    OvertimeTier2,
    /// Overtime covered by a matching overtime rule.
    OvertimeRule,
}

impl SegmentKind {
    /// True for the three overtime kinds.
    pub fn is_overtime(self) -> bool {
        matches!(
            self,
            SegmentKind::OvertimeTier1 | SegmentKind::OvertimeTier2 | SegmentKind::OvertimeRule
        )
    }

    /// True for penalty and holiday time.
    pub fn is_penalty(self) -> bool {
        matches!(self, SegmentKind::Penalty | SegmentKind::Holiday)
    }
}

/// A contiguous classification of worked minutes within one shift.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PaySegment, SegmentKind};
/// use rust_decimal::Decimal;
///
/// let segment = PaySegment {
///     kind: SegmentKind::Regular,
///     label: "regular".to_string(),
///     multiplier: Decimal::ONE,
///     minutes: 480,
///     hours: Decimal::from(8),
///     rate: Decimal::new(2500, 2),
///     amount: Decimal::new(20000, 2),
/// };
/// assert!(!segment.kind.is_overtime());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaySegment {
    /// Classification of the minutes.
    pub kind: SegmentKind,
    /// Rule ID or tier name.
    pub label: String,
    /// Multiplier applied to the loaded base rate.
    pub multiplier: Decimal,
    /// Worked minutes in the segment.
    pub minutes: i64,
    /// Worked hours, rounded to two places.
    pub hours: Decimal,
    /// Hourly rate after loading and multiplier.
    pub rate: Decimal,
    /// Amount paid, rounded to the cent.
    pub amount: Decimal,
}

/// Gross pay split into its components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTotals {
    /// Regular segments.
    pub base_pay: Decimal,
    /// Overtime segments.
    pub overtime_pay: Decimal,
    /// Penalty and holiday segments.
    pub penalty_pay: Decimal,
    /// Sum of the three.
    pub total_gross_pay: Decimal,
}

/// Span, break, and working time of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDuration {
    /// Minutes between start and end.
    pub total_minutes: i64,
    /// Nominal break minutes, reported in full even when they exceed the span.
    pub break_minutes: i64,
    /// `max(0, total - break)`.
    pub working_minutes: i64,
    /// Working minutes as hours, rounded half-up to two places.
    pub working_hours: Decimal,
}

/// A single step in the audit trail recording a classification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The rule or pass that made the decision.
    pub rule_id: String,
    /// Human-readable name.
    pub rule_name: String,
    /// Inputs considered.
    pub input: serde_json::Value,
    /// What was decided.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A non-fatal condition noticed during calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineWarning {
    /// Machine-readable code, e.g. `BREAK_EXCEEDS_SHIFT`.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

impl EngineWarning {
    /// Creates a warning.
    pub fn new(code: &str, message: impl Into<String>, severity: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        }
    }
}

/// Itemized gross pay for one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBreakdown {
    /// The shift calculated.
    pub shift_id: String,
    /// The date every rule was evaluated against.
    pub date: NaiveDate,
    /// Durations over the paid interval, up to `effective_end`. Segment
    /// minutes always sum to `duration.working_minutes`.
    pub duration: ShiftDuration,
    /// Durations as recorded, before any minimum-shift extension.
    pub recorded_duration: ShiftDuration,
    /// End time used for decomposition (extended if a minimum applied).
    pub effective_end: NaiveDateTime,
    /// Whether the end was extended to meet the award's minimum shift.
    pub minimum_shift_applied: bool,
    /// Ordered segments; their minutes sum to the paid working minutes.
    pub segments: Vec<PaySegment>,
    /// Gross totals; `total_gross_pay` equals the sum of segment amounts.
    pub totals: PayTotals,
    /// Decision trail.
    pub audit_steps: Vec<AuditStep>,
    /// Non-fatal conditions.
    pub warnings: Vec<EngineWarning>,
}

impl ShiftBreakdown {
    /// Minutes actually paid, including any minimum-shift extension.
    pub fn paid_minutes(&self) -> i64 {
        self.segments.iter().map(|s| s.minutes).sum()
    }
}

/// Where the rate tables behind a tax calculation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrigin {
    /// Read from the live rate-table source.
    Live,
    /// The bundled default table, used because the live source failed.
    BundledDefault,
    /// Constructed directly by the caller.
    Injected,
}

/// Withholding for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Fiscal year of the rate tables used.
    pub tax_year: String,
    /// Scale that was applied.
    pub scale: TaxScale,
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// Gross pay multiplied out to a year.
    pub annual_earnings: Decimal,
    /// Income tax withheld, including `extra_withholding`.
    pub payg_withholding: Decimal,
    /// Voluntary extra amount included in `payg_withholding`.
    pub extra_withholding: Decimal,
    /// Health levy.
    pub medicare_levy: Decimal,
    /// Study loan repayment.
    pub study_loan_amount: Decimal,
    /// Sum of PAYG, levy, and loan repayment.
    pub total_withholdings: Decimal,
    /// Gross pay less total withholdings.
    pub net_pay: Decimal,
    /// True if a fallback bracket or scale had to be used.
    pub degraded: bool,
    /// Origin of the rate tables.
    pub source: TableOrigin,
    /// Store generation the rate tables were loaded at.
    pub generation: u64,
    /// Explanations for any fallback taken.
    pub notes: Vec<String>,
}

/// Recomputed aggregates for a pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodResult {
    /// The period.
    pub period_id: String,
    /// The employee.
    pub owner_id: String,
    /// Number of closed shifts aggregated.
    pub shift_count: usize,
    /// Shifts skipped because they are still open.
    pub skipped_open_shifts: Vec<String>,
    /// Total paid hours.
    pub total_hours: Decimal,
    /// Gross components and total.
    pub totals: PayTotals,
    /// Withholding and net pay.
    pub tax: TaxBreakdown,
    /// Per-shift breakdowns in start-time order.
    pub shifts: Vec<ShiftBreakdown>,
    /// `actual_pay - net_pay` when an actual payment has been recorded.
    pub variance: Option<Decimal>,
    /// Period-level warnings (shift warnings stay on their breakdowns).
    pub warnings: Vec<EngineWarning>,
}

/// One aggregate field whose stored value differs from the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDrift {
    /// Name of the pay period field.
    pub field: String,
    /// Value currently stored.
    pub stored: Decimal,
    /// Value recomputed from the shifts.
    pub expected: Decimal,
    /// `stored - expected`.
    pub difference: Decimal,
}

/// Outcome of comparing a stored period against a fresh recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The period checked.
    pub period_id: String,
    /// Fields that differ; empty when the stored record is current.
    pub drift: Vec<FieldDrift>,
}

impl ValidationReport {
    /// True if any stored field differs from its recomputed value.
    pub fn has_drift(&self) -> bool {
        !self.drift.is_empty()
    }
}
