//! Pay period model.
//!
//! A [`PayPeriod`] is the accounting window shifts are aggregated into. Every
//! aggregate field on it is derived by the synchronizer; only `actual_pay`
//! is recorded from outside.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// 52 periods per year.
    Weekly,
    /// 26 periods per year.
    Fortnightly,
    /// 12 periods per year.
    Monthly,
}

impl PayFrequency {
    /// Number of pay periods in a year.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayFrequency;
    ///
    /// assert_eq!(PayFrequency::Fortnightly.periods_per_year(), 26);
    /// ```
    pub fn periods_per_year(self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Fortnightly => 26,
            PayFrequency::Monthly => 12,
        }
    }
}

/// Lifecycle of a pay period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriodStatus {
    /// Shifts are still being recorded.
    #[default]
    Open,
    /// Aggregates have been computed at least once.
    Calculated,
    /// Payment has been made; aggregates are frozen.
    Paid,
}

/// A stored pay period with its derived aggregates.
///
/// Unique per (owner, start date).
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayFrequency, PayPeriod};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::new(
///     "pp_001",
///     "emp_001",
///     NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
///     PayFrequency::Fortnightly,
/// );
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Unique identifier for the period.
    pub id: String,
    /// The employee the period belongs to.
    pub owner_id: String,
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// How often this employee is paid.
    pub pay_frequency: PayFrequency,
    /// Lifecycle status.
    #[serde(default)]
    pub status: PayPeriodStatus,
    /// Total working hours across all shifts.
    #[serde(default)]
    pub total_hours: Decimal,
    /// Gross pay from regular segments.
    #[serde(default)]
    pub base_pay: Decimal,
    /// Gross pay from overtime segments.
    #[serde(default)]
    pub overtime_pay: Decimal,
    /// Gross pay from penalty and holiday segments.
    #[serde(default)]
    pub penalty_pay: Decimal,
    /// Sum of the three gross components.
    #[serde(default)]
    pub gross_pay: Decimal,
    /// Income tax withheld, including any voluntary extra amount.
    #[serde(default)]
    pub payg_withholding: Decimal,
    /// Health levy withheld.
    #[serde(default)]
    pub medicare_levy: Decimal,
    /// Study loan repayment withheld.
    #[serde(default)]
    pub loan_repayment: Decimal,
    /// Sum of all withholdings.
    #[serde(default)]
    pub total_withholdings: Decimal,
    /// Gross pay less withholdings.
    #[serde(default)]
    pub net_pay: Decimal,
    /// Amount actually paid, as observed outside the engine.
    #[serde(default)]
    pub actual_pay: Option<Decimal>,
}

impl PayPeriod {
    /// Creates an open period with zeroed aggregates.
    pub fn new(
        id: &str,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        pay_frequency: PayFrequency,
    ) -> Self {
        Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            start_date,
            end_date,
            pay_frequency,
            status: PayPeriodStatus::Open,
            total_hours: Decimal::ZERO,
            base_pay: Decimal::ZERO,
            overtime_pay: Decimal::ZERO,
            penalty_pay: Decimal::ZERO,
            gross_pay: Decimal::ZERO,
            payg_withholding: Decimal::ZERO,
            medicare_levy: Decimal::ZERO,
            loan_repayment: Decimal::ZERO,
            total_withholdings: Decimal::ZERO,
            net_pay: Decimal::ZERO,
            actual_pay: None,
        }
    }

    /// Checks if a given date falls within this pay period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days in the period.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Returns true once the period has been paid.
    pub fn is_locked(&self) -> bool {
        self.status == PayPeriodStatus::Paid
    }
}
