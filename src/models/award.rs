//! Award model: base rates, overtime thresholds, and the penalty and overtime
//! rules that apply to shifts worked under it.

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A public holiday recognised by an award.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PublicHoliday;
/// use chrono::NaiveDate;
///
/// let holiday = PublicHoliday {
///     date: NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
///     name: "Australia Day".to_string(),
///     region: "national".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// The date of the public holiday.
    pub date: NaiveDate,
    /// The name of the public holiday (e.g., "Australia Day").
    pub name: String,
    /// The region where this holiday applies (e.g., "national", "VIC", "NSW").
    #[serde(default)]
    pub region: String,
}

/// The predicates a penalty or overtime rule is matched on.
///
/// A rule matches when every populated predicate holds. `day_of_week` counts
/// from 0 = Sunday to 6 = Saturday. A window whose end is at or before its
/// start runs past midnight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Day of the week the shift date must fall on.
    #[serde(default)]
    pub day_of_week: Option<u8>,
    /// Start of the time-of-day window.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// End of the time-of-day window.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// `Some(true)` only on public holidays, `Some(false)` never on them.
    #[serde(default)]
    pub public_holiday: Option<bool>,
}

impl RuleConditions {
    /// Returns the time-of-day window if both bounds are set.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Checks the date-level predicates (day of week and holiday flag).
    pub fn matches_date(&self, date: NaiveDate, is_holiday: bool) -> bool {
        if let Some(dow) = self.day_of_week {
            if date.weekday().num_days_from_sunday() != u32::from(dow) {
                return false;
            }
        }
        match self.public_holiday {
            Some(required) => required == is_holiday,
            None => true,
        }
    }

    /// True for rules that only constrain the day of week.
    pub fn is_day_only(&self) -> bool {
        self.day_of_week.is_some() && self.window().is_none() && self.public_holiday != Some(true)
    }

    /// True for rules that only apply on public holidays.
    pub fn is_holiday_rule(&self) -> bool {
        self.public_holiday == Some(true)
    }

    fn validate(&self, award_id: &str, rule_id: &str) -> EngineResult<()> {
        if let Some(dow) = self.day_of_week {
            if dow > 6 {
                return Err(EngineError::InvalidAward {
                    award_id: award_id.to_string(),
                    message: format!("rule '{}' has day_of_week {} outside 0-6", rule_id, dow),
                });
            }
        }
        if self.start_time.is_some() != self.end_time.is_some() {
            return Err(EngineError::InvalidAward {
                award_id: award_id.to_string(),
                message: format!("rule '{}' has only one window bound", rule_id),
            });
        }
        Ok(())
    }
}

/// A penalty rate paid for work at particular times or on particular days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRule {
    /// Identifier used as the segment label.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Multiplier applied to the loaded base rate.
    pub multiplier: Decimal,
    /// When the rule applies.
    #[serde(flatten)]
    pub conditions: RuleConditions,
    /// Inactive rules are ignored.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An overtime rate that replaces the tiered rate for matching overtime minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRule {
    /// Identifier used as the segment label.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Multiplier applied to the loaded base rate.
    pub multiplier: Decimal,
    /// When the rule applies.
    #[serde(flatten)]
    pub conditions: RuleConditions,
    /// Inactive rules are ignored.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Pay rules for a group of employees.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Award;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let award = Award::new(
///     "retail",
///     Decimal::new(2500, 2),
///     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
/// );
/// assert_eq!(award.daily_overtime_threshold_hours, Decimal::from(8));
/// assert!(award.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    /// Unique identifier for the award.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Hourly base rate.
    pub base_rate: Decimal,
    /// Additive casual loading, e.g. 0.25 for 25%.
    #[serde(default)]
    pub casual_loading_rate: Decimal,
    /// Working hours per shift before overtime starts.
    pub daily_overtime_threshold_hours: Decimal,
    /// Working hours per week before weekly overtime is reported.
    pub weekly_overtime_threshold_hours: Decimal,
    /// Multiplier for the first two overtime hours.
    pub overtime_tier1_multiplier: Decimal,
    /// Multiplier for overtime beyond the first two hours.
    pub overtime_tier2_multiplier: Decimal,
    /// Shorter shifts are extended to this length before decomposition.
    #[serde(default)]
    pub minimum_shift_hours: Option<Decimal>,
    /// Longer shifts are flagged with a warning.
    #[serde(default)]
    pub maximum_shift_hours: Option<Decimal>,
    /// Timezone label for the wall-clock instants of shifts under this award.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// First date the award applies.
    pub effective_from: NaiveDate,
    /// Last date the award applies, if it has been superseded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Inactive awards still calculate but are flagged.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Penalty rules.
    #[serde(default)]
    pub penalty_rules: Vec<PenaltyRule>,
    /// Overtime rules.
    #[serde(default)]
    pub overtime_rules: Vec<OvertimeRule>,
    /// Public holidays.
    #[serde(default)]
    pub public_holidays: Vec<PublicHoliday>,
}

fn default_timezone() -> String {
    "Australia/Sydney".to_string()
}

impl Award {
    /// Creates an award with an 8/38 hour threshold and 1.5x/2x overtime.
    pub fn new(id: &str, base_rate: Decimal, effective_from: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            base_rate,
            casual_loading_rate: Decimal::ZERO,
            daily_overtime_threshold_hours: Decimal::from(8),
            weekly_overtime_threshold_hours: Decimal::from(38),
            overtime_tier1_multiplier: Decimal::new(15, 1),
            overtime_tier2_multiplier: Decimal::from(2),
            minimum_shift_hours: None,
            maximum_shift_hours: None,
            timezone: default_timezone(),
            effective_from,
            effective_to: None,
            is_active: true,
            penalty_rules: vec![],
            overtime_rules: vec![],
            public_holidays: vec![],
        }
    }

    /// Returns true if the award's effective range covers the date.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Iterates over the active penalty rules.
    pub fn active_penalty_rules(&self) -> impl Iterator<Item = &PenaltyRule> {
        self.penalty_rules.iter().filter(|r| r.is_active)
    }

    /// Iterates over the active overtime rules.
    pub fn active_overtime_rules(&self) -> impl Iterator<Item = &OvertimeRule> {
        self.overtime_rules.iter().filter(|r| r.is_active)
    }

    /// Rejects negative rates, thresholds, and malformed rules.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidAward {
            award_id: self.id.clone(),
            message,
        };

        let non_negative = [
            ("base_rate", self.base_rate),
            ("casual_loading_rate", self.casual_loading_rate),
            (
                "daily_overtime_threshold_hours",
                self.daily_overtime_threshold_hours,
            ),
            (
                "weekly_overtime_threshold_hours",
                self.weekly_overtime_threshold_hours,
            ),
            ("overtime_tier1_multiplier", self.overtime_tier1_multiplier),
            ("overtime_tier2_multiplier", self.overtime_tier2_multiplier),
        ];
        for (field, value) in non_negative {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(invalid(format!("{} cannot be negative: {}", field, value)));
            }
        }

        for (field, value) in [
            ("minimum_shift_hours", self.minimum_shift_hours),
            ("maximum_shift_hours", self.maximum_shift_hours),
        ] {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(invalid(format!("{} cannot be negative: {}", field, v)));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.minimum_shift_hours, self.maximum_shift_hours) {
            if min > max {
                return Err(invalid(format!(
                    "minimum shift {} exceeds maximum shift {}",
                    min, max
                )));
            }
        }

        for rule in &self.penalty_rules {
            if rule.multiplier < Decimal::ZERO {
                return Err(invalid(format!("rule '{}' has a negative multiplier", rule.id)));
            }
            rule.conditions.validate(&self.id, &rule.id)?;
        }
        for rule in &self.overtime_rules {
            if rule.multiplier < Decimal::ZERO {
                return Err(invalid(format!("rule '{}' has a negative multiplier", rule.id)));
            }
            rule.conditions.validate(&self.id, &rule.id)?;
        }
        Ok(())
    }
}
