//! Shift model and related types.
//!
//! This module defines the [`Shift`] and [`BreakPeriod`] records that raw
//! time-worked data arrives as.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A break taken during a shift, with known start and end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    /// The ID of the shift this break belongs to.
    pub shift_ref: String,
    /// The start of the break.
    pub start_time: NaiveDateTime,
    /// The end of the break.
    pub end_time: NaiveDateTime,
}

impl BreakPeriod {
    /// Returns the duration of the break in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A recorded block of work.
///
/// A shift is open while `end_time` is unset. Instants are wall-clock times in
/// the award's timezone.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Shift;
/// use chrono::NaiveDateTime;
///
/// let shift = Shift {
///     id: "shift_001".to_string(),
///     owner_id: "emp_001".to_string(),
///     start_time: NaiveDateTime::parse_from_str("2025-03-04 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     end_time: None,
///     break_minutes: 0,
///     breaks: vec![],
///     award_ref: "retail".to_string(),
///     period_ref: None,
/// };
/// assert!(shift.is_open());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier for the shift.
    pub id: String,
    /// The employee who worked (and owns) the shift.
    pub owner_id: String,
    /// When work started.
    pub start_time: NaiveDateTime,
    /// When work ended; `None` while the shift is still running.
    pub end_time: Option<NaiveDateTime>,
    /// Nominal unpaid break, used when no break periods are recorded.
    #[serde(default)]
    pub break_minutes: i64,
    /// Positioned breaks. When present their total replaces `break_minutes`.
    #[serde(default)]
    pub breaks: Vec<BreakPeriod>,
    /// The award the shift is paid under.
    pub award_ref: String,
    /// The pay period the shift is aggregated into.
    #[serde(default)]
    pub period_ref: Option<String>,
}

impl Shift {
    /// Returns true while the shift has no end time.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// The calendar date that every per-shift rule is evaluated against.
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Returns the day of the week the shift started on.
    pub fn day_of_week(&self) -> Weekday {
        self.date().weekday()
    }

    /// The break deducted from the shift's span, in minutes.
    ///
    /// Recorded break periods win over the nominal `break_minutes`.
    pub fn effective_break_minutes(&self) -> i64 {
        if self.breaks.is_empty() {
            self.break_minutes
        } else {
            self.breaks.iter().map(BreakPeriod::duration_minutes).sum()
        }
    }

    /// Returns the end time, or an error if the shift is still open.
    pub fn closed_end(&self) -> EngineResult<NaiveDateTime> {
        self.end_time.ok_or_else(|| EngineError::InvalidShift {
            shift_id: self.id.clone(),
            message: "shift is still open".to_string(),
        })
    }

    /// Rejects malformed time data before any calculation runs.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidShift {
            shift_id: self.id.clone(),
            message,
        };

        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(invalid("end time before start time".to_string()));
            }
        }
        if self.break_minutes < 0 {
            return Err(invalid(format!(
                "break minutes cannot be negative: {}",
                self.break_minutes
            )));
        }
        let mut breaks: Vec<&BreakPeriod> = self.breaks.iter().collect();
        breaks.sort_by_key(|b| b.start_time);
        for brk in &breaks {
            if brk.end_time < brk.start_time {
                return Err(invalid(format!(
                    "break ending {} starts after it ends",
                    brk.end_time
                )));
            }
            let outside_end = self.end_time.is_some_and(|end| brk.end_time > end);
            if brk.start_time < self.start_time || outside_end {
                return Err(invalid(format!(
                    "break {} - {} lies outside the shift",
                    brk.start_time, brk.end_time
                )));
            }
        }
        for pair in breaks.windows(2) {
            if pair[1].start_time < pair[0].end_time {
                return Err(invalid(format!(
                    "breaks starting {} and {} overlap",
                    pair[0].start_time, pair[1].start_time
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn create_test_shift(start: &str, end: Option<&str>) -> Shift {
        Shift {
            id: "shift_001".to_string(),
            owner_id: "emp_001".to_string(),
            start_time: make_datetime(start),
            end_time: end.map(make_datetime),
            break_minutes: 0,
            breaks: vec![],
            award_ref: "retail".to_string(),
            period_ref: Some("pp_001".to_string()),
        }
    }

    #[test]
    fn test_open_shift_has_no_closed_end() {
        let shift = create_test_shift("2025-03-04 09:00:00", None);
        assert!(shift.is_open());
        assert!(matches!(
            shift.closed_end(),
            Err(EngineError::InvalidShift { .. })
        ));
    }

    #[test]
    fn test_date_uses_start_time() {
        let shift = create_test_shift("2025-03-04 22:00:00", Some("2025-03-05 06:00:00"));
        assert_eq!(shift.date(), NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(shift.day_of_week(), Weekday::Tue);
    }

    #[test]
    fn test_break_periods_replace_nominal_break() {
        let mut shift = create_test_shift("2025-03-04 09:00:00", Some("2025-03-04 17:00:00"));
        shift.break_minutes = 15;
        assert_eq!(shift.effective_break_minutes(), 15);

        shift.breaks = vec![BreakPeriod {
            shift_ref: "shift_001".to_string(),
            start_time: make_datetime("2025-03-04 12:00:00"),
            end_time: make_datetime("2025-03-04 12:45:00"),
        }];
        assert_eq!(shift.effective_break_minutes(), 45);
    }

    #[test]
    fn test_validate_rejects_reversed_times() {
        let shift = create_test_shift("2025-03-04 17:00:00", Some("2025-03-04 09:00:00"));
        let err = shift.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid shift 'shift_001': end time before start time"
        );
    }

    #[test]
    fn test_validate_rejects_negative_break() {
        let mut shift = create_test_shift("2025-03-04 09:00:00", Some("2025-03-04 17:00:00"));
        shift.break_minutes = -5;
        assert!(shift.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_break_outside_shift() {
        let mut shift = create_test_shift("2025-03-04 09:00:00", Some("2025-03-04 17:00:00"));
        shift.breaks = vec![BreakPeriod {
            shift_ref: "shift_001".to_string(),
            start_time: make_datetime("2025-03-04 16:45:00"),
            end_time: make_datetime("2025-03-04 17:15:00"),
        }];
        let err = shift.validate().unwrap_err();
        assert!(err.to_string().contains("outside the shift"));
    }

    #[test]
    fn test_validate_rejects_overlapping_breaks() {
        let mut shift = create_test_shift("2025-03-04 09:00:00", Some("2025-03-04 17:00:00"));
        shift.breaks = vec![
            BreakPeriod {
                shift_ref: "shift_001".to_string(),
                start_time: make_datetime("2025-03-04 12:00:00"),
                end_time: make_datetime("2025-03-04 12:30:00"),
            },
            BreakPeriod {
                shift_ref: "shift_001".to_string(),
                start_time: make_datetime("2025-03-04 12:15:00"),
                end_time: make_datetime("2025-03-04 12:45:00"),
            },
        ];
        assert!(shift.validate().unwrap_err().to_string().contains("overlap"));
    }

    #[test]
    fn test_deserialize_shift_with_defaults() {
        let json = r#"{
            "id": "shift_002",
            "owner_id": "emp_001",
            "start_time": "2025-03-04T09:00:00",
            "end_time": "2025-03-04T17:00:00",
            "award_ref": "retail"
        }"#;
        let shift: Shift = serde_json::from_str(json).unwrap();
        assert_eq!(shift.break_minutes, 0);
        assert!(shift.breaks.is_empty());
        assert_eq!(shift.period_ref, None);
    }
}
