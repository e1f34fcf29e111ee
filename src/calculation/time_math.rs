//! Interval arithmetic for shifts.
//!
//! Duration after break deduction, time-of-day window membership with
//! overnight wrap, holiday lookup, and the single rounding rule used for
//! every money and hour figure.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};
use crate::models::{PublicHoliday, ShiftDuration};

/// Rounds half away from zero to two places.
///
/// This is the only rounding rule in the engine. It is applied to every
/// segment amount before summation, so itemized totals always add up.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("10.005").unwrap()), Decimal::from_str("10.01").unwrap());
/// assert_eq!(round_money(Decimal::from_str("10.004").unwrap()), Decimal::from_str("10.00").unwrap());
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts whole minutes to hours rounded to two places.
pub fn minutes_to_hours(minutes: i64) -> Decimal {
    round_money(Decimal::from(minutes) / Decimal::from(60))
}

/// Converts decimal hours to whole minutes, rounding half-up.
pub fn hours_to_minutes(hours: Decimal) -> i64 {
    let minutes = (hours * Decimal::from(60))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    i64::try_from(minutes).unwrap_or(i64::MAX)
}

/// Drops seconds and sub-seconds so every instant sits on a whole minute.
pub fn truncate_to_minute(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        - Duration::seconds(i64::from(instant.second()))
        - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

/// Computes span, break, and working time for a closed interval.
///
/// A break longer than the span clamps working time to zero but is still
/// reported at its full nominal length.
///
/// # Errors
///
/// Returns [`EngineError::InvalidShift`] if `end` precedes `start` or the
/// break is negative.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_duration;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let start = NaiveDateTime::parse_from_str("2025-03-04 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2025-03-04 17:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let duration = calculate_duration("shift_001", start, end, 30).unwrap();
///
/// assert_eq!(duration.working_minutes, 480);
/// assert_eq!(duration.working_hours, Decimal::from(8));
/// ```
pub fn calculate_duration(
    shift_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    break_minutes: i64,
) -> EngineResult<ShiftDuration> {
    if end < start {
        return Err(EngineError::InvalidShift {
            shift_id: shift_id.to_string(),
            message: "end time before start time".to_string(),
        });
    }
    if break_minutes < 0 {
        return Err(EngineError::InvalidShift {
            shift_id: shift_id.to_string(),
            message: format!("break minutes cannot be negative: {}", break_minutes),
        });
    }

    let total_minutes = (end - start).num_minutes();
    let working_minutes = (total_minutes - break_minutes).max(0);

    Ok(ShiftDuration {
        total_minutes,
        break_minutes,
        working_minutes,
        working_hours: minutes_to_hours(working_minutes),
    })
}

/// Checks whether an instant's time of day falls inside a window.
///
/// The window is half-open: `[start, end)`. When `end <= start` the window
/// runs past midnight, so `22:00-06:00` contains 23:30 and 05:59. A window
/// with `end == start` covers the whole day.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::in_window;
/// use chrono::{NaiveDateTime, NaiveTime};
///
/// let late = NaiveDateTime::parse_from_str("2025-03-04 23:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let start = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
/// let end = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
/// assert!(in_window(late, start, end));
/// ```
pub fn in_window(instant: NaiveDateTime, start: NaiveTime, end: NaiveTime) -> bool {
    let t = instant.time();
    if end > start {
        t >= start && t < end
    } else {
        t >= start || t < end
    }
}

/// Exact calendar-date match against a holiday set.
pub fn is_holiday(date: NaiveDate, holidays: &[PublicHoliday]) -> bool {
    holidays.iter().any(|h| h.date == date)
}

/// Returns the holiday on the date, if any.
pub fn find_holiday(date: NaiveDate, holidays: &[PublicHoliday]) -> Option<&PublicHoliday> {
    holidays.iter().find(|h| h.date == date)
}
