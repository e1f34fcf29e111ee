//! Rate resolution: turns decomposed segments into money.
//!
//! Casual loading is additive to the base rate before any multiplier, so a
//! segment's hourly rate is `multiplier × base_rate × (1 + casual_loading)`.
//! Each segment amount is rounded to the cent before the totals are summed.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineResult;
use crate::models::{
    AuditStep, Award, EngineWarning, PaySegment, PayTotals, SegmentKind, Shift, ShiftBreakdown,
    ShiftDuration,
};

use super::decomposer::{TimeSegment, decompose_shift};
use super::time_math::{
    calculate_duration, hours_to_minutes, minutes_to_hours, round_money, truncate_to_minute,
};

/// Returns the hourly rate after casual loading.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::loaded_rate;
/// use payroll_engine::models::Award;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut award = Award::new("retail", Decimal::from(28), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
/// award.casual_loading_rate = Decimal::new(25, 2);
/// assert_eq!(loaded_rate(&award), Decimal::from(35));
/// ```
pub fn loaded_rate(award: &Award) -> Decimal {
    award.base_rate * (Decimal::ONE + award.casual_loading_rate)
}

/// Prices each segment at the award's loaded rate.
pub fn price_segments(award: &Award, segments: &[TimeSegment]) -> Vec<PaySegment> {
    let loaded = loaded_rate(award);
    segments
        .iter()
        .map(|segment| {
            let rate = loaded * segment.multiplier;
            let amount = round_money(Decimal::from(segment.minutes) * rate / Decimal::from(60));
            PaySegment {
                kind: segment.kind,
                label: segment.label.clone(),
                multiplier: segment.multiplier,
                minutes: segment.minutes,
                hours: minutes_to_hours(segment.minutes),
                rate,
                amount,
            }
        })
        .collect()
}

/// Sums priced segments into base, overtime, and penalty pay.
///
/// `total_gross_pay` is the sum of the already-rounded segment amounts, so it
/// always equals the itemized breakdown to the cent.
pub fn total_pay(segments: &[PaySegment]) -> PayTotals {
    let mut totals = PayTotals::default();
    for segment in segments {
        match segment.kind {
            SegmentKind::Regular => totals.base_pay += segment.amount,
            kind if kind.is_overtime() => totals.overtime_pay += segment.amount,
            _ => totals.penalty_pay += segment.amount,
        }
    }
    totals.total_gross_pay = totals.base_pay + totals.overtime_pay + totals.penalty_pay;
    totals
}

/// Converts decomposed segments into money: `(Award, segments) → totals`.
pub fn resolve_pay(award: &Award, segments: &[TimeSegment]) -> (Vec<PaySegment>, PayTotals) {
    let priced = price_segments(award, segments);
    let totals = total_pay(&priced);
    (priced, totals)
}

/// Extends the end time so the paid duration meets the award's minimum.
///
/// Returns the effective end and whether it was extended. Shifts with no
/// working time are left alone.
pub fn apply_minimum_shift(
    end: NaiveDateTime,
    duration: &ShiftDuration,
    award: &Award,
) -> (NaiveDateTime, bool) {
    let Some(minimum) = award.minimum_shift_hours else {
        return (end, false);
    };
    let minimum_minutes = hours_to_minutes(minimum);
    if duration.working_minutes == 0 || duration.working_minutes >= minimum_minutes {
        return (end, false);
    }
    let deficit = minimum_minutes - duration.working_minutes;
    (end + Duration::minutes(deficit), true)
}

/// Calculates the full itemized gross pay for one closed shift.
///
/// Validates the inputs, applies the minimum shift length, decomposes the
/// shift, and prices the segments. Instants are truncated to whole minutes.
///
/// # Errors
///
/// Returns an input error for an open shift, malformed times, or a
/// malformed award. Nothing is partially computed.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_shift;
/// use payroll_engine::models::{Award, Shift};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let award = Award::new("retail", Decimal::from(25), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
/// let shift = Shift {
///     id: "shift_001".to_string(),
///     owner_id: "emp_001".to_string(),
///     start_time: NaiveDateTime::parse_from_str("2025-03-04 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     end_time: Some(NaiveDateTime::parse_from_str("2025-03-04 18:00:00", "%Y-%m-%d %H:%M:%S").unwrap()),
///     break_minutes: 0,
///     breaks: vec![],
///     award_ref: "retail".to_string(),
///     period_ref: None,
/// };
///
/// let breakdown = calculate_shift(&shift, &award).unwrap();
/// assert_eq!(breakdown.totals.base_pay, Decimal::from_str("200.00").unwrap());
/// assert_eq!(breakdown.totals.overtime_pay, Decimal::from_str("37.50").unwrap());
/// assert_eq!(breakdown.totals.total_gross_pay, Decimal::from_str("237.50").unwrap());
/// ```
pub fn calculate_shift(shift: &Shift, award: &Award) -> EngineResult<ShiftBreakdown> {
    shift.validate()?;
    award.validate()?;
    let end = shift.closed_end()?;

    let mut normalized = shift.clone();
    normalized.start_time = truncate_to_minute(shift.start_time);
    normalized.end_time = Some(truncate_to_minute(end));
    for brk in normalized.breaks.iter_mut() {
        brk.start_time = truncate_to_minute(brk.start_time);
        brk.end_time = truncate_to_minute(brk.end_time);
    }
    let end = truncate_to_minute(end);

    let duration = calculate_duration(
        &normalized.id,
        normalized.start_time,
        end,
        normalized.effective_break_minutes(),
    )?;
    let date = normalized.date();

    let mut warnings = Vec::new();
    if !award.is_active {
        warnings.push(EngineWarning::new(
            "AWARD_INACTIVE",
            format!("award '{}' is marked inactive", award.id),
            "medium",
        ));
    }
    if !award.is_effective_on(date) {
        warnings.push(EngineWarning::new(
            "OUTSIDE_AWARD_EFFECTIVE_RANGE",
            format!("award '{}' is not effective on {}", award.id, date),
            "medium",
        ));
    }
    if duration.break_minutes > duration.total_minutes {
        warnings.push(EngineWarning::new(
            "BREAK_EXCEEDS_SHIFT",
            format!(
                "break of {} minutes exceeds the {} minute shift; working time clamped to zero",
                duration.break_minutes, duration.total_minutes
            ),
            "low",
        ));
    }
    if let Some(maximum) = award.maximum_shift_hours {
        if duration.working_minutes > hours_to_minutes(maximum) {
            warnings.push(EngineWarning::new(
                "EXCEEDS_MAXIMUM_SHIFT",
                format!(
                    "{} working hours exceeds the {} hour maximum",
                    duration.working_hours,
                    maximum.normalize()
                ),
                "high",
            ));
        }
    }

    let (effective_end, minimum_shift_applied) = apply_minimum_shift(end, &duration, award);
    let mut audit_steps = Vec::new();
    if minimum_shift_applied {
        let extension = (effective_end - end).num_minutes();
        warnings.push(EngineWarning::new(
            "MINIMUM_SHIFT_APPLIED",
            format!("shift extended by {} minutes to the award minimum", extension),
            "low",
        ));
        audit_steps.push(AuditStep {
            step_number: 1,
            rule_id: "minimum_shift".to_string(),
            rule_name: "Minimum Shift Length".to_string(),
            input: serde_json::json!({
                "working_minutes": duration.working_minutes,
                "minimum_hours": award.minimum_shift_hours.map(|h| h.normalize().to_string()),
            }),
            output: serde_json::json!({
                "effective_end": effective_end.to_string(),
                "extension_minutes": extension,
            }),
            reasoning: format!(
                "{} working minutes is below the minimum; end extended from {} to {}",
                duration.working_minutes, end, effective_end
            ),
        });
    }

    let recorded_duration = duration;
    let duration = if minimum_shift_applied {
        calculate_duration(
            &normalized.id,
            normalized.start_time,
            effective_end,
            normalized.effective_break_minutes(),
        )?
    } else {
        recorded_duration
    };

    let next_step = audit_steps.len() as u32 + 1;
    let decomposition = decompose_shift(&normalized, effective_end, award, next_step)?;
    audit_steps.extend(decomposition.audit_steps);

    let (segments, totals) = resolve_pay(award, &decomposition.segments);

    debug!(
        shift_id = %shift.id,
        working_minutes = decomposition.working_minutes,
        gross = %totals.total_gross_pay,
        "Calculated shift"
    );

    Ok(ShiftBreakdown {
        shift_id: shift.id.clone(),
        date,
        duration,
        recorded_duration,
        effective_end,
        minimum_shift_applied,
        segments,
        totals,
        audit_steps,
        warnings,
    })
}
