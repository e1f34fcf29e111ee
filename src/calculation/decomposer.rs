//! Shift decomposition.
//!
//! Partitions one shift's worked time into regular, penalty, holiday, and
//! overtime segments. Every rule is evaluated against the shift's start date,
//! so a shift never switches day-level rules part way through.
//!
//! ## Precedence
//!
//! 1. A public holiday with an active holiday rule claims the whole shift and
//!    suppresses overtime.
//! 2. Otherwise a matching day-of-week-only rule claims the whole shift.
//! 3. Otherwise each time-window rule claims the minutes inside its window;
//!    where windows overlap the higher multiplier wins.
//! 4. Anything left is regular time.
//!
//! Overtime is a second pass over working minutes in order: minutes past the
//! daily threshold are reclassified as overtime whatever they were before.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{Award, AuditStep, OvertimeRule, PenaltyRule, SegmentKind, Shift};

use super::time_math::{find_holiday, hours_to_minutes, in_window};

/// Overtime hours paid at the tier-1 multiplier before tier 2 applies.
pub const OVERTIME_TIER_1_HOURS: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Label of regular segments.
pub const REGULAR_LABEL: &str = "regular";
/// Label of tier-1 overtime segments.
pub const OVERTIME_TIER_1_LABEL: &str = "overtime_tier_1";
/// Label of tier-2 overtime segments.
pub const OVERTIME_TIER_2_LABEL: &str = "overtime_tier_2";

/// Worked minutes sharing one classification, before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSegment {
    /// Classification.
    pub kind: SegmentKind,
    /// Rule ID or tier name.
    pub label: String,
    /// Multiplier applied to the loaded base rate.
    pub multiplier: Decimal,
    /// Worked minutes.
    pub minutes: i64,
}

/// The output of [`decompose_shift`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    /// Segments in order of first appearance.
    pub segments: Vec<TimeSegment>,
    /// Sum of segment minutes.
    pub working_minutes: i64,
    /// Decision trail.
    pub audit_steps: Vec<AuditStep>,
}

#[derive(Debug, Clone, Copy)]
struct Slot<'a> {
    instant: NaiveDateTime,
    kind: SegmentKind,
    label: &'a str,
    multiplier: Decimal,
}

impl Slot<'_> {
    fn assign<'b>(self, kind: SegmentKind, label: &'b str, multiplier: Decimal) -> Slot<'b> {
        Slot {
            instant: self.instant,
            kind,
            label,
            multiplier,
        }
    }
}

/// Decomposes a shift into a non-overlapping partition of its worked minutes.
///
/// `effective_end` is the end time to decompose up to; it differs from the
/// shift's own end only when a minimum shift length has extended it.
///
/// # Errors
///
/// Returns an input error if the shift or award is malformed, or if
/// `effective_end` precedes the start.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::decompose_shift;
/// use payroll_engine::models::{Award, SegmentKind, Shift};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use rust_decimal::Decimal;
///
/// let award = Award::new("retail", Decimal::from(25), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
/// let start = NaiveDateTime::parse_from_str("2025-03-04 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2025-03-04 18:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let shift = Shift {
///     id: "shift_001".to_string(),
///     owner_id: "emp_001".to_string(),
///     start_time: start,
///     end_time: Some(end),
///     break_minutes: 0,
///     breaks: vec![],
///     award_ref: "retail".to_string(),
///     period_ref: None,
/// };
///
/// let result = decompose_shift(&shift, end, &award, 1).unwrap();
/// assert_eq!(result.segments.len(), 2);
/// assert_eq!(result.segments[0].kind, SegmentKind::Regular);
/// assert_eq!(result.segments[0].minutes, 480);
/// assert_eq!(result.segments[1].kind, SegmentKind::OvertimeTier1);
/// assert_eq!(result.segments[1].minutes, 60);
/// ```
pub fn decompose_shift(
    shift: &Shift,
    effective_end: NaiveDateTime,
    award: &Award,
    step_number_start: u32,
) -> EngineResult<Decomposition> {
    shift.validate()?;
    award.validate()?;
    if effective_end < shift.start_time {
        return Err(EngineError::InvalidShift {
            shift_id: shift.id.clone(),
            message: "end time before start time".to_string(),
        });
    }

    let date = shift.date();
    let holiday = find_holiday(date, &award.public_holidays);
    let is_holiday = holiday.is_some();
    let mut audit_steps = Vec::new();
    let mut step_number = step_number_start;

    let span = (effective_end - shift.start_time).num_minutes();
    let mut slots: Vec<Slot> = (0..span)
        .map(|m| shift.start_time + Duration::minutes(m))
        .filter(|instant| {
            !shift
                .breaks
                .iter()
                .any(|b| *instant >= b.start_time && *instant < b.end_time)
        })
        .map(|instant| Slot {
            instant,
            kind: SegmentKind::Regular,
            label: REGULAR_LABEL,
            multiplier: Decimal::ONE,
        })
        .collect();

    let holiday_rule = holiday.and_then(|_| {
        highest_penalty(
            award
                .active_penalty_rules()
                .filter(|r| r.conditions.is_holiday_rule() && r.conditions.matches_date(date, true)),
        )
    });
    let day_rule = highest_penalty(
        award
            .active_penalty_rules()
            .filter(|r| r.conditions.is_day_only() && r.conditions.matches_date(date, is_holiday)),
    );

    let holiday_precedence = match (holiday, holiday_rule) {
        (Some(h), Some(rule)) => {
            for slot in slots.iter_mut() {
                *slot = slot.assign(SegmentKind::Holiday, &rule.id, rule.multiplier);
            }
            audit_steps.push(AuditStep {
                step_number,
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                input: serde_json::json!({
                    "date": date.to_string(),
                    "holiday": h.name,
                }),
                output: serde_json::json!({
                    "multiplier": rule.multiplier.normalize().to_string(),
                    "minutes": slots.len(),
                    "overtime_suppressed": true,
                }),
                reasoning: format!(
                    "{} is a public holiday ({}): whole shift paid at {}x, overtime suppressed",
                    date,
                    h.name,
                    rule.multiplier.normalize()
                ),
            });
            step_number += 1;
            true
        }
        _ => {
            if let Some(rule) = day_rule {
                for slot in slots.iter_mut() {
                    *slot = slot.assign(SegmentKind::Penalty, &rule.id, rule.multiplier);
                }
                audit_steps.push(AuditStep {
                    step_number,
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    input: serde_json::json!({
                        "date": date.to_string(),
                        "weekday": shift.day_of_week().to_string(),
                    }),
                    output: serde_json::json!({
                        "multiplier": rule.multiplier.normalize().to_string(),
                        "minutes": slots.len(),
                    }),
                    reasoning: format!(
                        "{} falls on {}: whole shift paid at {}x",
                        date,
                        shift.day_of_week(),
                        rule.multiplier.normalize()
                    ),
                });
                step_number += 1;
            } else {
                let window_rules: Vec<&PenaltyRule> = award
                    .active_penalty_rules()
                    .filter(|r| {
                        r.conditions.window().is_some()
                            && !r.conditions.is_holiday_rule()
                            && r.conditions.matches_date(date, is_holiday)
                    })
                    .collect();
                for slot in slots.iter_mut() {
                    let matched = highest_penalty(window_rules.iter().copied().filter(|r| {
                        r.conditions
                            .window()
                            .is_some_and(|(start, end)| in_window(slot.instant, start, end))
                    }));
                    if let Some(rule) = matched {
                        *slot = slot.assign(SegmentKind::Penalty, &rule.id, rule.multiplier);
                    }
                }
                for rule in &window_rules {
                    let minutes = slots.iter().filter(|s| s.label == rule.id).count();
                    if minutes == 0 {
                        continue;
                    }
                    audit_steps.push(AuditStep {
                        step_number,
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        input: serde_json::json!({
                            "window_start": rule.conditions.start_time.map(|t| t.to_string()),
                            "window_end": rule.conditions.end_time.map(|t| t.to_string()),
                        }),
                        output: serde_json::json!({
                            "multiplier": rule.multiplier.normalize().to_string(),
                            "minutes": minutes,
                        }),
                        reasoning: format!(
                            "{} minutes fall inside the {} window at {}x",
                            minutes,
                            rule.name,
                            rule.multiplier.normalize()
                        ),
                    });
                    step_number += 1;
                }
            }
            false
        }
    };

    if shift.breaks.is_empty() && shift.break_minutes > 0 {
        let mut remaining = shift.break_minutes;
        let from_regular = deduct_latest(&mut slots, &mut remaining, |s| {
            s.kind == SegmentKind::Regular
        });
        let from_penalty = deduct_latest(&mut slots, &mut remaining, |s| s.kind.is_penalty());
        audit_steps.push(AuditStep {
            step_number,
            rule_id: "break_deduction".to_string(),
            rule_name: "Unpaid Break Deduction".to_string(),
            input: serde_json::json!({ "break_minutes": shift.break_minutes }),
            output: serde_json::json!({
                "from_regular": from_regular,
                "from_penalty": from_penalty,
                "unabsorbed": remaining,
            }),
            reasoning: format!(
                "{} break minutes deducted: {} from regular time, {} from penalty time",
                shift.break_minutes, from_regular, from_penalty
            ),
        });
        step_number += 1;
    }

    if !holiday_precedence {
        let threshold = usize::try_from(hours_to_minutes(award.daily_overtime_threshold_hours))
            .unwrap_or(0);
        let tier1_minutes = usize::try_from(hours_to_minutes(OVERTIME_TIER_1_HOURS)).unwrap_or(0);
        let overtime_rules: Vec<&OvertimeRule> = award
            .active_overtime_rules()
            .filter(|r| r.conditions.matches_date(date, is_holiday))
            .collect();

        let mut overtime_minutes = 0usize;
        for (index, slot) in slots.iter_mut().enumerate().skip(threshold) {
            let rule = overtime_rules
                .iter()
                .copied()
                .filter(|r| {
                    r.conditions
                        .window()
                        .is_none_or(|(start, end)| in_window(slot.instant, start, end))
                })
                .reduce(|best, r| if r.multiplier > best.multiplier { r } else { best });

            *slot = match rule {
                Some(rule) => slot.assign(SegmentKind::OvertimeRule, &rule.id, rule.multiplier),
                None if index - threshold < tier1_minutes => slot.assign(
                    SegmentKind::OvertimeTier1,
                    OVERTIME_TIER_1_LABEL,
                    award.overtime_tier1_multiplier,
                ),
                None => slot.assign(
                    SegmentKind::OvertimeTier2,
                    OVERTIME_TIER_2_LABEL,
                    award.overtime_tier2_multiplier,
                ),
            };
            overtime_minutes += 1;
        }

        if overtime_minutes > 0 {
            audit_steps.push(AuditStep {
                step_number,
                rule_id: "daily_overtime".to_string(),
                rule_name: "Daily Overtime Reclassification".to_string(),
                input: serde_json::json!({
                    "working_minutes": slots.len(),
                    "threshold_hours": award.daily_overtime_threshold_hours.normalize().to_string(),
                }),
                output: serde_json::json!({ "overtime_minutes": overtime_minutes }),
                reasoning: format!(
                    "{} working minutes exceed the {} hour threshold by {} minutes",
                    slots.len(),
                    award.daily_overtime_threshold_hours.normalize(),
                    overtime_minutes
                ),
            });
        }
    }

    let segments = group_slots(&slots);
    let working_minutes = segments.iter().map(|s| s.minutes).sum();

    Ok(Decomposition {
        segments,
        working_minutes,
        audit_steps,
    })
}

/// First-declared rule wins ties.
fn highest_penalty<'a>(rules: impl Iterator<Item = &'a PenaltyRule>) -> Option<&'a PenaltyRule> {
    rules.reduce(|best, r| if r.multiplier > best.multiplier { r } else { best })
}

/// Removes up to `remaining` matching slots, latest first.
fn deduct_latest(slots: &mut Vec<Slot>, remaining: &mut i64, matches: impl Fn(&Slot) -> bool) -> i64 {
    let mut keep = vec![true; slots.len()];
    let mut removed = 0;
    for (index, slot) in slots.iter().enumerate().rev() {
        if *remaining == 0 {
            break;
        }
        if matches(slot) {
            keep[index] = false;
            *remaining -= 1;
            removed += 1;
        }
    }

    let mut index = 0;
    slots.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });
    removed
}

fn group_slots(slots: &[Slot]) -> Vec<TimeSegment> {
    let mut segments: Vec<TimeSegment> = Vec::new();
    for slot in slots {
        let existing = segments.iter_mut().find(|s| {
            s.kind == slot.kind && s.label == slot.label && s.multiplier == slot.multiplier
        });
        match existing {
            Some(segment) => segment.minutes += 1,
            None => segments.push(TimeSegment {
                kind: slot.kind,
                label: slot.label.to_string(),
                multiplier: slot.multiplier,
                minutes: 1,
            }),
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BreakPeriod, PublicHoliday, RuleConditions};
    use chrono::{NaiveDate, NaiveTime};
    use std::str::FromStr;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn award() -> Award {
        Award::new(
            "retail",
            dec("25.00"),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        )
    }

    fn shift(start: &str, end: &str) -> Shift {
        Shift {
            id: "shift_001".to_string(),
            owner_id: "emp_001".to_string(),
            start_time: dt(start),
            end_time: Some(dt(end)),
            break_minutes: 0,
            breaks: vec![],
            award_ref: "retail".to_string(),
            period_ref: None,
        }
    }

    fn penalty(id: &str, multiplier: &str, conditions: RuleConditions) -> PenaltyRule {
        PenaltyRule {
            id: id.to_string(),
            name: id.to_string(),
            multiplier: dec(multiplier),
            conditions,
            is_active: true,
        }
    }

    fn window(start: u32, end: u32) -> RuleConditions {
        RuleConditions {
            start_time: Some(t(start)),
            end_time: Some(t(end)),
            ..Default::default()
        }
    }

    fn decompose(shift: &Shift, award: &Award) -> Decomposition {
        decompose_shift(shift, shift.end_time.unwrap(), award, 1).unwrap()
    }

    fn minutes_of(result: &Decomposition, kind: SegmentKind) -> i64 {
        result
            .segments
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.minutes)
            .sum()
    }

    #[test]
    fn test_weekday_within_threshold_is_all_regular() {
        // 2025-03-04 is a Tuesday
        let result = decompose(&shift("2025-03-04 09:00:00", "2025-03-04 17:00:00"), &award());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].label, REGULAR_LABEL);
        assert_eq!(result.working_minutes, 480);
    }

    #[test]
    fn test_overtime_tiers_split_after_two_hours() {
        let result = decompose(&shift("2025-03-04 07:00:00", "2025-03-04 19:00:00"), &award());
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 480);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier1), 120);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier2), 120);
        let tier2 = result
            .segments
            .iter()
            .find(|s| s.kind == SegmentKind::OvertimeTier2)
            .unwrap();
        assert_eq!(tier2.multiplier, dec("2"));
    }

    #[test]
    fn test_holiday_claims_whole_shift_and_suppresses_overtime() {
        let mut award = award();
        award.public_holidays.push(PublicHoliday {
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            name: "Test Holiday".to_string(),
            region: "national".to_string(),
        });
        award.penalty_rules.push(penalty(
            "public_holiday",
            "2.5",
            RuleConditions {
                public_holiday: Some(true),
                ..Default::default()
            },
        ));
        award.penalty_rules.push(penalty("evening", "1.25", window(17, 23)));

        let result = decompose(&shift("2025-03-04 09:00:00", "2025-03-04 20:00:00"), &award);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].kind, SegmentKind::Holiday);
        assert_eq!(result.segments[0].minutes, 660);
        assert_eq!(result.segments[0].multiplier, dec("2.5"));
    }

    #[test]
    fn test_holiday_without_holiday_rule_falls_through() {
        let mut award = award();
        award.public_holidays.push(PublicHoliday {
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            name: "Test Holiday".to_string(),
            region: "national".to_string(),
        });
        let result = decompose(&shift("2025-03-04 09:00:00", "2025-03-04 18:00:00"), &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 480);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier1), 60);
    }

    #[test]
    fn test_day_of_week_rule_claims_whole_shift() {
        let mut award = award();
        // Saturday = 6
        award.penalty_rules.push(penalty(
            "saturday",
            "1.5",
            RuleConditions {
                day_of_week: Some(6),
                ..Default::default()
            },
        ));
        award.penalty_rules.push(penalty("evening", "1.25", window(17, 23)));

        // 2025-03-08 is a Saturday; shift runs into the evening window
        let result = decompose(&shift("2025-03-08 12:00:00", "2025-03-08 19:00:00"), &award);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].label, "saturday");
        assert_eq!(result.segments[0].minutes, 420);
    }

    #[test]
    fn test_overnight_shift_keeps_start_date_rules() {
        let mut award = award();
        award.penalty_rules.push(penalty(
            "saturday",
            "1.5",
            RuleConditions {
                day_of_week: Some(6),
                ..Default::default()
            },
        ));
        // Friday night into Saturday morning: no Saturday rate
        let result = decompose(&shift("2025-03-07 22:00:00", "2025-03-08 04:00:00"), &award);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].kind, SegmentKind::Regular);
    }

    #[test]
    fn test_overnight_window_contributes_overlap() {
        let mut award = award();
        award.penalty_rules.push(penalty("night", "1.3", window(22, 6)));
        let result = decompose(&shift("2025-03-04 20:00:00", "2025-03-05 04:00:00"), &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 120);
        assert_eq!(minutes_of(&result, SegmentKind::Penalty), 360);
        assert_eq!(result.working_minutes, 480);
    }

    #[test]
    fn test_disjoint_windows_each_contribute() {
        let mut award = award();
        award.penalty_rules.push(penalty("early", "1.1", window(5, 7)));
        award.penalty_rules.push(penalty("evening", "1.25", window(18, 23)));
        award.daily_overtime_threshold_hours = dec("24");

        let result = decompose(&shift("2025-03-04 06:00:00", "2025-03-04 19:00:00"), &award);
        let labels: Vec<&str> = result.segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["early", "regular", "evening"]);
        assert_eq!(result.segments[0].minutes, 60);
        assert_eq!(result.segments[1].minutes, 660);
        assert_eq!(result.segments[2].minutes, 60);
    }

    #[test]
    fn test_overlapping_windows_highest_multiplier_wins() {
        let mut award = award();
        award.penalty_rules.push(penalty("evening", "1.25", window(18, 23)));
        award.penalty_rules.push(penalty("late", "1.5", window(21, 23)));
        let result = decompose(&shift("2025-03-04 18:00:00", "2025-03-04 23:00:00"), &award);
        assert_eq!(result.segments[0].label, "evening");
        assert_eq!(result.segments[0].minutes, 180);
        assert_eq!(result.segments[1].label, "late");
        assert_eq!(result.segments[1].minutes, 120);
    }

    #[test]
    fn test_overtime_takes_priority_over_window_penalty() {
        let mut award = award();
        award.penalty_rules.push(penalty("evening", "1.25", window(17, 23)));
        let result = decompose(&shift("2025-03-04 09:00:00", "2025-03-04 19:00:00"), &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 480);
        assert_eq!(minutes_of(&result, SegmentKind::Penalty), 0);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier1), 120);
    }

    #[test]
    fn test_overtime_rule_replaces_tier_multiplier() {
        let mut award = award();
        award.overtime_rules.push(OvertimeRule {
            id: "weekend_overtime".to_string(),
            name: "Weekend Overtime".to_string(),
            multiplier: dec("2"),
            conditions: RuleConditions {
                day_of_week: Some(0),
                ..Default::default()
            },
            is_active: true,
        });
        // 2025-03-09 is a Sunday
        let result = decompose(&shift("2025-03-09 08:00:00", "2025-03-09 18:00:00"), &award);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeRule), 120);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier1), 0);
    }

    #[test]
    fn test_inactive_rules_ignored() {
        let mut award = award();
        let mut rule = penalty("evening", "1.25", window(17, 23));
        rule.is_active = false;
        award.penalty_rules.push(rule);
        let result = decompose(&shift("2025-03-04 17:00:00", "2025-03-04 21:00:00"), &award);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].kind, SegmentKind::Regular);
    }

    #[test]
    fn test_nominal_break_deducted_from_regular_first() {
        let mut award = award();
        award.penalty_rules.push(penalty("evening", "1.25", window(18, 23)));
        let mut s = shift("2025-03-04 12:00:00", "2025-03-04 19:00:00");
        s.break_minutes = 30;
        let result = decompose(&s, &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 330);
        assert_eq!(minutes_of(&result, SegmentKind::Penalty), 60);
        assert_eq!(result.working_minutes, 390);
    }

    #[test]
    fn test_nominal_break_spills_into_penalty_time() {
        let mut award = award();
        award.penalty_rules.push(penalty("evening", "1.25", window(18, 23)));
        let mut s = shift("2025-03-04 17:30:00", "2025-03-04 20:00:00");
        s.break_minutes = 45;
        let result = decompose(&s, &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 0);
        assert_eq!(minutes_of(&result, SegmentKind::Penalty), 105);
    }

    #[test]
    fn test_break_longer_than_shift_leaves_no_segments() {
        let mut s = shift("2025-03-04 09:00:00", "2025-03-04 09:30:00");
        s.break_minutes = 60;
        let result = decompose(&s, &award());
        assert!(result.segments.is_empty());
        assert_eq!(result.working_minutes, 0);
    }

    #[test]
    fn test_positioned_break_removed_from_its_window() {
        let mut award = award();
        award.penalty_rules.push(penalty("evening", "1.25", window(18, 23)));
        let mut s = shift("2025-03-04 14:00:00", "2025-03-04 22:00:00");
        s.breaks = vec![BreakPeriod {
            shift_ref: "shift_001".to_string(),
            start_time: dt("2025-03-04 19:00:00"),
            end_time: dt("2025-03-04 19:30:00"),
        }];
        let result = decompose(&s, &award);
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 240);
        assert_eq!(minutes_of(&result, SegmentKind::Penalty), 210);
        assert_eq!(result.working_minutes, 450);
    }

    #[test]
    fn test_break_shifts_overtime_boundary() {
        let mut s = shift("2025-03-04 09:00:00", "2025-03-04 18:00:00");
        s.break_minutes = 60;
        let result = decompose(&s, &award());
        assert_eq!(minutes_of(&result, SegmentKind::Regular), 480);
        assert_eq!(minutes_of(&result, SegmentKind::OvertimeTier1), 0);
    }

    #[test]
    fn test_effective_end_extends_decomposition() {
        let s = shift("2025-03-04 09:00:00", "2025-03-04 10:00:00");
        let result = decompose_shift(&s, dt("2025-03-04 12:00:00"), &award(), 1).unwrap();
        assert_eq!(result.working_minutes, 180);
    }

    #[test]
    fn test_invalid_award_rejected_before_decomposition() {
        let mut award = award();
        award.overtime_tier1_multiplier = dec("-1.5");
        let s = shift("2025-03-04 09:00:00", "2025-03-04 17:00:00");
        assert!(matches!(
            decompose_shift(&s, s.end_time.unwrap(), &award, 1),
            Err(EngineError::InvalidAward { .. })
        ));
    }

    #[test]
    fn test_audit_trail_records_overtime() {
        let result = decompose(&shift("2025-03-04 09:00:00", "2025-03-04 18:00:00"), &award());
        let step = result
            .audit_steps
            .iter()
            .find(|s| s.rule_id == "daily_overtime")
            .unwrap();
        assert_eq!(step.output["overtime_minutes"], 60);
        assert_eq!(step.step_number, 1);
    }
}
