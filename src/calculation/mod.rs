//! Calculation logic for the payroll engine.
//!
//! This module turns shifts into money and money into withholding:
//! time arithmetic, decomposition of a shift's worked minutes into regular,
//! penalty, holiday and overtime segments, pricing of those segments at the
//! award's rates, and per-period tax withholding against a rate-table
//! snapshot. Every function here is pure.

mod decomposer;
mod rate_resolver;
mod tax_calculator;
mod time_math;

pub use decomposer::{
    Decomposition, OVERTIME_TIER_1_HOURS, OVERTIME_TIER_1_LABEL, OVERTIME_TIER_2_LABEL,
    REGULAR_LABEL, TimeSegment, decompose_shift,
};
pub use rate_resolver::{
    apply_minimum_shift, calculate_shift, loaded_rate, price_segments, resolve_pay, total_pay,
};
pub use tax_calculator::calculate_period_tax;
pub use time_math::{
    calculate_duration, find_holiday, hours_to_minutes, in_window, is_holiday, minutes_to_hours,
    round_money, truncate_to_minute,
};
