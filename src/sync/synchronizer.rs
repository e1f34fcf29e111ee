//! Pay-period synchronization.
//!
//! A period's aggregates are always rebuilt from its shifts, never patched:
//! every shift is recalculated, the totals summed, tax withheld on the sum,
//! and the whole record written back in one update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, IsoWeek};
use tracing::{debug, info, warn};

use crate::calculation::{calculate_period_tax, calculate_shift, hours_to_minutes, minutes_to_hours};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Award, EngineWarning, FieldDrift, PayPeriod, PayPeriodResult, PayPeriodStatus, PayTotals,
    ShiftBreakdown, TaxYear, ValidationReport, YearToDateTax,
};
use crate::tax_store::TaxCoefficientStore;

use super::store::PayrollStore;

/// Recomputes pay periods from their shifts and keeps them persisted.
///
/// Calls are read, recompute, write. Two calls for the same period that
/// overlap can lose an update, so callers must run at most one at a time per
/// period; [`SyncQueue`](super::SyncQueue) does that.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::{Award, PayFrequency, PayPeriod, Shift};
/// use payroll_engine::sync::{InMemoryPayrollStore, PayPeriodSynchronizer};
/// use payroll_engine::tax_store::{InMemoryRateTableSource, TaxCoefficientStore};
/// use rust_decimal::Decimal;
///
/// let store = Arc::new(InMemoryPayrollStore::new());
/// let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
/// store.put_award(Award::new("retail", Decimal::from(25), start));
/// store.put_period(PayPeriod::new(
///     "p1",
///     "emp-1",
///     start,
///     NaiveDate::from_ymd_opt(2024, 7, 7).unwrap(),
///     PayFrequency::Weekly,
/// ));
/// store.put_shift(Shift {
///     id: "s1".to_string(),
///     owner_id: "emp-1".to_string(),
///     start_time: start.and_hms_opt(9, 0, 0).unwrap(),
///     end_time: Some(start.and_hms_opt(18, 0, 0).unwrap()),
///     break_minutes: 0,
///     breaks: vec![],
///     award_ref: "retail".to_string(),
///     period_ref: Some("p1".to_string()),
/// });
///
/// let source = InMemoryRateTableSource::with_tables(ConfigLoader::bundled_rate_tables()?);
/// let rates = Arc::new(TaxCoefficientStore::new(Arc::new(source))?);
/// let synchronizer = PayPeriodSynchronizer::new(store.clone(), rates);
///
/// let result = synchronizer.sync("p1", "2024-25")?;
/// assert_eq!(result.totals.total_gross_pay, Decimal::new(23750, 2));
/// assert!(!synchronizer.validate_totals("p1", "2024-25")?.has_drift());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub struct PayPeriodSynchronizer {
    store: Arc<dyn PayrollStore>,
    rates: Arc<TaxCoefficientStore>,
}

impl std::fmt::Debug for PayPeriodSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPeriodSynchronizer")
            .field("rates", &self.rates)
            .finish_non_exhaustive()
    }
}

impl PayPeriodSynchronizer {
    /// Creates a synchronizer over a payroll store and a rate-table store.
    pub fn new(store: Arc<dyn PayrollStore>, rates: Arc<TaxCoefficientStore>) -> Self {
        Self { store, rates }
    }

    /// The payroll store this synchronizer reads and writes.
    pub fn store(&self) -> &Arc<dyn PayrollStore> {
        &self.store
    }

    /// The rate-table store this synchronizer withholds against.
    pub fn rates(&self) -> &Arc<TaxCoefficientStore> {
        &self.rates
    }

    /// Recomputes a period from its shifts and persists it.
    ///
    /// The period moves to `Calculated`, and the owner's year-to-date figures
    /// for `tax_year` are rebuilt from every period of theirs ending inside
    /// the year. Running it twice with nothing changed in between gives the
    /// same result.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound`, `PeriodLocked` for a paid period, `InvalidInput` for a
    /// malformed fiscal year, any shift or award error, and store failures.
    pub fn sync(&self, period_id: &str, tax_year: &str) -> EngineResult<PayPeriodResult> {
        let year: TaxYear = tax_year.parse()?;
        let mut period = self.period(period_id)?;
        if period.is_locked() {
            return Err(EngineError::PeriodLocked {
                period_id: period_id.to_string(),
            });
        }

        info!(period_id = %period_id, tax_year = %tax_year, "Syncing pay period");
        let result = self.compute(&period, tax_year)?;

        period.total_hours = result.total_hours;
        period.base_pay = result.totals.base_pay;
        period.overtime_pay = result.totals.overtime_pay;
        period.penalty_pay = result.totals.penalty_pay;
        period.gross_pay = result.totals.total_gross_pay;
        period.payg_withholding = result.tax.payg_withholding;
        period.medicare_levy = result.tax.medicare_levy;
        period.loan_repayment = result.tax.study_loan_amount;
        period.total_withholdings = result.tax.total_withholdings;
        period.net_pay = result.tax.net_pay;
        period.status = PayPeriodStatus::Calculated;
        self.store.save_period(&period)?;

        self.refresh_year_to_date(&period.owner_id, year)?;

        info!(
            period_id = %period_id,
            shifts = result.shift_count,
            gross = %result.totals.total_gross_pay,
            net = %result.tax.net_pay,
            degraded = result.tax.degraded,
            "Pay period synced"
        );
        Ok(result)
    }

    /// Syncs the period a newly created shift belongs to.
    pub fn on_shift_created(
        &self,
        shift_id: &str,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self.affected_periods(shift_id, None, true)?;
        self.sync_all(&periods, tax_year)
    }

    /// Syncs the shift's current period and, if the shift moved, the period
    /// it left.
    pub fn on_shift_updated(
        &self,
        shift_id: &str,
        previous_period_id: Option<&str>,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self.affected_periods(shift_id, previous_period_id, true)?;
        self.sync_all(&periods, tax_year)
    }

    /// Syncs the period a deleted shift belonged to.
    pub fn on_shift_deleted(
        &self,
        shift_id: &str,
        previous_period_id: Option<&str>,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self.affected_periods(shift_id, previous_period_id, false)?;
        self.sync_all(&periods, tax_year)
    }

    /// Periods touched by a shift change: the one it left, then the one it is
    /// in now, without duplicates.
    ///
    /// With `must_exist`, a shift missing from the store is `ShiftNotFound`.
    pub fn affected_periods(
        &self,
        shift_id: &str,
        previous_period_id: Option<&str>,
        must_exist: bool,
    ) -> EngineResult<Vec<String>> {
        let shift = self.store.load_shift(shift_id)?;
        if shift.is_none() && must_exist {
            return Err(EngineError::ShiftNotFound {
                shift_id: shift_id.to_string(),
            });
        }

        let mut periods: Vec<String> = Vec::new();
        let current = shift.and_then(|s| s.period_ref);
        for id in previous_period_id.map(str::to_string).into_iter().chain(current) {
            if !periods.contains(&id) {
                periods.push(id);
            }
        }
        if periods.is_empty() {
            debug!(shift_id = %shift_id, "Shift change touches no pay period");
        }
        Ok(periods)
    }

    /// Recomputes a period without persisting and reports where the stored
    /// aggregates differ. Never corrects anything.
    pub fn validate_totals(&self, period_id: &str, tax_year: &str) -> EngineResult<ValidationReport> {
        tax_year.parse::<TaxYear>()?;
        let period = self.period(period_id)?;
        let expected = self.compute(&period, tax_year)?;

        let fields = [
            ("total_hours", period.total_hours, expected.total_hours),
            ("base_pay", period.base_pay, expected.totals.base_pay),
            ("overtime_pay", period.overtime_pay, expected.totals.overtime_pay),
            ("penalty_pay", period.penalty_pay, expected.totals.penalty_pay),
            ("gross_pay", period.gross_pay, expected.totals.total_gross_pay),
            ("payg_withholding", period.payg_withholding, expected.tax.payg_withholding),
            ("medicare_levy", period.medicare_levy, expected.tax.medicare_levy),
            ("loan_repayment", period.loan_repayment, expected.tax.study_loan_amount),
            ("total_withholdings", period.total_withholdings, expected.tax.total_withholdings),
            ("net_pay", period.net_pay, expected.tax.net_pay),
        ];
        let drift: Vec<FieldDrift> = fields
            .into_iter()
            .filter(|(_, stored, expected)| stored != expected)
            .map(|(field, stored, expected)| FieldDrift {
                field: field.to_string(),
                stored,
                expected,
                difference: stored - expected,
            })
            .collect();

        if !drift.is_empty() {
            let fields: Vec<&str> = drift.iter().map(|d| d.field.as_str()).collect();
            warn!(period_id = %period_id, fields = ?fields, "Stored pay period totals drifted");
        }

        Ok(ValidationReport {
            period_id: period_id.to_string(),
            drift,
        })
    }

    fn period(&self, period_id: &str) -> EngineResult<PayPeriod> {
        self.store
            .load_period(period_id)?
            .ok_or_else(|| EngineError::PeriodNotFound {
                period_id: period_id.to_string(),
            })
    }

    fn sync_all(&self, period_ids: &[String], tax_year: &str) -> EngineResult<Vec<PayPeriodResult>> {
        let mut results = Vec::with_capacity(period_ids.len());
        for period_id in period_ids {
            match self.sync(period_id, tax_year) {
                Ok(result) => results.push(result),
                Err(EngineError::PeriodLocked { period_id }) => {
                    warn!(period_id = %period_id, "Shift change touches a paid period; left as paid");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    /// Recalculates every closed shift and the period's tax.
    fn compute(&self, period: &PayPeriod, tax_year: &str) -> EngineResult<PayPeriodResult> {
        let shifts = self.store.load_shifts_for_period(&period.id)?;
        let mut awards: HashMap<String, Award> = HashMap::new();
        let mut breakdowns: Vec<(ShiftBreakdown, String)> = Vec::new();
        let mut skipped_open_shifts = Vec::new();
        let mut warnings = Vec::new();

        for shift in &shifts {
            if shift.is_open() {
                info!(period_id = %period.id, shift_id = %shift.id, "Skipping open shift");
                skipped_open_shifts.push(shift.id.clone());
                continue;
            }
            if !period.contains_date(shift.date()) {
                warnings.push(EngineWarning::new(
                    "SHIFT_OUTSIDE_PERIOD",
                    format!(
                        "shift '{}' on {} falls outside {} to {}",
                        shift.id, shift.date(), period.start_date, period.end_date
                    ),
                    "medium",
                ));
            }

            if !awards.contains_key(&shift.award_ref) {
                let award = self.store.load_award(&shift.award_ref)?.ok_or_else(|| {
                    EngineError::AwardNotFound {
                        award_id: shift.award_ref.clone(),
                    }
                })?;
                awards.insert(shift.award_ref.clone(), award);
            }
            let award = awards.get(&shift.award_ref).ok_or_else(|| EngineError::AwardNotFound {
                award_id: shift.award_ref.clone(),
            })?;
            breakdowns.push((calculate_shift(shift, award)?, shift.award_ref.clone()));
        }

        warnings.extend(weekly_threshold_warnings(&breakdowns, &awards));

        let mut totals = PayTotals::default();
        let mut paid_minutes = 0;
        for (breakdown, _) in &breakdowns {
            totals.base_pay += breakdown.totals.base_pay;
            totals.overtime_pay += breakdown.totals.overtime_pay;
            totals.penalty_pay += breakdown.totals.penalty_pay;
            totals.total_gross_pay += breakdown.totals.total_gross_pay;
            paid_minutes += breakdown.paid_minutes();
        }

        let profile = self.store.load_profile(&period.owner_id)?;
        let year_to_date = self.store.load_year_to_date(&period.owner_id, tax_year)?;
        let tables = self.rates.snapshot(tax_year);
        let tax = calculate_period_tax(
            totals.total_gross_pay,
            profile.as_ref(),
            period.pay_frequency,
            year_to_date.as_ref(),
            &tables,
        )?;
        if profile.is_none() {
            warn!(owner_id = %period.owner_id, "No withholding profile; conservative scale applied");
        }

        let variance = period.actual_pay.map(|actual| actual - tax.net_pay);

        Ok(PayPeriodResult {
            period_id: period.id.clone(),
            owner_id: period.owner_id.clone(),
            shift_count: breakdowns.len(),
            skipped_open_shifts,
            total_hours: minutes_to_hours(paid_minutes),
            totals,
            tax,
            shifts: breakdowns.into_iter().map(|(breakdown, _)| breakdown).collect(),
            variance,
            warnings,
        })
    }

    /// Rebuilds the owner's year-to-date record from their calculated periods
    /// ending inside the year.
    fn refresh_year_to_date(&self, owner_id: &str, year: TaxYear) -> EngineResult<()> {
        let tax_year = year.to_string();
        let mut ytd = YearToDateTax::empty(owner_id, &tax_year);
        for period in self.store.load_periods_for_owner(owner_id)? {
            if period.status != PayPeriodStatus::Open && year.contains(period.end_date) {
                ytd.gross_pay += period.gross_pay;
                ytd.total_withheld += period.total_withholdings;
            }
        }
        debug!(
            owner_id = %owner_id,
            tax_year = %tax_year,
            gross = %ytd.gross_pay,
            withheld = %ytd.total_withheld,
            "Year to date refreshed"
        );
        self.store.save_year_to_date(&ytd)
    }
}

/// Flags each award-week whose paid hours pass the award's weekly threshold.
fn weekly_threshold_warnings(
    breakdowns: &[(ShiftBreakdown, String)],
    awards: &HashMap<String, Award>,
) -> Vec<EngineWarning> {
    let mut weeks: Vec<((String, IsoWeek), i64)> = Vec::new();
    for (breakdown, award_ref) in breakdowns {
        let key = (award_ref.clone(), breakdown.date.iso_week());
        match weeks.iter_mut().find(|(k, _)| *k == key) {
            Some((_, minutes)) => *minutes += breakdown.paid_minutes(),
            None => weeks.push((key, breakdown.paid_minutes())),
        }
    }

    weeks
        .into_iter()
        .filter_map(|((award_ref, week), minutes)| {
            let award = awards.get(&award_ref)?;
            let threshold = award.weekly_overtime_threshold_hours;
            (minutes > hours_to_minutes(threshold)).then(|| {
                EngineWarning::new(
                    "WEEKLY_THRESHOLD_EXCEEDED",
                    format!(
                        "{} hours under '{}' in week {} of {} exceeds the {} hour weekly threshold",
                        minutes_to_hours(minutes),
                        award_ref,
                        week.week(),
                        week.year(),
                        threshold.normalize()
                    ),
                    "medium",
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::{PayFrequency, Shift, TaxScale, TaxWithholdingProfile};
    use crate::sync::InMemoryPayrollStore;
    use crate::tax_store::InMemoryRateTableSource;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn shift(id: &str, d: u32, start: u32, end: u32, period: &str) -> Shift {
        Shift {
            id: id.to_string(),
            owner_id: "emp-1".to_string(),
            start_time: day(d).and_hms_opt(start, 0, 0).unwrap(),
            end_time: Some(day(d).and_hms_opt(end, 0, 0).unwrap()),
            break_minutes: 0,
            breaks: vec![],
            award_ref: "retail".to_string(),
            period_ref: Some(period.to_string()),
        }
    }

    fn setup() -> (Arc<InMemoryPayrollStore>, PayPeriodSynchronizer) {
        let store = Arc::new(InMemoryPayrollStore::new());
        store.put_award(Award::new("retail", Decimal::from(25), day(1)));
        store.put_profile("emp-1", TaxWithholdingProfile::resident_with_threshold());
        store.put_period(PayPeriod::new("p1", "emp-1", day(1), day(7), PayFrequency::Weekly));
        store.put_period(PayPeriod::new("p2", "emp-1", day(8), day(14), PayFrequency::Weekly));

        let source = InMemoryRateTableSource::with_tables(ConfigLoader::bundled_rate_tables().unwrap());
        let rates = Arc::new(TaxCoefficientStore::new(Arc::new(source)).unwrap());
        let synchronizer = PayPeriodSynchronizer::new(store.clone(), rates);
        (store, synchronizer)
    }

    #[test]
    fn test_sync_sums_shifts_and_persists() {
        let (store, sync) = setup();
        // Monday 1 July 2024: 9h, 8 regular + 1 overtime = 237.50
        store.put_shift(shift("s1", 1, 9, 18, "p1"));
        // Tuesday: 8h regular = 200.00
        store.put_shift(shift("s2", 2, 9, 17, "p1"));

        let result = sync.sync("p1", "2024-25").unwrap();
        assert_eq!(result.shift_count, 2);
        assert_eq!(result.totals.base_pay, dec("400.00"));
        assert_eq!(result.totals.overtime_pay, dec("37.50"));
        assert_eq!(result.totals.total_gross_pay, dec("437.50"));
        assert_eq!(result.total_hours, dec("17"));
        assert_eq!(result.tax.scale, TaxScale::TaxFreeThreshold);

        let stored = store.load_period("p1").unwrap().unwrap();
        assert_eq!(stored.status, PayPeriodStatus::Calculated);
        assert_eq!(stored.gross_pay, dec("437.50"));
        assert_eq!(stored.net_pay, result.tax.net_pay);
        assert_eq!(store.period_writes(), 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 18, "p1"));
        let first = sync.sync("p1", "2024-25").unwrap();
        let second = sync.sync("p1", "2024-25").unwrap();
        assert_eq!(first, second);
        let ytd = store.load_year_to_date("emp-1", "2024-25").unwrap().unwrap();
        assert_eq!(ytd.gross_pay, dec("237.50"));
    }

    #[test]
    fn test_open_shifts_are_skipped() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 18, "p1"));
        let mut open = shift("s2", 2, 9, 17, "p1");
        open.end_time = None;
        store.put_shift(open);

        let result = sync.sync("p1", "2024-25").unwrap();
        assert_eq!(result.shift_count, 1);
        assert_eq!(result.skipped_open_shifts, vec!["s2".to_string()]);
    }

    #[test]
    fn test_paid_period_is_locked() {
        let (store, sync) = setup();
        let mut period = store.load_period("p1").unwrap().unwrap();
        period.status = PayPeriodStatus::Paid;
        store.put_period(period);
        assert!(matches!(
            sync.sync("p1", "2024-25"),
            Err(EngineError::PeriodLocked { .. })
        ));
        assert!(sync.validate_totals("p1", "2024-25").is_ok());
    }

    #[test]
    fn test_missing_period_and_award() {
        let (store, sync) = setup();
        assert!(matches!(
            sync.sync("nope", "2024-25"),
            Err(EngineError::PeriodNotFound { .. })
        ));

        let mut orphan = shift("s1", 1, 9, 17, "p1");
        orphan.award_ref = "missing".to_string();
        store.put_shift(orphan);
        assert!(matches!(
            sync.sync("p1", "2024-25"),
            Err(EngineError::AwardNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_tax_year_rejected() {
        let (_, sync) = setup();
        assert!(matches!(
            sync.sync("p1", "2024"),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_shift_moved_across_periods_syncs_both() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        sync.sync("p1", "2024-25").unwrap();

        let mut moved = shift("s1", 8, 9, 17, "p2");
        moved.id = "s1".to_string();
        store.put_shift(moved);
        let results = sync.on_shift_updated("s1", Some("p1"), "2024-25").unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.period_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(store.load_period("p1").unwrap().unwrap().gross_pay, Decimal::ZERO);
        assert_eq!(store.load_period("p2").unwrap().unwrap().gross_pay, dec("200.00"));
    }

    #[test]
    fn test_update_within_period_syncs_once() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        let results = sync.on_shift_updated("s1", Some("p1"), "2024-25").unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_deleted_shift_resyncs_previous_period() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        sync.on_shift_created("s1", "2024-25").unwrap();
        assert_eq!(store.load_period("p1").unwrap().unwrap().gross_pay, dec("200.00"));

        store.remove_shift("s1");
        sync.on_shift_deleted("s1", Some("p1"), "2024-25").unwrap();
        assert_eq!(store.load_period("p1").unwrap().unwrap().gross_pay, Decimal::ZERO);
    }

    #[test]
    fn test_created_shift_must_exist() {
        let (_, sync) = setup();
        assert!(matches!(
            sync.on_shift_created("ghost", "2024-25"),
            Err(EngineError::ShiftNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_totals_reports_drift_without_fixing() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        sync.sync("p1", "2024-25").unwrap();
        assert!(!sync.validate_totals("p1", "2024-25").unwrap().has_drift());

        store.put_shift(shift("s2", 2, 9, 17, "p1"));
        let report = sync.validate_totals("p1", "2024-25").unwrap();
        assert!(report.has_drift());
        let gross = report.drift.iter().find(|d| d.field == "gross_pay").unwrap();
        assert_eq!(gross.stored, dec("200.00"));
        assert_eq!(gross.expected, dec("400.00"));
        assert_eq!(gross.difference, dec("-200.00"));
        assert_eq!(store.load_period("p1").unwrap().unwrap().gross_pay, dec("200.00"));
    }

    #[test]
    fn test_variance_against_actual_pay() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        let mut period = store.load_period("p1").unwrap().unwrap();
        period.actual_pay = Some(dec("150.00"));
        store.put_period(period);

        let result = sync.sync("p1", "2024-25").unwrap();
        assert_eq!(result.variance, Some(dec("150.00") - result.tax.net_pay));
    }

    #[test]
    fn test_missing_profile_degrades() {
        let (store, sync) = setup();
        store.put_period(PayPeriod::new("p9", "emp-9", day(1), day(7), PayFrequency::Weekly));
        let mut s = shift("s9", 1, 9, 17, "p9");
        s.owner_id = "emp-9".to_string();
        store.put_shift(s);
        let result = sync.sync("p9", "2024-25").unwrap();
        assert!(result.tax.degraded);
        assert_eq!(result.tax.scale, TaxScale::NoTaxIdentifier);
    }

    #[test]
    fn test_weekly_threshold_warning() {
        let (store, sync) = setup();
        // Five 9h shifts Monday to Friday: 45 hours against a 38 hour threshold
        for d in 1..=5 {
            store.put_shift(shift(&format!("s{}", d), d, 8, 17, "p1"));
        }
        let result = sync.sync("p1", "2024-25").unwrap();
        assert!(result.warnings.iter().any(|w| w.code == "WEEKLY_THRESHOLD_EXCEEDED"));
    }

    #[test]
    fn test_year_to_date_spans_periods() {
        let (store, sync) = setup();
        store.put_shift(shift("s1", 1, 9, 17, "p1"));
        store.put_shift(shift("s2", 8, 9, 17, "p2"));
        sync.sync("p1", "2024-25").unwrap();
        sync.sync("p2", "2024-25").unwrap();
        let ytd = store.load_year_to_date("emp-1", "2024-25").unwrap().unwrap();
        assert_eq!(ytd.gross_pay, dec("400.00"));
    }
}
