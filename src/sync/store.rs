//! The persistence seam the synchronizer reads from and writes to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::{EngineError, EngineResult};
use crate::models::{Award, PayPeriod, Shift, TaxWithholdingProfile, YearToDateTax};

/// Records the synchronizer needs, supplied by the caller's persistence layer.
///
/// Lookups return `Ok(None)` for a missing record; `Err` means the store
/// itself failed.
pub trait PayrollStore: Send + Sync {
    /// Loads a pay period.
    fn load_period(&self, period_id: &str) -> EngineResult<Option<PayPeriod>>;

    /// Replaces a pay period record in one write.
    fn save_period(&self, period: &PayPeriod) -> EngineResult<()>;

    /// Every pay period belonging to an owner.
    fn load_periods_for_owner(&self, owner_id: &str) -> EngineResult<Vec<PayPeriod>>;

    /// Every shift whose `period_ref` names the period.
    fn load_shifts_for_period(&self, period_id: &str) -> EngineResult<Vec<Shift>>;

    /// Loads a shift.
    fn load_shift(&self, shift_id: &str) -> EngineResult<Option<Shift>>;

    /// Loads an award.
    fn load_award(&self, award_id: &str) -> EngineResult<Option<Award>>;

    /// Loads an owner's withholding profile.
    fn load_profile(&self, owner_id: &str) -> EngineResult<Option<TaxWithholdingProfile>>;

    /// Loads an owner's year-to-date figures.
    fn load_year_to_date(
        &self,
        owner_id: &str,
        tax_year: &str,
    ) -> EngineResult<Option<YearToDateTax>>;

    /// Inserts or replaces an owner's year-to-date figures.
    fn save_year_to_date(&self, ytd: &YearToDateTax) -> EngineResult<()>;
}

/// In-memory [`PayrollStore`] for tests, benchmarks and embedding.
#[derive(Debug, Default)]
pub struct InMemoryPayrollStore {
    periods: RwLock<HashMap<String, PayPeriod>>,
    shifts: RwLock<HashMap<String, Shift>>,
    awards: RwLock<HashMap<String, Award>>,
    profiles: RwLock<HashMap<String, TaxWithholdingProfile>>,
    year_to_date: RwLock<HashMap<(String, String), YearToDateTax>>,
    period_writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryPayrollStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a pay period without the uniqueness check.
    pub fn put_period(&self, period: PayPeriod) {
        write(&self.periods).insert(period.id.clone(), period);
    }

    /// Inserts or replaces a shift.
    pub fn put_shift(&self, shift: Shift) {
        write(&self.shifts).insert(shift.id.clone(), shift);
    }

    /// Removes a shift, returning it if it existed.
    pub fn remove_shift(&self, shift_id: &str) -> Option<Shift> {
        write(&self.shifts).remove(shift_id)
    }

    /// Inserts or replaces an award.
    pub fn put_award(&self, award: Award) {
        write(&self.awards).insert(award.id.clone(), award);
    }

    /// Inserts or replaces an owner's withholding profile.
    pub fn put_profile(&self, owner_id: &str, profile: TaxWithholdingProfile) {
        write(&self.profiles).insert(owner_id.to_string(), profile);
    }

    /// Number of period writes so far.
    pub fn period_writes(&self) -> usize {
        self.period_writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with `Persistence`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> EngineResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence {
                message: "in-memory payroll store switched off".to_string(),
            });
        }
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl PayrollStore for InMemoryPayrollStore {
    fn load_period(&self, period_id: &str) -> EngineResult<Option<PayPeriod>> {
        self.check()?;
        Ok(read(&self.periods).get(period_id).cloned())
    }

    fn save_period(&self, period: &PayPeriod) -> EngineResult<()> {
        self.check()?;
        let mut periods = write(&self.periods);
        let clash = periods.values().any(|p| {
            p.id != period.id && p.owner_id == period.owner_id && p.start_date == period.start_date
        });
        if clash {
            return Err(EngineError::Persistence {
                message: format!(
                    "owner '{}' already has a period starting {}",
                    period.owner_id, period.start_date
                ),
            });
        }
        periods.insert(period.id.clone(), period.clone());
        self.period_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_periods_for_owner(&self, owner_id: &str) -> EngineResult<Vec<PayPeriod>> {
        self.check()?;
        let mut periods: Vec<PayPeriod> = read(&self.periods)
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        periods.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(periods)
    }

    fn load_shifts_for_period(&self, period_id: &str) -> EngineResult<Vec<Shift>> {
        self.check()?;
        let mut shifts: Vec<Shift> = read(&self.shifts)
            .values()
            .filter(|s| s.period_ref.as_deref() == Some(period_id))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(shifts)
    }

    fn load_shift(&self, shift_id: &str) -> EngineResult<Option<Shift>> {
        self.check()?;
        Ok(read(&self.shifts).get(shift_id).cloned())
    }

    fn load_award(&self, award_id: &str) -> EngineResult<Option<Award>> {
        self.check()?;
        Ok(read(&self.awards).get(award_id).cloned())
    }

    fn load_profile(&self, owner_id: &str) -> EngineResult<Option<TaxWithholdingProfile>> {
        self.check()?;
        Ok(read(&self.profiles).get(owner_id).cloned())
    }

    fn load_year_to_date(
        &self,
        owner_id: &str,
        tax_year: &str,
    ) -> EngineResult<Option<YearToDateTax>> {
        self.check()?;
        Ok(read(&self.year_to_date)
            .get(&(owner_id.to_string(), tax_year.to_string()))
            .cloned())
    }

    fn save_year_to_date(&self, ytd: &YearToDateTax) -> EngineResult<()> {
        self.check()?;
        write(&self.year_to_date).insert((ytd.owner_id.clone(), ytd.tax_year.clone()), ytd.clone());
        Ok(())
    }
}
