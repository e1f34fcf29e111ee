//! Cached, versioned access to withholding rate tables.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    MedicareLevyConfig, StudyLoanThresholdRow, TableOrigin, TaxCoefficientRow, TaxScale,
};

use super::snapshot::RateTableSnapshot;
use super::source::RateTableSource;

/// Cached read access to the rate tables held by a [`RateTableSource`].
///
/// A year's tables are read once and served from the cache until
/// [`invalidate`](Self::invalidate) or [`invalidate_all`](Self::invalidate_all)
/// is called; reads never re-check the source. Whoever edits the tables must
/// invalidate in the same operation.
///
/// When the source fails, knows nothing about the year, or returns tables
/// that do not tile, the bundled default tables are served instead. Fallback
/// snapshots are never cached, so the next read retries the source.
///
/// Each fiscal year has its own generation. Invalidating a year bumps that
/// year's generation and `invalidate_all` bumps every year's. Snapshots carry
/// the generation they were loaded under, and [`is_current`](Self::is_current)
/// tells a caller whether newer data may be available for the snapshot's year.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::{TableOrigin, TaxScale};
/// use payroll_engine::tax_store::{InMemoryRateTableSource, TaxCoefficientStore};
///
/// let source = InMemoryRateTableSource::with_tables(ConfigLoader::bundled_rate_tables()?);
/// let store = TaxCoefficientStore::new(Arc::new(source))?;
///
/// let snapshot = store.snapshot("2024-25");
/// assert_eq!(snapshot.origin, TableOrigin::Live);
/// assert!(!store.coefficients("2024-25", TaxScale::TaxFreeThreshold).is_empty());
///
/// store.invalidate("2023-24");
/// assert!(store.is_current(&snapshot));
/// store.invalidate("2024-25");
/// assert!(!store.is_current(&snapshot));
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub struct TaxCoefficientStore {
    source: Arc<dyn RateTableSource>,
    cache: RwLock<CacheState>,
    bundled: RateTableSnapshot,
}

/// Cached snapshots and generation counters, guarded by one lock so an
/// invalidation and the cache entry it drops change together.
#[derive(Default)]
struct CacheState {
    snapshots: HashMap<String, Arc<RateTableSnapshot>>,
    /// Bumped by `invalidate_all`.
    epoch: u64,
    /// Per-year bumps from `invalidate`.
    bumps: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, tax_year: &str) -> u64 {
        self.epoch + self.bumps.get(tax_year).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for TaxCoefficientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("TaxCoefficientStore")
            .field("cached_years", &state.snapshots.len())
            .field("epoch", &state.epoch)
            .field("bundled_tax_year", &self.bundled.tax_year)
            .finish_non_exhaustive()
    }
}

impl TaxCoefficientStore {
    /// Creates a store over a source, parsing the bundled fallback tables.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled tables compiled into the crate are broken.
    pub fn new(source: Arc<dyn RateTableSource>) -> EngineResult<Self> {
        let bundled = ConfigLoader::bundled_rate_tables()?
            .to_snapshot()
            .with_origin(TableOrigin::BundledDefault, 0);

        Ok(Self {
            source,
            cache: RwLock::new(CacheState::default()),
            bundled,
        })
    }

    /// Returns every table for a year, from the cache when possible.
    pub fn snapshot(&self, tax_year: &str) -> Arc<RateTableSnapshot> {
        let generation = {
            let state = self.read_state();
            if let Some(snapshot) = state.snapshots.get(tax_year) {
                debug!(tax_year = %tax_year, generation = snapshot.generation, "Rate table cache hit");
                return Arc::clone(snapshot);
            }
            state.generation(tax_year)
        };

        match self.load(tax_year, generation) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let mut state = self.write_state();
                // An invalidation that raced the load wins; serve but don't keep.
                if state.generation(tax_year) == generation {
                    state
                        .snapshots
                        .insert(tax_year.to_string(), Arc::clone(&snapshot));
                    info!(tax_year = %tax_year, generation, "Rate tables cached");
                }
                snapshot
            }
            Err(e) => {
                warn!(
                    tax_year = %tax_year,
                    error = %e,
                    "Rate tables unavailable, serving bundled defaults"
                );
                Arc::new(self.fallback(tax_year, generation))
            }
        }
    }

    /// Coefficient rows for a year and scale, ordered by lower bound.
    pub fn coefficients(&self, tax_year: &str, scale: TaxScale) -> Vec<TaxCoefficientRow> {
        self.snapshot(tax_year).coefficients(scale).to_vec()
    }

    /// Levy thresholds for a year.
    pub fn medicare_config(&self, tax_year: &str) -> MedicareLevyConfig {
        self.snapshot(tax_year).medicare.clone()
    }

    /// Study-loan bands for a year.
    pub fn study_loan_thresholds(&self, tax_year: &str) -> Vec<StudyLoanThresholdRow> {
        self.snapshot(tax_year).study_loan.clone()
    }

    /// Drops a year's cached tables and bumps that year's generation.
    pub fn invalidate(&self, tax_year: &str) {
        let mut state = self.write_state();
        state.snapshots.remove(tax_year);
        *state.bumps.entry(tax_year.to_string()).or_insert(0) += 1;
        let generation = state.generation(tax_year);
        info!(tax_year = %tax_year, generation, "Rate tables invalidated");
    }

    /// Drops every cached year and bumps every year's generation.
    pub fn invalidate_all(&self) {
        let mut state = self.write_state();
        let dropped = state.snapshots.len();
        state.snapshots.clear();
        state.epoch += 1;
        info!(dropped, epoch = state.epoch, "All rate tables invalidated");
    }

    /// The current generation for a year.
    pub fn generation(&self, tax_year: &str) -> u64 {
        self.read_state().generation(tax_year)
    }

    /// Returns false once the snapshot's year has been invalidated since the
    /// snapshot was loaded.
    pub fn is_current(&self, snapshot: &RateTableSnapshot) -> bool {
        snapshot.generation == self.generation(&snapshot.tax_year)
    }

    /// Returns true if the year is held in the cache.
    pub fn is_cached(&self, tax_year: &str) -> bool {
        self.read_state().snapshots.contains_key(tax_year)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, tax_year: &str, generation: u64) -> EngineResult<RateTableSnapshot> {
        let mut rows = Vec::new();
        for scale in TaxScale::ALL {
            rows.extend(self.source.list_coefficients(tax_year, scale)?);
        }
        let medicare = self.source.medicare_config(tax_year)?;
        let study_loan = self.source.list_study_loan_thresholds(tax_year)?;

        let medicare = match medicare {
            Some(medicare) if !rows.is_empty() => medicare,
            _ => {
                return Err(EngineError::InvalidRateTable {
                    tax_year: tax_year.to_string(),
                    message: "no rate tables recorded for this year".to_string(),
                });
            }
        };

        let snapshot = RateTableSnapshot::new(tax_year, rows, medicare, study_loan)
            .with_origin(TableOrigin::Live, generation);
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn fallback(&self, tax_year: &str, generation: u64) -> RateTableSnapshot {
        let mut snapshot = self
            .bundled
            .clone()
            .with_origin(TableOrigin::BundledDefault, generation);
        snapshot.tax_year = tax_year.to_string();
        snapshot
    }
}
