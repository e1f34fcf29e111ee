//! Backing sources for withholding rate tables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::config::{ConfigLoader, RateTableFile};
use crate::error::{EngineError, EngineResult};
use crate::models::{MedicareLevyConfig, StudyLoanThresholdRow, TaxCoefficientRow, TaxScale};

/// Read access to the persisted rate tables.
///
/// Implementations are shared between tasks, so they must be `Send + Sync`.
/// A missing year or scale is reported as an empty list; only an unreachable
/// source is an error.
pub trait RateTableSource: Send + Sync {
    /// Coefficient rows for one year and scale.
    fn list_coefficients(
        &self,
        tax_year: &str,
        scale: TaxScale,
    ) -> EngineResult<Vec<TaxCoefficientRow>>;

    /// Study-loan bands for one year.
    fn list_study_loan_thresholds(
        &self,
        tax_year: &str,
    ) -> EngineResult<Vec<StudyLoanThresholdRow>>;

    /// Levy thresholds for one year, if the year is known.
    fn medicare_config(&self, tax_year: &str) -> EngineResult<Option<MedicareLevyConfig>>;
}

/// A rate-table source held in memory.
///
/// Tables can be replaced at runtime, and the source can be switched to
/// unavailable to exercise fallback paths. Every read is counted.
#[derive(Debug, Default)]
pub struct InMemoryRateTableSource {
    tables: RwLock<HashMap<String, RateTableFile>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryRateTableSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source preloaded with one file.
    pub fn with_tables(file: RateTableFile) -> Self {
        let source = Self::new();
        source.insert(file);
        source
    }

    /// Inserts or replaces the tables for the file's year.
    pub fn insert(&self, file: RateTableFile) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.insert(file.tax_year.clone(), file);
    }

    /// Removes a year's tables.
    pub fn remove(&self, tax_year: &str) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.remove(tax_year);
    }

    /// Makes every subsequent read fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of reads served or refused so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read<T>(&self, tax_year: &str, f: impl FnOnce(&RateTableFile) -> T) -> EngineResult<Option<T>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::StoreUnavailable {
                message: "in-memory rate tables switched off".to_string(),
            });
        }
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.get(tax_year).map(f))
    }
}

impl RateTableSource for InMemoryRateTableSource {
    fn list_coefficients(
        &self,
        tax_year: &str,
        scale: TaxScale,
    ) -> EngineResult<Vec<TaxCoefficientRow>> {
        Ok(self
            .read(tax_year, |file| file.coefficient_rows(scale))?
            .unwrap_or_default())
    }

    fn list_study_loan_thresholds(
        &self,
        tax_year: &str,
    ) -> EngineResult<Vec<StudyLoanThresholdRow>> {
        Ok(self
            .read(tax_year, RateTableFile::study_loan_rows)?
            .unwrap_or_default())
    }

    fn medicare_config(&self, tax_year: &str) -> EngineResult<Option<MedicareLevyConfig>> {
        self.read(tax_year, RateTableFile::medicare_config)
    }
}

/// A rate-table source reading `<dir>/<tax_year>.yaml`.
///
/// Each call re-reads the file. A missing file means the year is unknown;
/// a file that fails to parse makes the source unavailable.
#[derive(Debug, Clone)]
pub struct YamlRateTableSource {
    dir: PathBuf,
}

impl YamlRateTableSource {
    /// Creates a source over a directory of per-year files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load(&self, tax_year: &str) -> EngineResult<Option<RateTableFile>> {
        let path = self.dir.join(format!("{}.yaml", tax_year));
        match ConfigLoader::load_rate_tables(&path) {
            Ok(file) => Ok(Some(file)),
            Err(EngineError::ConfigNotFound { .. }) => Ok(None),
            Err(EngineError::InvalidRateTable { message, .. }) => Err(EngineError::StoreUnavailable {
                message: format!("rate tables at {}: {}", path.display(), message),
            }),
            Err(e) => Err(EngineError::StoreUnavailable {
                message: e.to_string(),
            }),
        }
    }
}

impl RateTableSource for YamlRateTableSource {
    fn list_coefficients(
        &self,
        tax_year: &str,
        scale: TaxScale,
    ) -> EngineResult<Vec<TaxCoefficientRow>> {
        Ok(self
            .load(tax_year)?
            .map(|file| file.coefficient_rows(scale))
            .unwrap_or_default())
    }

    fn list_study_loan_thresholds(
        &self,
        tax_year: &str,
    ) -> EngineResult<Vec<StudyLoanThresholdRow>> {
        Ok(self
            .load(tax_year)?
            .map(|file| file.study_loan_rows())
            .unwrap_or_default())
    }

    fn medicare_config(&self, tax_year: &str) -> EngineResult<Option<MedicareLevyConfig>> {
        Ok(self.load(tax_year)?.map(|file| file.medicare_config()))
    }
}
