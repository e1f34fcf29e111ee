//! Withholding rate tables: the persistence seam, versioned snapshots, and the
//! caching store that falls back to bundled defaults.

mod snapshot;
mod source;
mod store;

pub use snapshot::{RateTableSnapshot, validate_coefficient_rows, validate_study_loan_rows};
pub use source::{InMemoryRateTableSource, RateTableSource, YamlRateTableSource};
pub use store::TaxCoefficientStore;
