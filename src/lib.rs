//! Payroll engine: award interpretation and progressive tax withholding.
//!
//! This crate turns worked shifts into pay under an award's penalty and
//! overtime rules, withholds tax from each pay period against versioned
//! rate tables, and keeps stored pay periods in step with their shifts.
//!
//! The flow runs [`calculation::calculate_shift`] per shift, sums shifts into
//! a period in [`sync::PayPeriodSynchronizer`], and withholds tax with
//! [`calculation::calculate_period_tax`] against a snapshot from
//! [`tax_store::TaxCoefficientStore`].

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;
pub mod tax_store;
