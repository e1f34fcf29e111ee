//! Pay-period synchronization: the persistence seam, the synchronizer that
//! rebuilds periods from their shifts, and the queue that serializes it.

mod queue;
mod store;
mod synchronizer;

pub use queue::SyncQueue;
pub use store::{InMemoryPayrollStore, PayrollStore};
pub use synchronizer::PayPeriodSynchronizer;
