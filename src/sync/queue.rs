//! Single-writer sync queue.
//!
//! A dispatcher task routes every sync job to a lane, one lane per period
//! owner. Each lane runs its jobs one after another, so no period (and no
//! owner's year-to-date record) is ever recomputed by two jobs at once.
//! Different owners proceed in parallel. A lane closes once it has no jobs
//! in flight and is started again by the owner's next job.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::PayPeriodResult;

use super::synchronizer::PayPeriodSynchronizer;

/// Jobs the dispatcher will buffer before `sync` callers wait.
const DISPATCH_CAPACITY: usize = 256;

struct SyncJob {
    correlation_id: Uuid,
    lane: String,
    period_id: String,
    tax_year: String,
    reply: oneshot::Sender<EngineResult<PayPeriodResult>>,
}

/// Handle to a running sync queue. Cheap to clone.
///
/// The queue stops once every handle is dropped and the lanes have drained.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use payroll_engine::sync::{PayPeriodSynchronizer, SyncQueue};
///
/// async fn resync(synchronizer: Arc<PayPeriodSynchronizer>) -> payroll_engine::error::EngineResult<()> {
///     let queue = SyncQueue::spawn(synchronizer);
///     let result = queue.sync("p1", "2024-25").await?;
///     println!("net pay {}", result.tax.net_pay);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SyncQueue {
    jobs: mpsc::Sender<SyncJob>,
    synchronizer: Arc<PayPeriodSynchronizer>,
    active_lanes: Arc<AtomicUsize>,
}

impl std::fmt::Debug for SyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncQueue")
            .field("closed", &self.jobs.is_closed())
            .field("active_lanes", &self.active_lanes())
            .finish_non_exhaustive()
    }
}

impl SyncQueue {
    /// Starts the dispatcher on the current tokio runtime.
    pub fn spawn(synchronizer: Arc<PayPeriodSynchronizer>) -> Self {
        let (jobs, rx) = mpsc::channel(DISPATCH_CAPACITY);
        let active_lanes = Arc::new(AtomicUsize::new(0));
        tokio::spawn(dispatch(
            rx,
            Arc::clone(&synchronizer),
            Arc::clone(&active_lanes),
        ));
        info!("Sync queue started");
        Self {
            jobs,
            synchronizer,
            active_lanes,
        }
    }

    /// Number of owner lanes with jobs in flight.
    pub fn active_lanes(&self) -> usize {
        self.active_lanes.load(Ordering::SeqCst)
    }

    /// Queues a sync of one period and waits for its result.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound` if the period does not exist, `QueueClosed` if the
    /// queue has stopped, and anything [`PayPeriodSynchronizer::sync`] returns.
    pub async fn sync(&self, period_id: &str, tax_year: &str) -> EngineResult<PayPeriodResult> {
        let lane = self
            .synchronizer
            .store()
            .load_period(period_id)?
            .map(|period| period.owner_id)
            .ok_or_else(|| EngineError::PeriodNotFound {
                period_id: period_id.to_string(),
            })?;

        let correlation_id = Uuid::new_v4();
        let (reply, response) = oneshot::channel();
        let job = SyncJob {
            correlation_id,
            lane,
            period_id: period_id.to_string(),
            tax_year: tax_year.to_string(),
            reply,
        };

        debug!(correlation_id = %correlation_id, period_id = %period_id, "Sync job queued");
        self.jobs
            .send(job)
            .await
            .map_err(|_| EngineError::QueueClosed)?;
        response.await.map_err(|_| EngineError::QueueClosed)?
    }

    /// Queues syncs for the period a new shift belongs to.
    pub async fn shift_created(
        &self,
        shift_id: &str,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self.synchronizer.affected_periods(shift_id, None, true)?;
        self.sync_all(&periods, tax_year).await
    }

    /// Queues syncs for the period a shift left and the one it is in now.
    pub async fn shift_updated(
        &self,
        shift_id: &str,
        previous_period_id: Option<&str>,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self
            .synchronizer
            .affected_periods(shift_id, previous_period_id, true)?;
        self.sync_all(&periods, tax_year).await
    }

    /// Queues a sync for the period a deleted shift belonged to.
    pub async fn shift_deleted(
        &self,
        shift_id: &str,
        previous_period_id: Option<&str>,
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let periods = self
            .synchronizer
            .affected_periods(shift_id, previous_period_id, false)?;
        self.sync_all(&periods, tax_year).await
    }

    async fn sync_all(
        &self,
        period_ids: &[String],
        tax_year: &str,
    ) -> EngineResult<Vec<PayPeriodResult>> {
        let mut results = Vec::with_capacity(period_ids.len());
        for period_id in period_ids {
            match self.sync(period_id, tax_year).await {
                Ok(result) => results.push(result),
                Err(EngineError::PeriodLocked { period_id }) => {
                    warn!(period_id = %period_id, "Shift change touches a paid period; left as paid");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}

/// One owner's lane as seen by the dispatcher.
struct Lane {
    jobs: mpsc::UnboundedSender<SyncJob>,
    in_flight: usize,
}

/// Routes jobs to their owner's lane, starting lanes on first use and
/// closing them once every job sent to them has finished.
async fn dispatch(
    mut jobs: mpsc::Receiver<SyncJob>,
    synchronizer: Arc<PayPeriodSynchronizer>,
    active_lanes: Arc<AtomicUsize>,
) {
    let mut lanes: HashMap<String, Lane> = HashMap::new();
    let (finished_tx, mut finished) = mpsc::unbounded_channel::<String>();
    let mut started = 0usize;

    loop {
        tokio::select! {
            job = jobs.recv() => {
                let Some(job) = job else { break };
                let key = job.lane.clone();
                let lane = lanes.entry(key.clone()).or_insert_with(|| {
                    started += 1;
                    debug!(lane = %key, "Starting sync lane");
                    let (tx, rx) = mpsc::unbounded_channel();
                    tokio::spawn(run_lane(
                        key.clone(),
                        rx,
                        Arc::clone(&synchronizer),
                        finished_tx.clone(),
                    ));
                    Lane { jobs: tx, in_flight: 0 }
                });
                match lane.jobs.send(job) {
                    Ok(()) => lane.in_flight += 1,
                    Err(mpsc::error::SendError(job)) => {
                        let _ = job.reply.send(Err(EngineError::QueueClosed));
                    }
                }
            }
            Some(key) = finished.recv() => {
                let idle = lanes.get_mut(&key).is_some_and(|lane| {
                    lane.in_flight = lane.in_flight.saturating_sub(1);
                    lane.in_flight == 0
                });
                if idle {
                    // Dropping the sender ends the lane task.
                    lanes.remove(&key);
                    debug!(lane = %key, "Sync lane idle, closed");
                }
            }
        }
        active_lanes.store(lanes.len(), Ordering::SeqCst);
    }

    info!(lanes_started = started, "Sync queue stopped");
}

/// Runs one lane's jobs in arrival order.
async fn run_lane(
    lane: String,
    mut jobs: mpsc::UnboundedReceiver<SyncJob>,
    synchronizer: Arc<PayPeriodSynchronizer>,
    finished: mpsc::UnboundedSender<String>,
) {
    while let Some(job) = jobs.recv().await {
        let SyncJob {
            correlation_id,
            period_id,
            tax_year,
            reply,
            ..
        } = job;

        let worker = Arc::clone(&synchronizer);
        let task_period = period_id.clone();
        let result = tokio::task::spawn_blocking(move || worker.sync(&task_period, &tax_year))
            .await
            .unwrap_or_else(|e| {
                Err(EngineError::Persistence {
                    message: format!("sync task failed: {}", e),
                })
            });

        match &result {
            Ok(_) => debug!(
                correlation_id = %correlation_id,
                lane = %lane,
                period_id = %period_id,
                "Sync job finished"
            ),
            Err(e) => warn!(
                correlation_id = %correlation_id,
                lane = %lane,
                period_id = %period_id,
                error = %e,
                "Sync job failed"
            ),
        }
        if reply.send(result).is_err() {
            debug!(correlation_id = %correlation_id, "Sync caller went away before the result");
        }
        // The dispatcher is gone only once the queue has shut down.
        let _ = finished.send(lane.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::{Award, PayFrequency, PayPeriod, Shift};
    use crate::sync::InMemoryPayrollStore;
    use crate::tax_store::{InMemoryRateTableSource, TaxCoefficientStore};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn setup() -> (Arc<InMemoryPayrollStore>, SyncQueue) {
        let store = Arc::new(InMemoryPayrollStore::new());
        store.put_award(Award::new("retail", Decimal::from(25), day(1)));
        store.put_period(PayPeriod::new("p1", "emp-1", day(1), day(7), PayFrequency::Weekly));
        store.put_shift(Shift {
            id: "s1".to_string(),
            owner_id: "emp-1".to_string(),
            start_time: day(1).and_hms_opt(9, 0, 0).unwrap(),
            end_time: Some(day(1).and_hms_opt(17, 0, 0).unwrap()),
            break_minutes: 0,
            breaks: vec![],
            award_ref: "retail".to_string(),
            period_ref: Some("p1".to_string()),
        });
        let source = InMemoryRateTableSource::with_tables(ConfigLoader::bundled_rate_tables().unwrap());
        let rates = Arc::new(TaxCoefficientStore::new(Arc::new(source)).unwrap());
        let synchronizer = Arc::new(PayPeriodSynchronizer::new(store.clone(), rates));
        (store, SyncQueue::spawn(synchronizer))
    }

    #[tokio::test]
    async fn test_queued_sync_returns_result() {
        let (store, queue) = setup();
        let result = queue.sync("p1", "2024-25").await.unwrap();
        assert_eq!(result.totals.total_gross_pay, Decimal::new(20000, 2));
        assert_eq!(store.period_writes(), 1);
    }

    #[tokio::test]
    async fn test_unknown_period_fails_before_queueing() {
        let (_, queue) = setup();
        assert!(matches!(
            queue.sync("nope", "2024-25").await,
            Err(EngineError::PeriodNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_for_one_period_all_complete() {
        let (store, queue) = setup();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.sync("p1", "2024-25").await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(store.period_writes(), 8);
    }

    async fn wait_for_idle_lanes(queue: &SyncQueue) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while queue.active_lanes() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_idle_lanes_are_closed_and_restarted() {
        let (store, queue) = setup();
        store.put_period(PayPeriod::new("p2", "emp-2", day(1), day(7), PayFrequency::Weekly));

        queue.sync("p1", "2024-25").await.unwrap();
        queue.sync("p2", "2024-25").await.unwrap();
        wait_for_idle_lanes(&queue).await;
        assert_eq!(queue.active_lanes(), 0);

        // The owner's next job starts a fresh lane.
        let result = queue.sync("p1", "2024-25").await.unwrap();
        assert_eq!(result.totals.total_gross_pay, Decimal::new(20000, 2));
        wait_for_idle_lanes(&queue).await;
        assert_eq!(store.period_writes(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lane_survives_jobs_arriving_while_busy() {
        let (store, queue) = setup();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.sync("p1", "2024-25").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        wait_for_idle_lanes(&queue).await;
        assert_eq!(store.period_writes(), 16);
    }

    #[tokio::test]
    async fn test_errors_come_back_through_the_queue() {
        let (_, queue) = setup();
        assert!(matches!(
            queue.sync("p1", "not-a-year").await,
            Err(EngineError::InvalidInput { .. })
        ));
        // The lane survives a failed job.
        assert!(queue.sync("p1", "2024-25").await.is_ok());
    }
}
