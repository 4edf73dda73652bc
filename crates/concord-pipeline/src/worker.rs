//! Background worker that classifies pending couples on a schedule

use crate::{BatchReport, Pipeline};
use concord_domain::traits::{ClassifierService, DataSource, ResultSink};
use concord_domain::AccessId;
use futures::future::{self, FutureExt};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use tokio::time::{interval, Duration};

/// Worker that runs batches of pending couples at a fixed interval
///
/// Each cycle asks a provider for the couples still waiting for a verdict
/// and runs them as one batch. Reports of every batch are folded into a
/// running total. A couple whose failure will not clear on a retry is
/// parked and left out of later cycles; unreachable-service failures are
/// picked up again on the next cycle.
///
/// # Examples
///
/// ```no_run
/// use concord_classifier::{ClassifierConfig, HttpClassifier};
/// use concord_pipeline::{BatchWorker, Pipeline, PipelineConfig};
/// use concord_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteStore::new("concord.db")?;
///     let classifier = HttpClassifier::new(ClassifierConfig::default())?;
///     let pipeline = Pipeline::new(&store, classifier, &store, PipelineConfig::default())?;
///     let mut worker = BatchWorker::new(pipeline);
///
///     // Run until Ctrl+C
///     let totals = worker.watch(|| store.pending_access_ids()).await;
///     println!("{}", totals.summary());
///     Ok(())
/// }
/// ```
pub struct BatchWorker<D, C, R> {
    pipeline: Pipeline<D, C, R>,
    interval: Duration,
    totals: BatchReport,
    parked: HashSet<AccessId>,
}

impl<D, C, R> BatchWorker<D, C, R>
where
    D: DataSource,
    D::Error: fmt::Display,
    C: ClassifierService,
    R: ResultSink,
    R::Error: fmt::Display,
{
    /// Create a worker using the pipeline's watch interval
    pub fn new(pipeline: Pipeline<D, C, R>) -> Self {
        let interval = pipeline.config().watch_interval();
        Self {
            pipeline,
            interval,
            totals: BatchReport::new(),
            parked: HashSet::new(),
        }
    }

    /// Pipeline driven by this worker
    pub fn pipeline(&self) -> &Pipeline<D, C, R> {
        &self.pipeline
    }

    /// Run a single batch, stopping dispatch on Ctrl+C
    pub async fn run_once(&mut self, ids: &[AccessId]) -> BatchReport {
        let report = self
            .pipeline
            .run_batch_until(ids, tokio::signal::ctrl_c())
            .await;
        self.totals.merge(report.clone());
        report
    }

    /// Run batches of pending couples until Ctrl+C
    pub async fn watch<P, E>(&mut self, pending: P) -> BatchReport
    where
        P: FnMut() -> Result<Vec<AccessId>, E>,
        E: fmt::Display,
    {
        self.watch_until(pending, tokio::signal::ctrl_c().map(|_| ()))
            .await
    }

    /// Run batches of pending couples until `shutdown` resolves
    ///
    /// A shutdown during a batch stops that batch's dispatch and ends the
    /// loop once its in-flight couples finish. Returns the running totals.
    pub async fn watch_until<P, E, F>(&mut self, mut pending: P, shutdown: F) -> BatchReport
    where
        P: FnMut() -> Result<Vec<AccessId>, E>,
        E: fmt::Display,
        F: Future<Output = ()>,
    {
        let shutdown = shutdown.shared();
        let mut ticker = interval(self.interval);

        tracing::info!("Batch worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle(&mut pending, shutdown.clone()).await;
                    if shutdown.peek().is_some() {
                        tracing::info!("Shutdown signal received during batch, stopping worker");
                        break;
                    }
                }
                _ = shutdown.clone() => {
                    tracing::info!("Shutdown signal received, stopping worker");
                    break;
                }
            }
        }

        tracing::info!("Batch worker stopped. Totals:\n{}", self.totals.summary());
        self.totals.clone()
    }

    /// Run a fixed number of cycles
    pub async fn run_cycles<P, E>(&mut self, mut pending: P, cycles: usize) -> BatchReport
    where
        P: FnMut() -> Result<Vec<AccessId>, E>,
        E: fmt::Display,
    {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting batch cycle {}/{}", cycle + 1, cycles);
            self.cycle(&mut pending, future::pending::<()>()).await;
        }

        self.totals.clone()
    }

    async fn cycle<P, E, F>(&mut self, pending: &mut P, shutdown: F)
    where
        P: FnMut() -> Result<Vec<AccessId>, E>,
        E: fmt::Display,
        F: Future,
    {
        let ids: Vec<AccessId> = match pending() {
            Ok(ids) => ids
                .into_iter()
                .filter(|id| !self.parked.contains(id))
                .collect(),
            Err(e) => {
                tracing::error!("Failed to list pending couples: {}", e);
                return;
            }
        };

        if ids.is_empty() {
            tracing::debug!("No pending couples");
            return;
        }

        let report = self.pipeline.run_batch_until(&ids, shutdown).await;
        if !report.rejected.is_empty() {
            tracing::warn!(
                count = report.rejected.len(),
                "Parking couples that failed permanently"
            );
            self.parked.extend(report.rejected.iter().cloned());
        }
        self.totals.merge(report);
    }

    /// Couples left out of later cycles after a permanent failure
    pub fn parked(&self) -> &HashSet<AccessId> {
        &self.parked
    }

    /// Let parked couples be picked up again
    pub fn release_parked(&mut self) {
        self.parked.clear();
    }

    /// Running totals across every batch
    pub fn totals(&self) -> &BatchReport {
        &self.totals
    }

    /// Reset the running totals
    pub fn reset_totals(&mut self) {
        self.totals.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineConfig;
    use concord_classifier::MockClassifier;
    use concord_domain::{CoupleRecord, RespondentProfile, Verdict};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        records: HashMap<AccessId, CoupleRecord>,
        verdicts: RefCell<HashMap<AccessId, Verdict>>,
    }

    impl MemoryStore {
        fn with(ids: &[&str]) -> Self {
            let mut store = Self::default();
            for id in ids {
                let mut record = CoupleRecord::new(AccessId::from(*id));
                record.primary = Some(RespondentProfile::default());
                record.secondary = Some(RespondentProfile::default());
                store.records.insert(AccessId::from(*id), record);
            }
            store
        }

        fn pending(&self) -> Result<Vec<AccessId>, String> {
            let done = self.verdicts.borrow();
            let mut ids: Vec<AccessId> = self
                .records
                .keys()
                .filter(|id| !done.contains_key(*id))
                .cloned()
                .collect();
            ids.sort();
            Ok(ids)
        }
    }

    impl DataSource for MemoryStore {
        type Error = String;

        fn get_couple_record(&self, access_id: &AccessId) -> Result<Option<CoupleRecord>, String> {
            Ok(self.records.get(access_id).cloned())
        }
    }

    impl ResultSink for MemoryStore {
        type Error = String;

        fn persist(&self, access_id: &AccessId, verdict: &Verdict) -> Result<(), String> {
            self.verdicts
                .borrow_mut()
                .insert(access_id.clone(), verdict.clone());
            Ok(())
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            watch_interval_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let store = MemoryStore::default();
        let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, config()).unwrap();
        let worker = BatchWorker::new(pipeline);
        assert_eq!(worker.interval, Duration::from_secs(1));
        assert!(worker.totals().is_clean());
    }

    #[tokio::test]
    async fn test_cycles_only_process_pending() {
        let store = MemoryStore::with(&["a", "b", "c"]);
        let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, config()).unwrap();
        let mut worker = BatchWorker::new(pipeline);

        let totals = worker.run_cycles(|| store.pending(), 2).await;

        // The second cycle finds nothing left to do
        assert_eq!(totals.total, 3);
        assert_eq!(totals.success, 3);
        assert_eq!(totals.batch_count, 1);
        assert_eq!(worker.pipeline().classifier().call_count(), 3);
        assert!(store.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_rerun() {
        let mut store = MemoryStore::with(&["a"]);
        store
            .records
            .insert(AccessId::from("broken"), CoupleRecord::new(AccessId::from("broken")));
        let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, config()).unwrap();
        let mut worker = BatchWorker::new(pipeline);

        let totals = worker.run_cycles(|| store.pending(), 3).await;

        assert_eq!(totals.total, 2);
        assert_eq!(totals.success, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.messages.len(), 1);
        assert!(worker.parked().contains(&AccessId::from("broken")));
        // Still without a verdict, but no longer dispatched
        assert_eq!(store.pending().unwrap(), vec![AccessId::from("broken")]);

        worker.release_parked();
        let totals = worker.run_cycles(|| store.pending(), 1).await;
        assert_eq!(totals.failed, 2);
    }

    #[tokio::test]
    async fn test_unavailable_service_is_retried_next_cycle() {
        let store = MemoryStore::with(&["offline"]);
        let mut classifier = MockClassifier::default();
        classifier.add_unavailable(AccessId::from("offline"));
        let pipeline = Pipeline::new(&store, classifier, &store, config()).unwrap();
        let mut worker = BatchWorker::new(pipeline);

        let totals = worker.run_cycles(|| store.pending(), 2).await;

        assert_eq!(totals.failed, 2);
        assert_eq!(totals.retryable, 2);
        assert!(worker.parked().is_empty());
        assert_eq!(worker.pipeline().classifier().call_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_does_not_stop_worker() {
        let store = MemoryStore::with(&["a"]);
        let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, config()).unwrap();
        let mut worker = BatchWorker::new(pipeline);

        let mut calls = 0;
        let totals = worker
            .run_cycles(
                || {
                    calls += 1;
                    if calls == 1 {
                        Err("database locked".to_string())
                    } else {
                        store.pending()
                    }
                },
                2,
            )
            .await;
        assert_eq!(totals.success, 1);
    }

    #[tokio::test]
    async fn test_watch_stops_on_shutdown() {
        let store = MemoryStore::with(&["a", "b"]);
        let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, config()).unwrap();
        let mut worker = BatchWorker::new(pipeline);

        let totals = worker
            .watch_until(
                || store.pending(),
                tokio::time::sleep(Duration::from_millis(300)),
            )
            .await;

        assert_eq!(totals.success, 2);
        worker.reset_totals();
        assert_eq!(worker.totals().total, 0);
    }
}
