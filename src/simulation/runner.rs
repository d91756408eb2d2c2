//! Concurrent simulation runner
//!
//! Fans a match budget out over a fixed number of worker tasks and waits for
//! all of them before returning, so a returned summary always describes a
//! fully drained simulation.

use crate::error::{EloSimError, Result};
use crate::simulation::orchestrator::MatchOrchestrator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Outcome counts of one runner invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub attempted: u64,
    pub recorded: u64,
    pub failed: u64,
    /// Failed matches by error kind
    pub failures: HashMap<String, u64>,
    pub elapsed: Duration,
}

#[derive(Default)]
struct WorkerTally {
    attempted: u64,
    recorded: u64,
    failures: HashMap<String, u64>,
}

/// Handle that asks a running simulation to stop claiming new matches
#[derive(Clone, Debug)]
pub struct StopHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// In-flight matches still finish
    pub fn stop(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Runs match simulations on a pool of worker tasks
pub struct SimulationRunner {
    orchestrator: Arc<MatchOrchestrator>,
    workers: usize,
    stop: StopHandle,
}

impl SimulationRunner {
    pub fn new(orchestrator: Arc<MatchOrchestrator>, workers: usize) -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            orchestrator,
            workers: workers.max(1),
            stop: StopHandle {
                sender: Arc::new(sender),
            },
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Attempt `matches` simulations and wait for every worker to finish
    ///
    /// Recoverable match failures are counted in the summary. An
    /// unrecoverable error stops the worker that hit it; the first such error
    /// is returned once every other worker has drained.
    pub async fn run(&self, matches: u64) -> Result<SimulationSummary> {
        let population = self.orchestrator.roster_size();
        if population < 2 {
            return Err(EloSimError::InsufficientPopulation { population });
        }

        let start = Instant::now();
        let budget = Arc::new(AtomicU64::new(matches));
        let worker_count = self.workers.min(matches.max(1) as usize);
        info!(
            "Running {} matches over {} workers ({} competitors)",
            matches, worker_count, population
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let orchestrator = self.orchestrator.clone();
            let budget = budget.clone();
            let stop = self.stop.sender.subscribe();
            workers.spawn(run_worker(worker_id, orchestrator, budget, stop));
        }

        let mut summary = SimulationSummary::default();
        let mut fatal = None;
        while let Some(joined) = workers.join_next().await {
            let (tally, worker_error) = joined.map_err(|e| EloSimError::Internal {
                message: format!("Simulation worker panicked: {}", e),
            })?;

            summary.attempted += tally.attempted;
            summary.recorded += tally.recorded;
            for (kind, count) in tally.failures {
                summary.failed += count;
                *summary.failures.entry(kind).or_insert(0) += count;
            }
            if fatal.is_none() {
                fatal = worker_error;
            }
        }
        summary.elapsed = start.elapsed();

        if let Some(e) = fatal {
            error!("Simulation aborted: {}", e);
            return Err(e);
        }

        info!(
            "Simulation drained: {} recorded, {} failed in {:.2?}",
            summary.recorded, summary.failed, summary.elapsed
        );
        Ok(summary)
    }
}

/// Claim one match from the shared budget
fn claim(budget: &AtomicU64) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

async fn run_worker(
    worker_id: usize,
    orchestrator: Arc<MatchOrchestrator>,
    budget: Arc<AtomicU64>,
    stop: watch::Receiver<bool>,
) -> (WorkerTally, Option<EloSimError>) {
    let mut tally = WorkerTally::default();

    loop {
        let stopped = *stop.borrow();
        if stopped || !claim(&budget) {
            break;
        }

        tally.attempted += 1;
        match orchestrator.simulate_next().await {
            Ok(_) => tally.recorded += 1,
            Err(e) => {
                *tally.failures.entry(e.kind().to_string()).or_insert(0) += 1;
                if !e.is_recoverable() {
                    return (tally, Some(e));
                }
            }
        }
    }

    debug!(
        "Worker {} finished after {} matches",
        worker_id, tally.attempted
    );
    (tally, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::metrics::MetricsCollector;
    use crate::rating::{EloRatingCalculator, RatingCalculator};
    use crate::simulation::history::MatchHistory;
    use crate::simulation::pairing::RandomPairing;
    use crate::store::{InMemoryRecordStore, RatingStore};
    use crate::utils::shared_rng;

    async fn create_orchestrator(competitors: usize) -> Arc<MatchOrchestrator> {
        let calculator: Arc<dyn RatingCalculator> =
            Arc::new(EloRatingCalculator::new(RatingConfig::default()).unwrap());
        let backend = Arc::new(InMemoryRecordStore::new());
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let (store, _handle) =
            RatingStore::spawn(calculator.clone(), backend.clone(), metrics.clone(), 256);

        let orchestrator = Arc::new(MatchOrchestrator::new(
            store,
            calculator,
            Arc::new(MatchHistory::new(backend)),
            Arc::new(RandomPairing),
            shared_rng(Some(7)),
            metrics,
            16,
        ));
        for _ in 0..competitors {
            orchestrator.register_competitor().await.unwrap();
        }
        orchestrator
    }

    #[test]
    fn test_claim_stops_at_zero() {
        let budget = AtomicU64::new(2);
        assert!(claim(&budget));
        assert!(claim(&budget));
        assert!(!claim(&budget));
        assert_eq!(budget.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_attempts_exact_budget() {
        let orchestrator = create_orchestrator(10).await;
        let runner = SimulationRunner::new(orchestrator.clone(), 8);

        let summary = runner.run(200).await.unwrap();

        assert_eq!(summary.attempted, 200);
        assert_eq!(summary.recorded, 200);
        assert_eq!(summary.failed, 0);
        assert_eq!(orchestrator.history().total_matches().await, 200);
    }

    #[tokio::test]
    async fn test_run_requires_two_competitors() {
        let orchestrator = create_orchestrator(1).await;
        let runner = SimulationRunner::new(orchestrator, 4);

        assert_eq!(
            runner.run(10).await,
            Err(EloSimError::InsufficientPopulation { population: 1 })
        );
    }

    #[tokio::test]
    async fn test_stopped_runner_claims_nothing() {
        let orchestrator = create_orchestrator(4).await;
        let runner = SimulationRunner::new(orchestrator.clone(), 4);
        runner.stop_handle().stop();
        assert!(runner.stop_handle().is_stopped());

        let summary = runner.run(50).await.unwrap();

        assert_eq!(summary.attempted, 0);
        assert_eq!(orchestrator.history().total_matches().await, 0);
    }

    #[tokio::test]
    async fn test_zero_matches() {
        let orchestrator = create_orchestrator(3).await;
        let summary = SimulationRunner::new(orchestrator, 4).run(0).await.unwrap();
        assert_eq!(summary.attempted, 0);
    }
}
