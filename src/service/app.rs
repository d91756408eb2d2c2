//! Main simulation state and service coordination
//!
//! [`EloSim`] wires the rating store, match history, orchestrator, runner and
//! report aggregator together from one validated [`AppConfig`], and owns the
//! store actor's task until shutdown.

use crate::config::{validate_config, AppConfig};
use crate::error::{EloSimError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{EloRatingCalculator, RatingCalculator};
use crate::report::{EloSimReport, ReportAggregator};
use crate::simulation::{
    MatchHistory, MatchOrchestrator, PairingStrategy, RandomPairing, SimulationRunner,
    SimulationSummary, StopHandle,
};
use crate::store::{InMemoryRecordStore, RatingStore, SharedRecordStore};
use crate::types::CompetitorId;
use crate::utils::{current_timestamp, generate_run_id, shared_rng};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Builder for [`EloSim`] with pluggable collaborators
pub struct EloSimBuilder {
    config: AppConfig,
    backend: Option<SharedRecordStore>,
    pairing: Option<Arc<dyn PairingStrategy>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl EloSimBuilder {
    /// Use a specific record store instead of a fresh in-memory one
    pub fn backend(mut self, backend: SharedRecordStore) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a specific pairing strategy instead of [`RandomPairing`]
    pub fn pairing(mut self, pairing: Arc<dyn PairingStrategy>) -> Self {
        self.pairing = Some(pairing);
        self
    }

    pub fn metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the configuration and start the rating store
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<EloSim> {
        validate_config(&self.config)?;

        let calculator: Arc<dyn RatingCalculator> =
            Arc::new(EloRatingCalculator::new(self.config.rating.clone())?);
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(MetricsCollector::new().map_err(|e| EloSimError::Internal {
                message: format!("Failed to initialize metrics: {}", e),
            })?),
        };
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(InMemoryRecordStore::new()));
        let pairing = self.pairing.unwrap_or_else(|| Arc::new(RandomPairing));

        let settings = &self.config.simulation;
        let (store, store_task) = RatingStore::spawn(
            calculator.clone(),
            backend.clone(),
            metrics.clone(),
            settings.store_queue_capacity,
        );
        let history = Arc::new(MatchHistory::new(backend));
        let orchestrator = Arc::new(MatchOrchestrator::new(
            store.clone(),
            calculator,
            history.clone(),
            pairing,
            shared_rng(settings.seed),
            metrics.clone(),
            settings.max_pairing_attempts,
        ));
        let runner = SimulationRunner::new(orchestrator.clone(), settings.workers);
        let reports = ReportAggregator::new(store.clone(), history);

        let run_id = generate_run_id();
        info!(
            "Initialized simulation {} for service {}",
            run_id, self.config.service.name
        );

        Ok(EloSim {
            config: self.config,
            run_id,
            metrics,
            store,
            store_task: Some(store_task),
            orchestrator,
            runner,
            reports,
            started_at: current_timestamp(),
            ended_at: None,
            failed_matches: 0,
        })
    }
}

/// A complete rating simulation
pub struct EloSim {
    config: AppConfig,

    /// Fixed for the lifetime of the simulation
    run_id: Uuid,

    metrics: Arc<MetricsCollector>,

    /// Client handle to the rating store actor
    store: RatingStore,

    /// Rating store actor task, taken on shutdown
    store_task: Option<JoinHandle<()>>,

    orchestrator: Arc<MatchOrchestrator>,
    runner: SimulationRunner,
    reports: ReportAggregator,

    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    failed_matches: u64,
}

impl EloSim {
    pub fn builder(config: AppConfig) -> EloSimBuilder {
        EloSimBuilder {
            config,
            backend: None,
            pairing: None,
            metrics: None,
        }
    }

    /// Create a simulation with an in-memory store and random pairing
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Register one competitor at the base rating
    pub async fn add_competitor(&self) -> Result<CompetitorId> {
        self.orchestrator.register_competitor().await
    }

    /// Register `count` competitors in order
    pub async fn add_competitors(&self, count: usize) -> Result<Vec<CompetitorId>> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.add_competitor().await?);
        }
        Ok(ids)
    }

    /// Simulate `matches` matches and wait for all of them to drain
    pub async fn run(&mut self, matches: u64) -> Result<SimulationSummary> {
        let result = self.runner.run(matches).await;
        self.ended_at = Some(current_timestamp());

        if let Ok(summary) = &result {
            self.failed_matches += summary.failed;
        }
        result
    }

    /// Register the configured population and run the configured match count
    pub async fn run_configured(&mut self) -> Result<SimulationSummary> {
        let missing = self
            .config
            .simulation
            .competitors
            .saturating_sub(self.orchestrator.roster_size());
        self.add_competitors(missing).await?;

        let matches = self.config.simulation.matches as u64;
        self.run(matches).await
    }

    /// Handle for stopping a run from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.runner.stop_handle()
    }

    /// Report over everything simulated so far
    pub async fn final_report(&self) -> Result<EloSimReport> {
        let ended_at = self.ended_at.unwrap_or(self.started_at);
        self.reports
            .generate(self.run_id, self.started_at, ended_at, self.failed_matches)
            .await
    }

    /// Record the final rating distribution and stop the rating store
    ///
    /// Requests queued before the call still complete. Waits at most the
    /// configured shutdown timeout for the actor to exit.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down simulation {}", self.run_id);
        self.runner.stop_handle().stop();

        let Some(store_task) = self.store_task.take() else {
            return Ok(());
        };

        match self.store.snapshot_all().await {
            Ok(competitors) => {
                let ratings: Vec<i32> = competitors.iter().map(|c| c.rating).collect();
                self.metrics.record_rating_distribution(&ratings);
            }
            Err(e) => warn!("Could not snapshot ratings before shutdown: {}", e),
        }

        self.store.shutdown().await?;

        let timeout = self.config.shutdown_timeout();
        match tokio::time::timeout(timeout, store_task).await {
            Ok(Ok(())) => {
                info!("Rating store stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(EloSimError::Internal {
                message: format!("Rating store task failed: {}", e),
            }),
            Err(_) => {
                warn!("Rating store did not stop within {:?}", timeout);
                Err(EloSimError::Internal {
                    message: "Timed out waiting for the rating store to stop".to_string(),
                })
            }
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    pub fn history(&self) -> Arc<MatchHistory> {
        self.orchestrator.history().clone()
    }

    pub fn orchestrator(&self) -> Arc<MatchOrchestrator> {
        self.orchestrator.clone()
    }
}
