//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the rating store, the match
//! orchestrator and the final rating distribution.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Rating store metrics
    store_metrics: StoreMetrics,

    /// Match simulation metrics
    match_metrics: MatchMetrics,

    /// Rating distribution metrics
    rating_metrics: RatingMetrics,
}

/// Rating store metrics
#[derive(Clone)]
pub struct StoreMetrics {
    /// Requests processed by the store actor, by operation
    pub requests_total: IntCounterVec,

    /// Requests that failed, by error kind
    pub errors_total: IntCounterVec,

    /// Competitors created
    pub competitors_created_total: IntCounter,

    /// Time spent applying one match outcome inside the actor
    pub apply_outcome_duration: Histogram,
}

/// Match simulation metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches recorded to history
    pub matches_recorded_total: IntCounter,

    /// Matches that ended in the failed state, by reason
    pub matches_failed_total: IntCounterVec,

    /// Self-paired proposals rejected before resolution
    pub self_pairings_rejected_total: IntCounter,

    /// Match records that could not be written to the backend
    pub history_persist_failures_total: IntCounter,

    /// Matches currently being simulated
    pub matches_in_flight: IntGauge,

    /// Wall time of a whole match simulation
    pub match_duration: Histogram,
}

/// Rating distribution metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Final rating distribution across the population
    pub rating_distribution: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let store_metrics = StoreMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            store_metrics,
            match_metrics,
            rating_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get store metrics
    pub fn store(&self) -> &StoreMetrics {
        &self.store_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Record a request handled by the store actor
    pub fn record_store_request(&self, operation: &str) {
        self.store_metrics
            .requests_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record a store request that returned an error
    pub fn record_store_error(&self, kind: &str) {
        self.store_metrics
            .errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_competitor_created(&self) {
        self.store_metrics.competitors_created_total.inc();
    }

    /// Record time spent applying one outcome
    pub fn record_apply_outcome(&self, duration: Duration) {
        self.store_metrics
            .apply_outcome_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a match simulation starting
    pub fn record_match_started(&self) {
        self.match_metrics.matches_in_flight.inc();
    }

    /// Record a match reaching the recorded state
    pub fn record_match_recorded(&self, duration: Duration) {
        self.match_metrics.matches_in_flight.dec();
        self.match_metrics.matches_recorded_total.inc();
        self.match_metrics
            .match_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a match reaching the failed state
    pub fn record_match_failed(&self, reason: &str) {
        self.match_metrics.matches_in_flight.dec();
        self.match_metrics
            .matches_failed_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_self_pairing_rejected(&self) {
        self.match_metrics.self_pairings_rejected_total.inc();
    }

    pub fn record_history_persist_failure(&self) {
        self.match_metrics.history_persist_failures_total.inc();
    }

    /// Observe every rating of a drained population
    pub fn record_rating_distribution(&self, ratings: &[i32]) {
        for rating in ratings {
            self.rating_metrics
                .rating_distribution
                .observe(f64::from(*rating));
        }
    }

    /// Render all registered metrics in Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl StoreMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "elo_sim_store_requests_total",
                "Requests processed by the rating store",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("elo_sim_store_errors_total", "Rating store request errors"),
            &["kind"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let competitors_created_total = IntCounter::new(
            "elo_sim_competitors_created_total",
            "Total competitors created",
        )?;
        registry.register(Box::new(competitors_created_total.clone()))?;

        let apply_outcome_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elo_sim_apply_outcome_duration_seconds",
                "Time spent applying a match outcome",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(apply_outcome_duration.clone()))?;

        Ok(Self {
            requests_total,
            errors_total,
            competitors_created_total,
            apply_outcome_duration,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_recorded_total =
            IntCounter::new("elo_sim_matches_recorded_total", "Total matches recorded")?;
        registry.register(Box::new(matches_recorded_total.clone()))?;

        let matches_failed_total = IntCounterVec::new(
            Opts::new("elo_sim_matches_failed_total", "Total matches failed"),
            &["reason"],
        )?;
        registry.register(Box::new(matches_failed_total.clone()))?;

        let self_pairings_rejected_total = IntCounter::new(
            "elo_sim_self_pairings_rejected_total",
            "Self-paired proposals rejected",
        )?;
        registry.register(Box::new(self_pairings_rejected_total.clone()))?;

        let history_persist_failures_total = IntCounter::new(
            "elo_sim_history_persist_failures_total",
            "Match records not written to the backing store",
        )?;
        registry.register(Box::new(history_persist_failures_total.clone()))?;

        let matches_in_flight =
            IntGauge::new("elo_sim_matches_in_flight", "Matches currently simulating")?;
        registry.register(Box::new(matches_in_flight.clone()))?;

        let match_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elo_sim_match_duration_seconds",
                "Wall time of one match simulation",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(match_duration.clone()))?;

        Ok(Self {
            matches_recorded_total,
            matches_failed_total,
            self_pairings_rejected_total,
            history_persist_failures_total,
            matches_in_flight,
            match_duration,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "elo_sim_rating_distribution",
                "Distribution of competitor ratings",
            )
            .buckets(vec![
                600.0, 800.0, 1000.0, 1200.0, 1400.0, 1600.0, 1800.0, 2000.0, 2200.0, 2400.0,
            ]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        Ok(Self {
            rating_distribution,
        })
    }
}
