//! Metrics and monitoring for the elo-sim engine
//!
//! This module provides Prometheus metrics collection for the rating store
//! and the match simulation pipeline.

pub mod collector;

pub use collector::{MatchMetrics, MetricsCollector, MetricsTimer, RatingMetrics, StoreMetrics};
