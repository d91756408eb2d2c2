//! Elo Sim - Concurrent Elo rating engine and match simulator
//!
//! This crate keeps a population of competitors in a single-owner rating
//! store, simulates randomized head-to-head matches on many concurrent
//! workers, and reports the resulting rating distribution.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod report;
pub mod service;
pub mod simulation;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{EloSimError, Result};
pub use types::*;

// Re-export key components
pub use report::EloSimReport;
pub use service::EloSim;
pub use store::{RatingStore, RecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
