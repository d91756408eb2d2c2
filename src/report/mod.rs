//! Final simulation report
//!
//! The aggregator reads the drained rating store and match history and
//! produces an [`EloSimReport`] that renders either as a text summary or as
//! JSON.

pub mod aggregator;

// Re-export commonly used types
pub use aggregator::{summarize_ratings, EloSimReport, RatingSummary, ReportAggregator};
