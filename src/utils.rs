//! Utility functions for the rating engine

use crate::types::CompetitorId;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Process-wide random source, seeded once and shared by every worker
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Build the shared random source from an optional fixed seed
pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Arc::new(Mutex::new(rng))
}

/// Generate a new unique simulation run ID
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Normalise a pair of competitors so that the smaller id comes first
pub fn pairing_key(a: CompetitorId, b: CompetitorId) -> (CompetitorId, CompetitorId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Persistence key for a competitor record
pub fn competitor_key(id: CompetitorId) -> String {
    format!("competitor:{}", id)
}

/// Persistence key for a match record
pub fn match_key(id: u64) -> String {
    format!("match:{}", id)
}
