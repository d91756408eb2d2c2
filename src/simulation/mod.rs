//! Match simulation
//!
//! Pairing strategies propose matches, the orchestrator resolves them against
//! the rating store and records them in the match history, and the runner
//! spreads a match budget over concurrent workers.

pub mod history;
pub mod orchestrator;
pub mod pairing;
pub mod runner;

// Re-export commonly used types
pub use history::MatchHistory;
pub use orchestrator::{side_a_wins, MatchOrchestrator};
pub use pairing::{IndependentPairing, PairingStrategy, RandomPairing};
pub use runner::{SimulationRunner, SimulationSummary, StopHandle};
