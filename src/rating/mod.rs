//! Elo rating function
//!
//! This module provides the pure rating computation shared by the rating
//! store and the match orchestrator.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use elo::{battle_outcome, compute_rating, win_chance, EloRatingCalculator};
