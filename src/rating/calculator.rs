//! Rating calculator trait
//!
//! This module defines the interface the rating store and match orchestrator
//! use to compute win chances and rating updates.

use crate::config::RatingConfig;

/// Trait for calculating rating changes after matches
///
/// Implementations must be pure: the same inputs always produce the same
/// output, so a calculator can be shared across any number of workers.
pub trait RatingCalculator: Send + Sync {
    /// Probability that a competitor rated `rating` beats one rated `opponent`
    fn win_chance(&self, rating: i32, opponent: i32) -> f64;

    /// New rating for a competitor after a single win or loss
    ///
    /// # Arguments
    /// * `rating` - Acting competitor's current rating
    /// * `opponent` - Opponent's current rating
    /// * `won` - Whether the acting competitor won
    fn compute_rating(&self, rating: i32, opponent: i32, won: bool) -> i32;

    /// New ratings for both sides of a match, computed from pre-match ratings
    fn battle_outcome(&self, rating_a: i32, rating_b: i32, a_won: bool) -> (i32, i32) {
        let new_a = self.compute_rating(rating_a, rating_b, a_won);
        let new_b = self.compute_rating(rating_b, rating_a, !a_won);
        (new_a, new_b)
    }

    /// Get the initial rating for new competitors
    fn initial_rating(&self) -> i32;

    /// Rating bounds and K-factor table in use
    fn rating_config(&self) -> &RatingConfig;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
