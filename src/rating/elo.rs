//! Elo rating function with a tiered K-factor
//!
//! Win chance uses the continuous logistic expectation
//! `1 / (1 + 10^((b - a) / 400))` from the skillratings crate. The same
//! function decides simulated outcomes and supplies the expected-score term
//! of the update, so two equally rated competitors expect exactly 0.5.
//!
//! Deltas are rounded half away from zero (`f64::round`) and the result is
//! clamped into the configured range after the delta is applied.

use crate::config::RatingConfig;
use crate::error::Result;
use crate::rating::calculator::RatingCalculator;
use skillratings::elo::{expected_score, EloRating};

/// Probability that `rating` beats `opponent`
pub fn win_chance(rating: i32, opponent: i32) -> f64 {
    let (expected, _) = expected_score(
        &EloRating {
            rating: f64::from(rating),
        },
        &EloRating {
            rating: f64::from(opponent),
        },
    );
    expected
}

/// New rating for the acting competitor after one result
pub fn compute_rating(rating: i32, opponent: i32, won: bool, config: &RatingConfig) -> i32 {
    let actual = if won { 1.0 } else { 0.0 };
    let expected = win_chance(rating, opponent);
    let k = config.k_factor_for(rating);

    let delta = (k * (actual - expected)).round() as i64;
    let raw = i64::from(rating) + delta;
    raw.clamp(i64::from(config.min_rating), i64::from(config.max_rating)) as i32
}

/// New ratings for both sides, each computed from the pre-match ratings
pub fn battle_outcome(rating_a: i32, rating_b: i32, a_won: bool, config: &RatingConfig) -> (i32, i32) {
    (
        compute_rating(rating_a, rating_b, a_won, config),
        compute_rating(rating_b, rating_a, !a_won, config),
    )
}

/// Elo rating calculator implementation
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo calculator, rejecting malformed configuration
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn win_chance(&self, rating: i32, opponent: i32) -> f64 {
        win_chance(rating, opponent)
    }

    fn compute_rating(&self, rating: i32, opponent: i32, won: bool) -> i32 {
        compute_rating(rating, opponent, won, &self.config)
    }

    fn battle_outcome(&self, rating_a: i32, rating_b: i32, a_won: bool) -> (i32, i32) {
        battle_outcome(rating_a, rating_b, a_won, &self.config)
    }

    fn initial_rating(&self) -> i32 {
        self.config.base_rating
    }

    fn rating_config(&self) -> &RatingConfig {
        &self.config
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}
