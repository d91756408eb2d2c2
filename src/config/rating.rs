//! Rating system configuration

use crate::error::{EloSimError, Result};
use serde::{Deserialize, Serialize};

/// One band of the tiered K-factor table
///
/// A tier applies to every rating up to and including `max_rating`; the last
/// tier must be open ended (`max_rating = None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KFactorTier {
    pub max_rating: Option<i32>,
    pub k_factor: f64,
}

impl KFactorTier {
    pub fn up_to(max_rating: i32, k_factor: f64) -> Self {
        Self {
            max_rating: Some(max_rating),
            k_factor,
        }
    }

    pub fn open(k_factor: f64) -> Self {
        Self {
            max_rating: None,
            k_factor,
        }
    }

    fn covers(&self, rating: i32) -> bool {
        self.max_rating.map_or(true, |max| rating <= max)
    }
}

/// Elo rating configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to newly created competitors
    pub base_rating: i32,
    /// Inclusive rating floor
    pub min_rating: i32,
    /// Inclusive rating ceiling
    pub max_rating: i32,
    /// K-factor bands ordered by ascending `max_rating`
    pub k_factor_tiers: Vec<KFactorTier>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            base_rating: 1000,
            min_rating: 600,
            max_rating: 2400,
            k_factor_tiers: vec![
                KFactorTier::up_to(1199, 32.0),
                KFactorTier::up_to(2000, 24.0),
                KFactorTier::open(16.0),
            ],
        }
    }
}

impl RatingConfig {
    /// Single-tier configuration using the same K for every rating
    pub fn flat(k_factor: f64) -> Self {
        Self {
            k_factor_tiers: vec![KFactorTier::open(k_factor)],
            ..Self::default()
        }
    }

    /// K-factor for a competitor currently rated `rating`
    pub fn k_factor_for(&self, rating: i32) -> f64 {
        self.k_factor_tiers
            .iter()
            .find(|tier| tier.covers(rating))
            .or_else(|| self.k_factor_tiers.last())
            .map(|tier| tier.k_factor)
            .unwrap_or(0.0)
    }

    /// Clamp a rating into the configured inclusive range
    pub fn clamp(&self, rating: i32) -> i32 {
        rating.clamp(self.min_rating, self.max_rating)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.min_rating > self.max_rating {
            return Err(invalid(format!(
                "Rating floor {} is above rating ceiling {}",
                self.min_rating, self.max_rating
            )));
        }

        if self.base_rating < self.min_rating || self.base_rating > self.max_rating {
            return Err(invalid(format!(
                "Base rating {} is outside [{}, {}]",
                self.base_rating, self.min_rating, self.max_rating
            )));
        }

        if self.k_factor_tiers.is_empty() {
            return Err(invalid("K-factor table is empty".to_string()));
        }

        let last = self.k_factor_tiers.len() - 1;
        let mut previous: Option<i32> = None;
        for (index, tier) in self.k_factor_tiers.iter().enumerate() {
            if !tier.k_factor.is_finite() || tier.k_factor <= 0.0 {
                return Err(invalid(format!(
                    "K-factor tier {} has non-positive K {}",
                    index, tier.k_factor
                )));
            }

            match tier.max_rating {
                None if index != last => {
                    return Err(invalid(format!(
                        "Open-ended K-factor tier {} must be the last tier",
                        index
                    )));
                }
                None => {}
                Some(max) => {
                    if index == last {
                        return Err(invalid(
                            "Last K-factor tier must be open ended".to_string(),
                        ));
                    }
                    if let Some(prev) = previous {
                        if max <= prev {
                            return Err(invalid(format!(
                                "K-factor tier thresholds must increase: {} after {}",
                                max, prev
                            )));
                        }
                    }
                    previous = Some(max);
                }
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> EloSimError {
    EloSimError::InvalidConfig { message }
}
