//! Pairing strategies for proposing pending matches
//!
//! A strategy only proposes pairs of identifiers. Rejecting a self-pairing
//! and re-drawing is the orchestrator's job, so naive strategies are allowed
//! to return the same competitor on both sides.

use crate::error::{EloSimError, Result};
use crate::types::{CompetitorId, PendingMatch};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;

/// Trait for pairing algorithms
pub trait PairingStrategy: Send + Sync {
    /// Propose the next pending match from the registered roster
    ///
    /// # Arguments
    /// * `roster` - Identifiers of every registered competitor
    /// * `rng` - The process-wide random source
    fn next_match(&self, roster: &[CompetitorId], rng: &mut StdRng) -> Result<PendingMatch>;

    /// Strategy name for logs
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> PairingStrategy for F
where
    F: Fn(&[CompetitorId], &mut StdRng) -> Result<PendingMatch> + Send + Sync,
{
    fn next_match(&self, roster: &[CompetitorId], rng: &mut StdRng) -> Result<PendingMatch> {
        self(roster, rng)
    }
}

fn require_population(roster: &[CompetitorId]) -> Result<()> {
    if roster.len() < 2 {
        return Err(EloSimError::InsufficientPopulation {
            population: roster.len(),
        });
    }
    Ok(())
}

/// Uniform selection of two distinct competitors
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPairing;

impl PairingStrategy for RandomPairing {
    fn next_match(&self, roster: &[CompetitorId], rng: &mut StdRng) -> Result<PendingMatch> {
        require_population(roster)?;

        let picks = index::sample(rng, roster.len(), 2);
        Ok(PendingMatch::new(roster[picks.index(0)], roster[picks.index(1)]))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Two independent uniform draws; both sides may be the same competitor
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentPairing;

impl PairingStrategy for IndependentPairing {
    fn next_match(&self, roster: &[CompetitorId], rng: &mut StdRng) -> Result<PendingMatch> {
        require_population(roster)?;

        let side_a = roster[rng.gen_range(0..roster.len())];
        let side_b = roster[rng.gen_range(0..roster.len())];
        Ok(PendingMatch::new(side_a, side_b))
    }

    fn name(&self) -> &str {
        "independent"
    }
}
