//! Test fixtures and helper strategies for integration testing

#![allow(dead_code)]

use elo_sim::config::{AppConfig, RatingConfig};
use elo_sim::error::Result;
use elo_sim::service::EloSim;
use elo_sim::simulation::{PairingStrategy, RandomPairing};
use elo_sim::store::SharedRecordStore;
use elo_sim::types::{CompetitorId, CompetitorSnapshot, PendingMatch};
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default configuration with a fixed seed
pub fn test_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.seed = Some(seed);
    config.simulation.workers = 16;
    config
}

/// Configuration with a single flat K-factor
pub fn flat_config(seed: u64, k_factor: f64) -> AppConfig {
    let mut config = test_config(seed);
    config.rating = RatingConfig::flat(k_factor);
    config
}

/// Build a simulation over the given backend and register `competitors`
pub async fn create_test_sim(
    config: AppConfig,
    backend: SharedRecordStore,
    competitors: usize,
) -> EloSim {
    let sim = EloSim::builder(config).backend(backend).build().unwrap();
    sim.add_competitors(competitors).await.unwrap();
    sim
}

/// Pairing strategy that proposes a self-pairing on every other call
#[derive(Debug, Default)]
pub struct AlternatingSelfPairing {
    calls: AtomicU64,
}

impl AlternatingSelfPairing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PairingStrategy for AlternatingSelfPairing {
    fn next_match(&self, roster: &[CompetitorId], rng: &mut StdRng) -> Result<PendingMatch> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 && !roster.is_empty() {
            let id = roster[(call as usize / 2) % roster.len()];
            return Ok(PendingMatch::new(id, id));
        }
        RandomPairing.next_match(roster, rng)
    }

    fn name(&self) -> &str {
        "alternating-self"
    }
}

/// Shared pairing handle for the builder
pub fn alternating_pairing() -> (Arc<AlternatingSelfPairing>, Arc<dyn PairingStrategy>) {
    let strategy = Arc::new(AlternatingSelfPairing::new());
    (strategy.clone(), strategy)
}

/// Total games credited across a population
pub fn total_games(competitors: &[CompetitorSnapshot]) -> u64 {
    competitors.iter().map(|c| c.games_played()).sum()
}
