//! Match orchestrator
//!
//! Drives one match at a time through `Pending -> Resolving -> Applied ->
//! Recorded`, or into `Failed`. Any number of workers may share one
//! orchestrator; the only state they contend on is the rating store queue,
//! the match history and the shared random source.

use crate::error::{EloSimError, Result};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::rating::RatingCalculator;
use crate::simulation::history::MatchHistory;
use crate::simulation::pairing::PairingStrategy;
use crate::store::{OutcomeApplied, RatingStore};
use crate::types::{CompetitorId, Match, MatchState, PendingMatch, Side};
use crate::utils::{current_timestamp, SharedRng};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Side A wins when the draw lands above B's chance of beating A,
/// which happens with probability `win_chance(a, b)`
pub fn side_a_wins(draw: f64, b_win_chance: f64) -> bool {
    draw > b_win_chance
}

fn poisoned(what: &str) -> EloSimError {
    EloSimError::Internal {
        message: format!("{} lock poisoned", what),
    }
}

/// Resolves pending matches against the rating store
pub struct MatchOrchestrator {
    store: RatingStore,
    calculator: Arc<dyn RatingCalculator>,
    history: Arc<MatchHistory>,
    pairing: Arc<dyn PairingStrategy>,
    rng: SharedRng,
    metrics: Arc<MetricsCollector>,
    roster: RwLock<Vec<CompetitorId>>,
    next_match_id: AtomicU64,
    max_pairing_attempts: u32,
}

impl MatchOrchestrator {
    pub fn new(
        store: RatingStore,
        calculator: Arc<dyn RatingCalculator>,
        history: Arc<MatchHistory>,
        pairing: Arc<dyn PairingStrategy>,
        rng: SharedRng,
        metrics: Arc<MetricsCollector>,
        max_pairing_attempts: u32,
    ) -> Self {
        info!(
            "Match orchestrator using {} pairing, {} attempts per draw",
            pairing.name(),
            max_pairing_attempts
        );

        Self {
            store,
            calculator,
            history,
            pairing,
            rng,
            metrics,
            roster: RwLock::new(Vec::new()),
            next_match_id: AtomicU64::new(1),
            max_pairing_attempts,
        }
    }

    /// Register a competitor at the base rating and add it to the roster
    pub async fn register_competitor(&self) -> Result<CompetitorId> {
        let id = self.store.create(self.calculator.initial_rating()).await?;
        self.roster.write().map_err(|_| poisoned("roster"))?.push(id);
        Ok(id)
    }

    /// Number of competitors available for pairing
    pub fn roster_size(&self) -> usize {
        self.roster.read().map(|roster| roster.len()).unwrap_or(0)
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    pub fn history(&self) -> &Arc<MatchHistory> {
        &self.history
    }

    /// Draw a pending match, re-drawing self-pairings
    pub fn next_pending(&self) -> Result<PendingMatch> {
        let roster = self.roster.read().map_err(|_| poisoned("roster"))?;
        let mut rng = self.rng.lock().map_err(|_| poisoned("random source"))?;

        let mut rejected = None;
        for attempt in 1..=self.max_pairing_attempts {
            let pending = self.pairing.next_match(&roster, &mut rng)?;
            if !pending.is_self_pairing() {
                return Ok(pending);
            }

            self.metrics.record_self_pairing_rejected();
            debug!(
                "Rejected self-pairing of competitor {} (attempt {}/{})",
                pending.side_a, attempt, self.max_pairing_attempts
            );
            rejected = Some(pending.side_a);
        }

        Err(EloSimError::SelfPairing {
            competitor_id: rejected.unwrap_or_default(),
        })
    }

    /// Draw a pending match and simulate it
    pub async fn simulate_next(&self) -> Result<Match> {
        let timer = self.begin();
        let result = match self.next_pending() {
            Ok(pending) => self.drive(pending).await,
            Err(e) => Err(e),
        };
        self.finish(&result, timer);
        result
    }

    /// Simulate a specific pending match
    pub async fn simulate_match(&self, pending: PendingMatch) -> Result<Match> {
        let timer = self.begin();
        let result = self.drive(pending).await;
        self.finish(&result, timer);
        result
    }

    fn begin(&self) -> MetricsTimer {
        self.metrics.record_match_started();
        self.metrics.start_timer()
    }

    fn finish(&self, result: &Result<Match>, timer: MetricsTimer) {
        match result {
            Ok(_) => self.metrics.record_match_recorded(timer.stop()),
            Err(e) => {
                self.metrics.record_match_failed(e.kind());
                debug!("Match -> {}: {}", MatchState::Failed, e);
            }
        }
    }

    async fn drive(&self, pending: PendingMatch) -> Result<Match> {
        let started_at = current_timestamp();

        if pending.is_self_pairing() {
            return Err(EloSimError::SelfPairing {
                competitor_id: pending.side_a,
            });
        }

        self.transition(&pending, MatchState::Pending, MatchState::Resolving);
        let applied = match self.resolve(&pending).await {
            Ok(a_won) => {
                self.transition(&pending, MatchState::Resolving, MatchState::Applied);
                self.store
                    .apply_outcome(pending.side_a, pending.side_b, a_won)
                    .await
                    .map(|outcome| (a_won, outcome))
            }
            Err(e) => Err(e),
        };

        self.release(&pending).await;
        let (a_won, outcome) = applied?;

        let recorded = self.build_match(&pending, a_won, outcome, started_at);
        if let Err(e) = self.history.record(&recorded).await {
            warn!("Match {} recorded but not persisted: {}", recorded.id, e);
            self.metrics.record_history_persist_failure();
        }

        self.transition(&pending, MatchState::Applied, MatchState::Recorded);
        Ok(recorded)
    }

    /// Flag both competitors, read their ratings and draw the winner
    async fn resolve(&self, pending: &PendingMatch) -> Result<bool> {
        self.store.set_in_match(pending.side_a, true).await?;
        self.store.set_in_match(pending.side_b, true).await?;

        let a = self.store.get(pending.side_a).await?;
        let b = self.store.get(pending.side_b).await?;

        let draw: f64 = self
            .rng
            .lock()
            .map_err(|_| poisoned("random source"))?
            .gen();

        Ok(side_a_wins(
            draw,
            self.calculator.win_chance(b.rating, a.rating),
        ))
    }

    async fn release(&self, pending: &PendingMatch) {
        for id in [pending.side_a, pending.side_b] {
            if let Err(e) = self.store.set_in_match(id, false).await {
                debug!("Could not clear in-match flag of competitor {}: {}", id, e);
            }
        }
    }

    fn build_match(
        &self,
        pending: &PendingMatch,
        a_won: bool,
        outcome: OutcomeApplied,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Match {
        Match {
            id: self.next_match_id.fetch_add(1, Ordering::SeqCst),
            side_a: pending.side_a,
            side_b: pending.side_b,
            winner: if a_won { Side::A } else { Side::B },
            ratings_before: outcome.before,
            ratings_after: outcome.after,
            started_at,
            ended_at: current_timestamp(),
        }
    }

    fn transition(&self, pending: &PendingMatch, from: MatchState, to: MatchState) {
        debug!(
            "Match {} v {}: {} -> {}",
            pending.side_a, pending.side_b, from, to
        );
    }
}
