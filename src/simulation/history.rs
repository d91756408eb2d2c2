//! Append-only match history with pairing uniqueness tracking
//!
//! Recorded matches are kept in memory behind a single async mutex and then
//! written through to the record store under `match:{id}`. A failed write
//! does not remove the in-memory record; the caller decides how to report it.

use crate::error::Result;
use crate::store::{decode_record, encode_record, SharedRecordStore};
use crate::types::{CompetitorId, Match, MatchId};
use crate::utils::match_key;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct HistoryState {
    matches: Vec<Match>,
    /// Times each unordered pair has met
    pairings: HashMap<(CompetitorId, CompetitorId), u64>,
}

/// Match history shared by every worker
pub struct MatchHistory {
    state: Mutex<HistoryState>,
    backend: SharedRecordStore,
}

impl MatchHistory {
    pub fn new(backend: SharedRecordStore) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            backend,
        }
    }

    /// Append a recorded match and persist it
    ///
    /// The match is counted before persistence is attempted, so an `Err`
    /// here only reports that the backing write failed.
    pub async fn record(&self, recorded: &Match) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            *state.pairings.entry(recorded.pairing_key()).or_insert(0) += 1;
            state.matches.push(recorded.clone());
        }

        let bytes = encode_record(recorded)?;
        self.backend.put(&match_key(recorded.id), bytes).await
    }

    /// Number of recorded matches
    pub async fn total_matches(&self) -> u64 {
        self.state.lock().await.matches.len() as u64
    }

    /// Number of distinct unordered pairings that have met at least once
    pub async fn unique_pairings(&self) -> u64 {
        self.state.lock().await.pairings.len() as u64
    }

    /// How many times two competitors have met, regardless of side
    pub async fn times_met(&self, a: CompetitorId, b: CompetitorId) -> u64 {
        let key = crate::utils::pairing_key(a, b);
        self.state
            .lock()
            .await
            .pairings
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// Copy of every recorded match in append order
    pub async fn matches(&self) -> Vec<Match> {
        self.state.lock().await.matches.clone()
    }

    /// Read a match back from the backing store
    pub async fn load_persisted(&self, id: MatchId) -> Result<Option<Match>> {
        match self.backend.get(&match_key(id)).await? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }
}
