//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for competitors, assigned by the rating store
pub type CompetitorId = u64;

/// Unique identifier for recorded matches
pub type MatchId = u64;

/// Which side of a match a competitor played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Point-in-time copy of a competitor's record
///
/// Snapshots are handed out by the rating store; holding one never gives
/// access to the store's own table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub id: CompetitorId,
    pub rating: i32,
    pub wins: u64,
    pub losses: u64,
    pub in_match: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl CompetitorSnapshot {
    /// Total matches this competitor has been credited with
    pub fn games_played(&self) -> u64 {
        self.wins + self.losses
    }
}

/// An unresolved proposal pairing two competitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingMatch {
    pub side_a: CompetitorId,
    pub side_b: CompetitorId,
}

impl PendingMatch {
    pub fn new(side_a: CompetitorId, side_b: CompetitorId) -> Self {
        Self { side_a, side_b }
    }

    pub fn is_self_pairing(&self) -> bool {
        self.side_a == self.side_b
    }
}

/// Lifecycle of a single simulated match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    Pending,
    Resolving,
    Applied,
    Recorded,
    Failed,
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchState::Pending => write!(f, "pending"),
            MatchState::Resolving => write!(f, "resolving"),
            MatchState::Applied => write!(f, "applied"),
            MatchState::Recorded => write!(f, "recorded"),
            MatchState::Failed => write!(f, "failed"),
        }
    }
}

/// Rating pair for both sides of a match, side A first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPair {
    pub side_a: i32,
    pub side_b: i32,
}

/// Record of a resolved match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub side_a: CompetitorId,
    pub side_b: CompetitorId,
    pub winner: Side,
    pub ratings_before: RatingPair,
    pub ratings_after: RatingPair,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl Match {
    pub fn winner_id(&self) -> CompetitorId {
        self.competitor_on(self.winner)
    }

    pub fn loser_id(&self) -> CompetitorId {
        self.competitor_on(self.winner.opposite())
    }

    pub fn competitor_on(&self, side: Side) -> CompetitorId {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    /// Unordered pairing key; (a, b) and (b, a) share a key
    pub fn pairing_key(&self) -> (CompetitorId, CompetitorId) {
        crate::utils::pairing_key(self.side_a, self.side_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(winner: Side) -> Match {
        let now = Utc::now();
        Match {
            id: 1,
            side_a: 10,
            side_b: 20,
            winner,
            ratings_before: RatingPair {
                side_a: 1000,
                side_b: 1000,
            },
            ratings_after: RatingPair {
                side_a: 1016,
                side_b: 984,
            },
            started_at: now,
            ended_at: now,
        }
    }

    #[test]
    fn test_winner_and_loser_ids() {
        let m = sample_match(Side::A);
        assert_eq!(m.winner_id(), 10);
        assert_eq!(m.loser_id(), 20);

        let m = sample_match(Side::B);
        assert_eq!(m.winner_id(), 20);
        assert_eq!(m.loser_id(), 10);
    }

    #[test]
    fn test_pairing_key_is_unordered() {
        let mut m = sample_match(Side::A);
        let key = m.pairing_key();
        std::mem::swap(&mut m.side_a, &mut m.side_b);
        assert_eq!(m.pairing_key(), key);
    }

    #[test]
    fn test_pending_match_self_pairing() {
        assert!(PendingMatch::new(3, 3).is_self_pairing());
        assert!(!PendingMatch::new(3, 4).is_self_pairing());
    }

    #[test]
    fn test_match_serde_round_trip() {
        let m = sample_match(Side::B);
        let bytes = serde_json::to_vec(&m).unwrap();
        let back: Match = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, m);
    }
}
