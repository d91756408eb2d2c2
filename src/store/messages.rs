//! Request/response protocol of the rating store actor
//!
//! Every request carries a `oneshot` sender the actor answers on. A caller
//! that stops waiting simply drops its receiver; the actor still completes
//! the request.

use crate::error::Result;
use crate::types::{CompetitorId, CompetitorSnapshot, RatingPair};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Reply channel for a store request
pub type Reply<T> = oneshot::Sender<Result<T>>;

/// Ratings of both sides before and after one applied outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeApplied {
    pub before: RatingPair,
    pub after: RatingPair,
}

/// Messages processed by the rating store actor, in arrival order
#[derive(Debug)]
pub enum StoreRequest {
    Create {
        base_rating: i32,
        reply: Reply<CompetitorId>,
    },
    Get {
        id: CompetitorId,
        reply: Reply<CompetitorSnapshot>,
    },
    ApplyOutcome {
        side_a: CompetitorId,
        side_b: CompetitorId,
        a_won: bool,
        reply: Reply<OutcomeApplied>,
    },
    SetInMatch {
        id: CompetitorId,
        in_match: bool,
        reply: Reply<()>,
    },
    SnapshotAll {
        reply: Reply<Vec<CompetitorSnapshot>>,
    },
    Count {
        reply: Reply<usize>,
    },
    /// Stop after every request queued before this one has been handled
    Shutdown {
        reply: Reply<()>,
    },
}

impl StoreRequest {
    /// Operation label for logs and metrics
    pub fn operation(&self) -> &'static str {
        match self {
            StoreRequest::Create { .. } => "create",
            StoreRequest::Get { .. } => "get",
            StoreRequest::ApplyOutcome { .. } => "apply_outcome",
            StoreRequest::SetInMatch { .. } => "set_in_match",
            StoreRequest::SnapshotAll { .. } => "snapshot_all",
            StoreRequest::Count { .. } => "count",
            StoreRequest::Shutdown { .. } => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_labels() {
        let (reply, _rx) = oneshot::channel();
        let request = StoreRequest::ApplyOutcome {
            side_a: 1,
            side_b: 2,
            a_won: true,
            reply,
        };
        assert_eq!(request.operation(), "apply_outcome");

        let (reply, _rx) = oneshot::channel();
        assert_eq!(StoreRequest::Count { reply }.operation(), "count");
    }
}
