//! Rating store actor and its client handle
//!
//! The actor is the only owner of the competitor table. Every create, read
//! and mutation arrives through one FIFO queue and is handled to completion
//! before the next request is looked at, so two outcomes touching the same
//! competitor can never interleave.
//!
//! Mutations write through to the backing [`RecordStore`] before they are
//! committed to the in-memory table. A backend failure abandons the request
//! with `StoreUnavailable` and leaves the table untouched.

use crate::error::{EloSimError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::RatingCalculator;
use crate::store::backend::{encode_record, SharedRecordStore};
use crate::store::messages::{OutcomeApplied, Reply, StoreRequest};
use crate::types::{CompetitorId, CompetitorSnapshot, RatingPair};
use crate::utils::{competitor_key, current_timestamp};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cloneable client handle to the rating store actor
#[derive(Clone, Debug)]
pub struct RatingStore {
    sender: mpsc::Sender<StoreRequest>,
}

impl RatingStore {
    /// Spawn the actor on the current runtime and return a handle to it
    pub fn spawn(
        calculator: Arc<dyn RatingCalculator>,
        backend: SharedRecordStore,
        metrics: Arc<MetricsCollector>,
        queue_capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let actor = RatingStoreActor::new(calculator, backend, metrics, receiver);
        let handle = tokio::spawn(actor.run());
        (Self { sender }, handle)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> StoreRequest) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| EloSimError::StoreUnavailable {
                message: "rating store is not running".to_string(),
            })?;

        response.await.map_err(|_| EloSimError::StoreUnavailable {
            message: "rating store dropped the request".to_string(),
        })?
    }

    /// Register a new competitor and return its identifier
    pub async fn create(&self, base_rating: i32) -> Result<CompetitorId> {
        self.request(|reply| StoreRequest::Create { base_rating, reply })
            .await
    }

    /// Point-in-time copy of one competitor
    pub async fn get(&self, id: CompetitorId) -> Result<CompetitorSnapshot> {
        self.request(|reply| StoreRequest::Get { id, reply }).await
    }

    /// Apply one match result to both competitors atomically
    pub async fn apply_outcome(
        &self,
        side_a: CompetitorId,
        side_b: CompetitorId,
        a_won: bool,
    ) -> Result<OutcomeApplied> {
        self.request(|reply| StoreRequest::ApplyOutcome {
            side_a,
            side_b,
            a_won,
            reply,
        })
        .await
    }

    /// Set or clear the in-match bookkeeping flag
    pub async fn set_in_match(&self, id: CompetitorId, in_match: bool) -> Result<()> {
        self.request(|reply| StoreRequest::SetInMatch {
            id,
            in_match,
            reply,
        })
        .await
    }

    /// Copies of every competitor, ordered by identifier
    pub async fn snapshot_all(&self) -> Result<Vec<CompetitorSnapshot>> {
        self.request(|reply| StoreRequest::SnapshotAll { reply })
            .await
    }

    pub async fn count(&self) -> Result<usize> {
        self.request(|reply| StoreRequest::Count { reply }).await
    }

    /// Stop the actor once every previously queued request has completed
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| StoreRequest::Shutdown { reply }).await
    }
}

/// The single owner of competitor state
pub struct RatingStoreActor {
    /// Arena of competitors; identifier `n` lives at index `n - 1`
    competitors: Vec<CompetitorSnapshot>,
    calculator: Arc<dyn RatingCalculator>,
    backend: SharedRecordStore,
    metrics: Arc<MetricsCollector>,
    receiver: mpsc::Receiver<StoreRequest>,
}

impl RatingStoreActor {
    pub fn new(
        calculator: Arc<dyn RatingCalculator>,
        backend: SharedRecordStore,
        metrics: Arc<MetricsCollector>,
        receiver: mpsc::Receiver<StoreRequest>,
    ) -> Self {
        Self {
            competitors: Vec::new(),
            calculator,
            backend,
            metrics,
            receiver,
        }
    }

    /// Process requests until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!("Rating store actor started");

        while let Some(request) = self.receiver.recv().await {
            let operation = request.operation();
            self.metrics.record_store_request(operation);

            match request {
                StoreRequest::Create { base_rating, reply } => {
                    let result = self.create(base_rating).await;
                    self.respond(operation, reply, result);
                }
                StoreRequest::Get { id, reply } => {
                    let result = self.lookup(id).map(|index| self.competitors[index].clone());
                    self.respond(operation, reply, result);
                }
                StoreRequest::ApplyOutcome {
                    side_a,
                    side_b,
                    a_won,
                    reply,
                } => {
                    let result = self.apply_outcome(side_a, side_b, a_won).await;
                    self.respond(operation, reply, result);
                }
                StoreRequest::SetInMatch {
                    id,
                    in_match,
                    reply,
                } => {
                    let result = self.lookup(id).map(|index| {
                        self.competitors[index].in_match = in_match;
                    });
                    self.respond(operation, reply, result);
                }
                StoreRequest::SnapshotAll { reply } => {
                    let result = Ok(self.competitors.clone());
                    self.respond(operation, reply, result);
                }
                StoreRequest::Count { reply } => {
                    let result = Ok(self.competitors.len());
                    self.respond(operation, reply, result);
                }
                StoreRequest::Shutdown { reply } => {
                    self.respond(operation, reply, Ok(()));
                    break;
                }
            }
        }

        self.receiver.close();
        info!(
            "Rating store actor stopped with {} competitors",
            self.competitors.len()
        );
    }

    fn respond<T>(&self, operation: &str, reply: Reply<T>, result: Result<T>) {
        if let Err(e) = &result {
            self.metrics.record_store_error(e.kind());
            debug!("Store {} failed: {}", operation, e);
        }

        if reply.send(result).is_err() {
            debug!("Caller abandoned {} request before it completed", operation);
        }
    }

    fn lookup(&self, id: CompetitorId) -> Result<usize> {
        let index = id
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < self.competitors.len());

        index.ok_or(EloSimError::NotFound { competitor_id: id })
    }

    async fn persist(&self, record: &CompetitorSnapshot) -> Result<()> {
        let bytes = encode_record(record)?;
        self.backend.put(&competitor_key(record.id), bytes).await
    }

    async fn create(&mut self, base_rating: i32) -> Result<CompetitorId> {
        let id = self.competitors.len() as CompetitorId + 1;
        let now = current_timestamp();
        let record = CompetitorSnapshot {
            id,
            rating: self.calculator.rating_config().clamp(base_rating),
            wins: 0,
            losses: 0,
            in_match: false,
            created_at: now,
            last_updated: now,
        };

        self.persist(&record).await?;
        self.competitors.push(record);
        self.metrics.record_competitor_created();

        debug!("Created competitor {} at rating {}", id, base_rating);
        Ok(id)
    }

    async fn apply_outcome(
        &mut self,
        side_a: CompetitorId,
        side_b: CompetitorId,
        a_won: bool,
    ) -> Result<OutcomeApplied> {
        if side_a == side_b {
            return Err(EloSimError::SelfPairing {
                competitor_id: side_a,
            });
        }

        let index_a = self.lookup(side_a)?;
        let index_b = self.lookup(side_b)?;
        let timer = self.metrics.start_timer();

        let before = RatingPair {
            side_a: self.competitors[index_a].rating,
            side_b: self.competitors[index_b].rating,
        };
        let (new_a, new_b) = self
            .calculator
            .battle_outcome(before.side_a, before.side_b, a_won);

        let now = current_timestamp();
        let previous_a = self.competitors[index_a].clone();
        let mut updated_a = previous_a.clone();
        let mut updated_b = self.competitors[index_b].clone();

        updated_a.rating = new_a;
        updated_a.last_updated = now;
        updated_b.rating = new_b;
        updated_b.last_updated = now;
        if a_won {
            updated_a.wins += 1;
            updated_b.losses += 1;
        } else {
            updated_b.wins += 1;
            updated_a.losses += 1;
        }

        self.persist(&updated_a).await?;
        if let Err(e) = self.persist(&updated_b).await {
            if let Err(rollback) = self.persist(&previous_a).await {
                warn!(
                    "Failed to roll back competitor {} after write failure: {}",
                    side_a, rollback
                );
            }
            return Err(e);
        }

        self.competitors[index_a] = updated_a;
        self.competitors[index_b] = updated_b;
        self.metrics.record_apply_outcome(timer.stop());

        Ok(OutcomeApplied {
            before,
            after: RatingPair {
                side_a: new_a,
                side_b: new_b,
            },
        })
    }
}
