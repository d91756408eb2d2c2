//! Record storage interface and implementations
//!
//! This module defines the persistence collaborator the rating store and the
//! match history write through to, with an in-memory implementation and a
//! fault-injecting wrapper for exercising failure paths.

use crate::error::{EloSimError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Serialize a record for the backing store
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| EloSimError::Internal {
        message: format!("Failed to serialize record: {}", e),
    })
}

/// Deserialize a record read from the backing store
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| EloSimError::Internal {
        message: format!("Failed to deserialize record: {}", e),
    })
}

/// Trait for key-value record persistence
///
/// Records are opaque bytes; callers never issue concurrent writes for the
/// same key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store or replace the record under `key`
    async fn put(&self, key: &str, record: Vec<u8>) -> Result<()>;

    /// Fetch the record under `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Number of stored records
    async fn record_count(&self) -> Result<usize>;
}

/// In-memory record storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
    latency: Option<Duration>,
}

impl InMemoryRecordStore {
    /// Create a new in-memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that sleeps for `latency` before every operation
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latency: Some(latency),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put(&self, key: &str, record: Vec<u8>) -> Result<()> {
        self.simulate_latency().await;

        let mut records = self.records.write().map_err(|_| EloSimError::Internal {
            message: "Failed to acquire records write lock".to_string(),
        })?;

        records.insert(key.to_string(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.simulate_latency().await;

        let records = self.records.read().map_err(|_| EloSimError::Internal {
            message: "Failed to acquire records read lock".to_string(),
        })?;

        Ok(records.get(key).cloned())
    }

    async fn record_count(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| EloSimError::Internal {
            message: "Failed to acquire records read lock".to_string(),
        })?;

        Ok(records.len())
    }
}

/// Record store wrapper that can be switched off to simulate an outage
///
/// While unavailable every operation fails with `StoreUnavailable`. A write
/// budget can also be set so that the store goes down after a given number
/// of successful puts.
#[derive(Default)]
pub struct FaultInjectingRecordStore {
    inner: InMemoryRecordStore,
    unavailable: AtomicBool,
    puts_remaining: RwLock<Option<u64>>,
    failed_puts: AtomicU64,
}

impl FaultInjectingRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Allow `puts` more successful writes, then fail every write after
    pub fn fail_after_puts(&self, puts: u64) {
        if let Ok(mut remaining) = self.puts_remaining.write() {
            *remaining = Some(puts);
        }
    }

    /// Number of writes rejected so far
    pub fn failed_puts(&self) -> u64 {
        self.failed_puts.load(Ordering::SeqCst)
    }

    fn outage(&self) -> EloSimError {
        EloSimError::StoreUnavailable {
            message: "record store is offline".to_string(),
        }
    }

    fn admit_put(&self) -> bool {
        if self.unavailable.load(Ordering::SeqCst) {
            return false;
        }
        match self.puts_remaining.write() {
            Ok(mut remaining) => match remaining.as_mut() {
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
                None => true,
            },
            Err(_) => false,
        }
    }
}

#[async_trait]
impl RecordStore for FaultInjectingRecordStore {
    async fn put(&self, key: &str, record: Vec<u8>) -> Result<()> {
        if !self.admit_put() {
            self.failed_puts.fetch_add(1, Ordering::SeqCst);
            return Err(self.outage());
        }
        self.inner.put(key, record).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(self.outage());
        }
        self.inner.get(key).await
    }

    async fn record_count(&self) -> Result<usize> {
        self.inner.record_count().await
    }
}

/// Shared handle to a record store
pub type SharedRecordStore = Arc<dyn RecordStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompetitorSnapshot;
    use chrono::Utc;

    fn create_test_snapshot(id: u64, rating: i32) -> CompetitorSnapshot {
        let now = Utc::now();
        CompetitorSnapshot {
            id,
            rating,
            wins: 3,
            losses: 2,
            in_match: false,
            created_at: now,
            last_updated: now,
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_basic_operations() {
        let store = InMemoryRecordStore::new();

        assert!(store.get("competitor:1").await.unwrap().is_none());

        let snapshot = create_test_snapshot(1, 1000);
        store
            .put("competitor:1", encode_record(&snapshot).unwrap())
            .await
            .unwrap();

        let bytes = store.get("competitor:1").await.unwrap().unwrap();
        let decoded: CompetitorSnapshot = decode_record(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(store.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_record() {
        let store = InMemoryRecordStore::new();
        store.put("k", vec![1]).await.unwrap();
        store.put("k", vec![2]).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(vec![2]));
        assert_eq!(store.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_with_latency() {
        let store = InMemoryRecordStore::with_latency(Duration::from_millis(5));
        let start = std::time::Instant::now();
        store.put("k", vec![1]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_fault_injecting_store_outage() {
        let store = FaultInjectingRecordStore::new();
        store.put("a", vec![1]).await.unwrap();

        store.set_available(false);
        assert!(matches!(
            store.put("b", vec![2]).await,
            Err(EloSimError::StoreUnavailable { .. })
        ));
        assert!(store.get("a").await.is_err());

        store.set_available(true);
        assert_eq!(store.get("a").await.unwrap(), Some(vec![1]));
        assert_eq!(store.failed_puts(), 1);
    }

    #[tokio::test]
    async fn test_fault_injecting_store_put_budget() {
        let store = FaultInjectingRecordStore::new();
        store.fail_after_puts(2);

        assert!(store.put("a", vec![1]).await.is_ok());
        assert!(store.put("b", vec![2]).await.is_ok());
        assert!(store.put("c", vec![3]).await.is_err());
        assert_eq!(store.record_count().await.unwrap(), 2);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<CompetitorSnapshot> = decode_record(b"not json");
        assert!(matches!(result, Err(EloSimError::Internal { .. })));
    }
}
