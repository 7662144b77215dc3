//! Single-use commitment store.
//!
//! The store maps opaque commitment ids to the metadata they were issued for.
//! A commitment is removed the moment it is taken, so at most one redemption
//! ever observes it. The lock is held only for the table operation itself.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::timestamp::UnixTimestamp;

/// A metadata commitment awaiting redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    /// The exact metadata string shown to the payer.
    pub metadata: String,
    /// When the commitment was issued.
    pub created_at: UnixTimestamp,
}

impl Commitment {
    /// Creates a commitment issued now.
    #[must_use]
    pub fn new(metadata: impl Into<String>) -> Self {
        Self {
            metadata: metadata.into(),
            created_at: UnixTimestamp::now(),
        }
    }
}

/// In-memory registry of outstanding commitments.
#[derive(Debug, Default)]
pub struct CommitmentStore {
    entries: Mutex<HashMap<String, Commitment>>,
}

impl CommitmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a commitment, replacing any existing one with the same id.
    pub async fn put(&self, id: impl Into<String>, commitment: Commitment) {
        self.entries.lock().await.insert(id.into(), commitment);
    }

    /// Removes and returns the commitment for `id`.
    ///
    /// Concurrent callers racing on the same id see it at most once.
    pub async fn take(&self, id: &str) -> Option<Commitment> {
        self.entries.lock().await.remove(id)
    }

    /// Evicts every commitment issued more than `ttl` before `now` and
    /// returns how many were removed.
    pub async fn sweep(&self, now: UnixTimestamp, ttl: Duration) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, commitment| now.duration_since(commitment.created_at) <= ttl);
        before - entries.len()
    }

    /// Number of outstanding commitments.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether no commitments are outstanding.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn commitment_at(secs: u64) -> Commitment {
        Commitment {
            metadata: r#"[["text/plain","abc123"]]"#.to_owned(),
            created_at: UnixTimestamp::from_secs(secs),
        }
    }

    #[tokio::test]
    async fn test_take_consumes() {
        let store = CommitmentStore::new();
        store.put("a1", commitment_at(0)).await;
        assert_eq!(store.take("a1").await, Some(commitment_at(0)));
        assert_eq!(store.take("a1").await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = CommitmentStore::new();
        store.put("a1", commitment_at(1)).await;
        store.put("a1", commitment_at(2)).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.take("a1").await, Some(commitment_at(2)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_exactly_once() {
        let store = Arc::new(CommitmentStore::new());
        store.put("shared", commitment_at(0)).await;

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.take("shared").await.is_some() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired() {
        let store = CommitmentStore::new();
        store.put("old", commitment_at(100)).await;
        store.put("edge", commitment_at(200)).await;
        store.put("fresh", commitment_at(290)).await;

        let evicted = store
            .sweep(UnixTimestamp::from_secs(300), Duration::from_secs(100))
            .await;

        assert_eq!(evicted, 1);
        assert!(store.take("old").await.is_none());
        assert!(store.take("edge").await.is_some());
        assert!(store.take("fresh").await.is_some());
    }
}
