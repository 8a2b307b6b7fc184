//! Indexed associative memory.
//!
//! Stores synthesized turns and their context, serves recall queries,
//! strengthens memories through consolidation and evicts the least valuable
//! ones when capacity is exceeded.
//!
//! All state lives behind one mutex: reads take the same lock as writes, so
//! no caller can observe a memory present in one index but absent from the
//! primary map.

pub mod consolidation;
mod store;
pub mod types;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::config::VaultConfig;
use store::VaultState;

pub use consolidation::spawn_consolidation_task;
pub use types::{MemoryItem, MemoryType, ScoredMemory, SearchQuery, StoreOutcome, VaultStats};

/// Thread-safe memory vault.
pub struct MemoryVault {
    state: Mutex<VaultState>,
}

impl MemoryVault {
    /// Create an empty vault.
    pub fn new(config: VaultConfig) -> Self {
        Self {
            state: Mutex::new(VaultState::new(config)),
        }
    }

    /// Store a memory and return its id.
    pub async fn store(&self, item: MemoryItem) -> Uuid {
        self.store_detailed(item).await.id
    }

    /// Store a memory, reporting consolidation and eviction side effects.
    pub async fn store_detailed(&self, item: MemoryItem) -> StoreOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.store(item, Utc::now());
        debug_check(&state);
        outcome
    }

    /// Fetch a memory by id, counting the access. `None` when absent.
    pub async fn retrieve(&self, id: Uuid) -> Option<MemoryItem> {
        self.state.lock().await.retrieve(id, Utc::now())
    }

    /// Ranked search.
    pub async fn search(&self, query: &SearchQuery) -> Vec<ScoredMemory> {
        self.state.lock().await.search(query, Utc::now())
    }

    /// Consolidate the next queued batch.
    pub async fn run_consolidation_batch(&self) -> usize {
        let mut state = self.state.lock().await;
        let processed = state.run_consolidation_batch(Utc::now());
        debug_check(&state);
        processed
    }

    /// Replace the contents with previously persisted memories.
    pub async fn restore(&self, items: Vec<MemoryItem>) -> usize {
        let mut state = self.state.lock().await;
        let count = state.restore(items);
        debug_check(&state);
        count
    }

    /// Copy of every memory, oldest first.
    pub async fn snapshot(&self) -> Vec<MemoryItem> {
        self.state.lock().await.snapshot()
    }

    /// Aggregate statistics.
    pub async fn stats(&self) -> VaultStats {
        self.state.lock().await.stats()
    }

    /// Number of stored memories.
    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Whether the vault is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Configured capacity.
    pub async fn capacity(&self) -> usize {
        self.state.lock().await.config().max_memories
    }

    /// Check index consistency. An `Err` is a bug in the vault.
    pub async fn verify_invariants(&self) -> Result<(), String> {
        self.state.lock().await.verify_invariants()
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new(VaultConfig::default())
    }
}

fn debug_check(state: &VaultState) {
    if cfg!(debug_assertions) {
        if let Err(violation) = state.verify_invariants() {
            warn!(violation = %violation, "Vault invariant violated");
            debug_assert!(false, "vault invariant violated: {violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_retrieve() {
        let vault = MemoryVault::default();
        let id = vault
            .store(MemoryItem::new("the sky was violet", MemoryType::Episodic))
            .await;

        let first = vault.retrieve(id).await.unwrap();
        assert_eq!(first.content, "the sky was violet");
        assert_eq!(first.access_count, 1);

        let second = vault.retrieve(id).await.unwrap();
        assert_eq!(second.access_count, 2);

        assert!(vault.retrieve(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_holds_under_store_sequence() {
        let vault = MemoryVault::new(VaultConfig {
            max_memories: 5,
            ..Default::default()
        });

        for n in 0..7 {
            let item = MemoryItem::new(format!("m{n}"), MemoryType::Semantic)
                .with_consolidation(0.1 * n as f64);
            vault.store(item).await;
            assert!(vault.len().await <= 5);
        }

        assert_eq!(vault.len().await, 5);
        vault.verify_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_restore_roundtrip() {
        let vault = MemoryVault::default();
        vault
            .store(MemoryItem::new("one", MemoryType::Semantic).with_associations(["a"]))
            .await;
        vault
            .store(MemoryItem::new("two", MemoryType::Semantic).with_associations(["a"]))
            .await;

        let other = MemoryVault::default();
        assert_eq!(other.restore(vault.snapshot().await).await, 2);

        let results = other.search(&SearchQuery::new("a")).await;
        assert_eq!(results.len(), 2);
        other.verify_invariants().await.unwrap();
    }
}
