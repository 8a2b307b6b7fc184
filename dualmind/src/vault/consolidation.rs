//! Consolidation scoring and the background sweep.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::vault::types::MemoryItem;
use crate::vault::MemoryVault;

/// Accesses at which frequency saturates.
const FREQUENCY_SATURATION: f64 = 10.0;

/// Access frequency in [0, 1].
pub fn access_frequency(access_count: u64) -> f64 {
    (access_count as f64 / FREQUENCY_SATURATION).min(1.0)
}

/// Linear recency decay: 1.0 at creation, 0.0 after `window_days`.
pub fn recency_score(created: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> f64 {
    if window_days <= 0 {
        return 0.0;
    }
    let age_secs = (now - created).num_seconds().max(0) as f64;
    let window_secs = (window_days * 86_400) as f64;
    (1.0 - age_secs / window_secs).clamp(0.0, 1.0)
}

/// Level after one consolidation pass. Never lower than the current level.
pub fn consolidated_level(item: &MemoryItem, now: DateTime<Utc>, window_days: i64) -> f64 {
    let gain = item.emotional_weight * 0.2
        + access_frequency(item.access_count) * 0.1
        + recency_score(item.timestamp, now, window_days) * 0.1;
    (item.consolidation_level + gain).min(1.0).max(item.consolidation_level)
}

/// Spawn the periodic consolidation sweep.
///
/// Each tick runs one batch through the vault's lock. Aborting the handle is
/// safe at any point.
pub fn spawn_consolidation_task(vault: Arc<MemoryVault>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;

        info!(interval_secs = interval.as_secs(), "Consolidation sweep started");

        loop {
            ticker.tick().await;
            let processed = vault.run_consolidation_batch().await;
            if processed > 0 {
                debug!(processed, "Consolidation sweep tick");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use crate::vault::types::MemoryType;

    #[test]
    fn test_access_frequency_saturates() {
        assert_eq!(access_frequency(0), 0.0);
        assert!((access_frequency(5) - 0.5).abs() < 1e-12);
        assert_eq!(access_frequency(50), 1.0);
    }

    #[test]
    fn test_recency_decays_linearly() {
        let now = Utc::now();
        assert!((recency_score(now, now, 30) - 1.0).abs() < 1e-12);
        assert!((recency_score(now - chrono::Duration::days(15), now, 30) - 0.5).abs() < 1e-9);
        assert_eq!(recency_score(now - chrono::Duration::days(45), now, 30), 0.0);
        assert_eq!(recency_score(now, now, 0), 0.0);
    }

    #[test]
    fn test_level_is_capped_and_monotone() {
        let now = Utc::now();
        let mut item = MemoryItem::new("x", MemoryType::Semantic)
            .with_emotion(1.0, "joy")
            .with_consolidation(0.95)
            .with_timestamp(now);
        item.access_count = 20;
        assert_eq!(consolidated_level(&item, now, 30), 1.0);

        let stale = MemoryItem::new("y", MemoryType::Semantic)
            .with_consolidation(0.4)
            .with_timestamp(now - chrono::Duration::days(90));
        assert_eq!(consolidated_level(&stale, now, 30), 0.4);
    }

    #[tokio::test]
    async fn test_sweep_consolidates_queue() {
        let vault = Arc::new(MemoryVault::new(VaultConfig::default()));
        let id = vault
            .store(MemoryItem::new("queued", MemoryType::Episodic).with_emotion(0.5, "calm"))
            .await;

        let handle = spawn_consolidation_task(vault.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = vault.stats().await;
        assert_eq!(stats.queued, 0);
        let item = vault.retrieve(id).await.unwrap();
        assert!(item.consolidation_level > 0.0);

        handle.abort();
    }
}
